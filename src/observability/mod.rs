//! Observability
//!
//! Logging, metrics, and the structured session event stream.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{Event, EventEmitter, FinishReason};
pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;

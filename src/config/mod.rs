//! Configuration
//!
//! Optional `onerep.yaml` with storage, profile, phase, coach and sync
//! settings.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{CONFIG_ENV, ConfigLimits, ConfigLoader, LoadResult};
pub use schema::*;
pub use validation::{ValidationResult, Validator};

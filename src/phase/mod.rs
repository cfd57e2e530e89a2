//! Phase timer
//!
//! Drives one exercise through the fixed phase sequence. The timer itself
//! is a plain state machine advanced by [`PhaseTimer::tick`]; the
//! [`Ticker`] is the background task that produces those ticks once per
//! second.
//!
//! # Architecture
//!
//! - [`PhaseTimer`]: countdown, status, threshold cues and transitions
//! - [`Ticker`]: cancellable tokio interval task feeding a channel

pub mod ticker;
pub mod timer;

pub use ticker::{Tick, Ticker};
pub use timer::{PhaseTimer, PhaseTransition, TickOutcome, TimerStatus, TransitionReason};

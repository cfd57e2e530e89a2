//! `onerep` - phase-based high-intensity strength training.
//!
//! Each set is driven through a fixed sequence of timed phases (prep,
//! positioning, eccentric, concentric, final eccentric, rest) with audio
//! coaching, and every completed set is logged with personal-record
//! detection, streaks and CSV export.

pub mod cli;
pub mod coach;
pub mod config;
pub mod error;
pub mod model;
pub mod observability;
pub mod phase;
pub mod store;
pub mod sync;
pub mod workout;

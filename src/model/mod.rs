//! Core data model
//!
//! Phases and their durations, exercises and workouts, and the immutable
//! log entry written for every completed set.

pub mod exercise;
pub mod log;
pub mod phase;

pub use exercise::{Exercise, Profile, Workout};
pub use log::{NewLogEntry, WorkoutLogEntry};
pub use phase::{PhaseSettings, TimerPhase};

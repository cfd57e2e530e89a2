//! Workout flow
//!
//! [`WorkoutSession`] runs exercises one after another through the phase
//! timer; [`schedule`] plans when the next workout should happen.

pub mod schedule;
pub mod session;

pub use schedule::{ExperienceLevel, NextWorkout, next_workout};
pub use session::{SessionSnapshot, SessionStep, SetDetails, WorkoutSession};

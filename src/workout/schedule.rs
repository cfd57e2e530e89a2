//! Next-workout planning.
//!
//! Workouts alternate between routine `A` and `B`, spaced evenly through
//! the week according to experience.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Training experience; sets the weekly frequency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    #[must_use]
    pub const fn workouts_per_week(self) -> u64 {
        match self {
            Self::Beginner | Self::Intermediate => 2,
            Self::Advanced => 3,
        }
    }

    /// Whole days between workouts.
    #[must_use]
    pub const fn spacing_days(self) -> u64 {
        7 / self.workouts_per_week()
    }
}

/// When to train next and which routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextWorkout {
    pub date: NaiveDate,
    pub workout_type: String,
    /// Days from `today` until `date`.
    pub days_until: u64,
}

/// Plans the next workout.
///
/// With no history, or once the rest period has passed, the answer is
/// today. Training today pushes the next session a full spacing ahead.
#[must_use]
pub fn next_workout(
    level: ExperienceLevel,
    last_date: Option<NaiveDate>,
    last_type: Option<&str>,
    today: NaiveDate,
) -> NextWorkout {
    let spacing = level.spacing_days();
    let days_until = match last_date {
        None => 0,
        Some(last) if last == today => spacing,
        Some(last) => {
            let since = u64::try_from((today - last).num_days()).unwrap_or(0);
            spacing.saturating_sub(since)
        }
    };
    let date = today.checked_add_days(Days::new(days_until)).unwrap_or(today);

    let workout_type = match last_type {
        Some("A") => "B",
        _ => "A",
    };

    NextWorkout {
        date,
        workout_type: workout_type.to_string(),
        days_until,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn first_workout_is_today_routine_a() {
        let next = next_workout(ExperienceLevel::Beginner, None, None, day(10));
        assert_eq!(next.date, day(10));
        assert_eq!(next.workout_type, "A");
        assert_eq!(next.days_until, 0);
    }

    #[test]
    fn trained_today_waits_full_spacing() {
        let next = next_workout(ExperienceLevel::Beginner, Some(day(10)), Some("A"), day(10));
        assert_eq!(next.date, day(13));
        assert_eq!(next.workout_type, "B");
    }

    #[test]
    fn advanced_trains_every_other_day() {
        assert_eq!(ExperienceLevel::Advanced.spacing_days(), 2);
        let next = next_workout(ExperienceLevel::Advanced, Some(day(9)), Some("B"), day(10));
        assert_eq!(next.date, day(11));
        assert_eq!(next.workout_type, "A");
    }

    #[test]
    fn rest_over_means_today() {
        let next = next_workout(ExperienceLevel::Intermediate, Some(day(1)), Some("B"), day(10));
        assert_eq!(next.date, day(10));
        assert_eq!(next.days_until, 0);
    }

    #[test]
    fn unknown_type_restarts_at_a() {
        let next = next_workout(ExperienceLevel::Beginner, None, Some("workout"), day(10));
        assert_eq!(next.workout_type, "A");
    }
}

//! Completed-set log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Profile;

/// Immutable record of one completed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLogEntry {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub exercise_name: String,
    /// Free-form routine tag ("workout", "A", "B").
    pub workout_type: String,
    pub weight: f64,
    pub reached_failure: bool,
    pub profile: Profile,
    /// Rate of perceived exertion, 1-10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpe: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Set duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
}

impl WorkoutLogEntry {
    /// Estimated one-rep max (Brzycki).
    ///
    /// Defined for 1 to 12 reps and a positive weight only.
    #[must_use]
    pub fn estimated_1rm(&self) -> Option<f64> {
        let reps = self.reps?;
        if !(1..=12).contains(&reps) || self.weight <= 0.0 {
            return None;
        }
        if reps == 1 {
            return Some(self.weight);
        }
        Some(self.weight * (36.0 / (37.0 - f64::from(reps))))
    }
}

/// Values supplied when logging a set; id, timestamp and profile are
/// filled in by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLogEntry {
    pub exercise_name: String,
    pub workout_type: String,
    pub weight: f64,
    pub reached_failure: bool,
    pub rpe: Option<u8>,
    pub notes: Option<String>,
    pub duration: Option<u32>,
    pub reps: Option<u32>,
}

impl NewLogEntry {
    /// A plain weight/failure set for `exercise_name`.
    #[must_use]
    pub fn new(exercise_name: impl Into<String>, weight: f64, reached_failure: bool) -> Self {
        Self {
            exercise_name: exercise_name.into(),
            workout_type: "workout".to_string(),
            weight,
            reached_failure,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(weight: f64, reps: Option<u32>) -> WorkoutLogEntry {
        WorkoutLogEntry {
            id: Uuid::new_v4(),
            date: Utc::now(),
            exercise_name: "Chest Press".to_string(),
            workout_type: "workout".to_string(),
            weight,
            reached_failure: true,
            profile: Profile::PRIMARY,
            rpe: None,
            notes: None,
            duration: None,
            reps,
        }
    }

    #[test]
    fn one_rep_is_the_weight() {
        assert_eq!(entry(150.0, Some(1)).estimated_1rm(), Some(150.0));
    }

    #[test]
    fn brzycki_for_ten_reps() {
        let estimate = entry(100.0, Some(10)).estimated_1rm().unwrap();
        assert!((estimate - 133.333).abs() < 0.01, "got {estimate}");
    }

    #[test]
    fn no_estimate_outside_range() {
        assert_eq!(entry(100.0, None).estimated_1rm(), None);
        assert_eq!(entry(100.0, Some(0)).estimated_1rm(), None);
        assert_eq!(entry(100.0, Some(13)).estimated_1rm(), None);
        assert_eq!(entry(0.0, Some(5)).estimated_1rm(), None);
    }

    #[test]
    fn optional_fields_are_omitted() {
        let json = serde_json::to_value(entry(100.0, None)).unwrap();
        assert!(json.get("rpe").is_none());
        assert!(json.get("reps").is_none());
        assert_eq!(json["exerciseName"], "Chest Press");
        assert_eq!(json["profile"], 1);
    }
}

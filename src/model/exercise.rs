//! Exercises, workouts and profiles.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RegistryError;

/// A user profile slot.
///
/// Two people can share one installation; every persisted value is keyed
/// by profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(u8);

impl Profile {
    /// The first (default) profile.
    pub const PRIMARY: Self = Self(1);

    /// Highest supported profile number.
    pub const MAX: u8 = 2;

    /// Validates a profile number.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidProfile`] outside `1..=2`.
    pub fn new(number: u8) -> Result<Self, RegistryError> {
        if (1..=Self::MAX).contains(&number) {
            Ok(Self(number))
        } else {
            Err(RegistryError::InvalidProfile(number))
        }
    }

    /// The raw profile number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::PRIMARY
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One exercise in a workout, with its last recorded result.
///
/// Field names are camelCase on the wire so the stored workout stays
/// readable by the companion apps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub icon_name: String,
    pub audio_file_name: String,
    #[serde(default)]
    pub last_weight: Option<f64>,
    /// Hold time in seconds, used instead of weight for bodyweight work.
    #[serde(default)]
    pub last_duration: Option<u32>,
    #[serde(default)]
    pub is_bodyweight: bool,
    /// Lowering only: the set ends after the eccentric, which lasts
    /// `last_duration` seconds when one is recorded.
    #[serde(default)]
    pub is_negative_only: bool,
    #[serde(default)]
    pub reached_failure: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_logged: bool,
}

impl Exercise {
    /// Creates an exercise with a fresh id and no recorded result.
    #[must_use]
    pub fn new(name: impl Into<String>, icon_name: &str, audio_file_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            icon_name: icon_name.to_string(),
            audio_file_name: audio_file_name.to_string(),
            last_weight: None,
            last_duration: None,
            is_bodyweight: false,
            is_negative_only: false,
            reached_failure: false,
            is_completed: false,
            is_logged: false,
        }
    }

    /// Creates a user-defined exercise.
    #[must_use]
    pub fn custom(name: impl Into<String>, is_bodyweight: bool) -> Self {
        let icon = if is_bodyweight { "pull_up.png" } else { "dumbbell.png" };
        Self {
            is_bodyweight,
            ..Self::new(name, icon, "exercise_custom")
        }
    }

    /// Clears completion and logged flags, keeping recorded results.
    pub const fn reset_progress(&mut self) {
        self.is_completed = false;
        self.is_logged = false;
    }
}

/// An ordered list of exercises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: Uuid,
    pub name: String,
    pub exercises: Vec<Exercise>,
}

impl Workout {
    /// Name of the built-in routine.
    pub const DEFAULT_NAME: &'static str = "Full Body HIT";

    /// The built-in eight-exercise full body routine.
    #[must_use]
    pub fn default_workout() -> Self {
        const DEFAULTS: [(&str, &str, &str); 8] = [
            ("Leg Press", "bicep_curl.png", "ex_leg_press"),
            ("Pulldown", "pull_up.png", "ex_pulldown"),
            ("Chest Press", "bench_press.png", "ex_chest_press"),
            ("Overhead Press", "overhead_press.png", "ex_overhead_press"),
            ("Seated Row", "barbell_row.png", "ex_seated_row"),
            ("Leg Curl", "lunge.png", "ex_leg_curl"),
            ("Bicep Curl", "tricep_extension.png", "ex_bicep_curl"),
            ("Tricep Extension", "lateral_raise.png", "ex_tricep_extension"),
        ];

        Self {
            id: Uuid::new_v4(),
            name: Self::DEFAULT_NAME.to_string(),
            exercises: DEFAULTS
                .iter()
                .map(|(name, icon, audio)| Exercise::new(*name, icon, audio))
                .collect(),
        }
    }

    /// Index of the exercise with `id`.
    #[must_use]
    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.exercises.iter().position(|e| e.id == id)
    }

    /// Number of exercises marked completed.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.exercises.iter().filter(|e| e.is_completed).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_range() {
        assert!(Profile::new(0).is_err());
        assert_eq!(Profile::new(1).unwrap(), Profile::PRIMARY);
        assert_eq!(Profile::new(2).unwrap().number(), 2);
        assert!(matches!(
            Profile::new(3),
            Err(RegistryError::InvalidProfile(3))
        ));
    }

    #[test]
    fn default_workout_has_eight_unique_exercises() {
        let workout = Workout::default_workout();
        assert_eq!(workout.name, "Full Body HIT");
        assert_eq!(workout.exercises.len(), 8);
        assert_eq!(workout.exercises[0].name, "Leg Press");
        assert_eq!(workout.exercises[7].name, "Tricep Extension");

        let mut ids: Vec<_> = workout.exercises.iter().map(|e| e.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn custom_exercise_icon_depends_on_bodyweight() {
        assert_eq!(Exercise::custom("Dips", true).icon_name, "pull_up.png");
        assert_eq!(Exercise::custom("Hack Squat", false).icon_name, "dumbbell.png");
        assert_eq!(Exercise::custom("Dips", true).audio_file_name, "exercise_custom");
    }

    #[test]
    fn exercise_decodes_with_missing_flags() {
        let json = r#"{
            "id": "6f1c3a5e-3c7b-4f5e-9a57-0a3b0c3d9e11",
            "name": "Leg Press",
            "iconName": "bicep_curl.png",
            "audioFileName": "ex_leg_press",
            "lastWeight": 180.0
        }"#;
        let exercise: Exercise = serde_json::from_str(json).unwrap();
        assert_eq!(exercise.last_weight, Some(180.0));
        assert!(!exercise.is_completed);
        assert!(!exercise.is_bodyweight);
    }

    #[test]
    fn completed_count_and_position() {
        let mut workout = Workout::default_workout();
        workout.exercises[2].is_completed = true;
        workout.exercises[5].is_completed = true;
        assert_eq!(workout.completed_count(), 2);

        let id = workout.exercises[3].id;
        assert_eq!(workout.position(id), Some(3));
        assert_eq!(workout.position(Uuid::new_v4()), None);
    }
}

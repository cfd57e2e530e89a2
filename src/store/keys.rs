//! Store key layout.
//!
//! Per-exercise keys embed the profile number and the exercise name, so
//! renaming an exercise moves its data to new keys.

use crate::model::Profile;

pub const PHASE_SETTINGS: &str = "phaseSettings";
pub const CURRENT_PROFILE: &str = "currentProfile";
pub const WIDGET_SUMMARY: &str = "widgetSummary";

#[must_use]
pub fn exercise_weight(profile: Profile, name: &str) -> String {
    format!("exerciseWeight_{profile}_{name}")
}

#[must_use]
pub fn exercise_duration(profile: Profile, name: &str) -> String {
    format!("exerciseDuration_{profile}_{name}")
}

#[must_use]
pub fn exercise_failure(profile: Profile, name: &str) -> String {
    format!("exerciseFailure_{profile}_{name}")
}

#[must_use]
pub fn exercise_negative(profile: Profile, name: &str) -> String {
    format!("exerciseNegative_{profile}_{name}")
}

#[must_use]
pub fn exercise_completed(profile: Profile, name: &str) -> String {
    format!("exerciseCompleted_{profile}_{name}")
}

#[must_use]
pub fn exercise_logged(profile: Profile, name: &str) -> String {
    format!("exerciseLogged_{profile}_{name}")
}

#[must_use]
pub fn custom_workout(profile: Profile) -> String {
    format!("customWorkout_{profile}")
}

#[must_use]
pub fn workout_templates(profile: Profile) -> String {
    format!("workoutTemplates_{profile}")
}

#[must_use]
pub fn last_workout_date(profile: Profile) -> String {
    format!("lastWorkoutDate_{profile}")
}

/// Every per-exercise key for `name`.
#[must_use]
pub fn all_exercise_keys(profile: Profile, name: &str) -> [String; 6] {
    [
        exercise_weight(profile, name),
        exercise_duration(profile, name),
        exercise_failure(profile, name),
        exercise_negative(profile, name),
        exercise_completed(profile, name),
        exercise_logged(profile, name),
    ]
}

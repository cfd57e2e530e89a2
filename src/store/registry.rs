//! Exercise registry.
//!
//! The workout layout (which exercises, in which order) is stored as one
//! JSON list per profile. Results and progress flags live in separate
//! per-exercise keys and are overlaid on load, so editing the layout never
//! touches recorded weights.

use tracing::{debug, info};
use uuid::Uuid;

use super::keys;
use super::kv::SharedStore;
use crate::error::RegistryError;
use crate::model::{Exercise, PhaseSettings, Profile, Workout};

/// Maximum edit distance for "did you mean" suggestions.
const SUGGESTION_DISTANCE: usize = 3;

/// Returns the closest name within [`SUGGESTION_DISTANCE`] edits.
#[must_use]
pub fn suggest_name<'a>(input: &str, names: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let input = input.to_lowercase();
    names
        .into_iter()
        .map(|name| (name, strsim::damerau_levenshtein(&input, &name.to_lowercase())))
        .filter(|(_, dist)| *dist <= SUGGESTION_DISTANCE)
        .min_by_key(|(_, dist)| *dist)
        .map(|(name, _)| name.to_string())
}

/// The active profile's workout with its persisted progress.
#[derive(Debug, Clone)]
pub struct ExerciseRegistry {
    store: SharedStore,
    profile: Profile,
    workout: Workout,
}

impl ExerciseRegistry {
    /// Loads the workout for `profile`, falling back to the built-in one.
    #[must_use]
    pub fn load(store: SharedStore, profile: Profile) -> Self {
        let workout = Self::load_workout(&store, profile);
        let mut registry = Self {
            store,
            profile,
            workout,
        };
        registry.overlay_progress();
        debug!(
            profile = %profile,
            exercises = registry.workout.exercises.len(),
            "loaded exercise registry"
        );
        registry
    }

    /// Loads the registry for the profile recorded as current.
    #[must_use]
    pub fn load_current(store: SharedStore) -> Self {
        let profile = Self::current_profile(&store);
        Self::load(store, profile)
    }

    /// Profile recorded under `currentProfile`, or the primary profile.
    #[must_use]
    pub fn current_profile(store: &SharedStore) -> Profile {
        store
            .get_u32(keys::CURRENT_PROFILE)
            .and_then(|n| u8::try_from(n).ok())
            .and_then(|n| Profile::new(n).ok())
            .unwrap_or_default()
    }

    fn load_workout(store: &SharedStore, profile: Profile) -> Workout {
        let mut workout = Workout::default_workout();
        if let Some(exercises) = store.get_as::<Vec<Exercise>>(&keys::custom_workout(profile)) {
            workout.exercises = exercises;
        }
        workout
    }

    fn overlay_progress(&mut self) {
        let profile = self.profile;
        for exercise in &mut self.workout.exercises {
            let name = exercise.name.as_str();
            exercise.last_weight = self.store.get_f64(&keys::exercise_weight(profile, name));
            exercise.last_duration = self.store.get_u32(&keys::exercise_duration(profile, name));
            exercise.reached_failure = self.store.get_bool(&keys::exercise_failure(profile, name));
            exercise.is_negative_only = self.store.get_bool(&keys::exercise_negative(profile, name));
            exercise.is_completed = self.store.get_bool(&keys::exercise_completed(profile, name));
            exercise.is_logged = self.store.get_bool(&keys::exercise_logged(profile, name));
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub const fn profile(&self) -> Profile {
        self.profile
    }

    #[must_use]
    pub const fn workout(&self) -> &Workout {
        &self.workout
    }

    #[must_use]
    pub fn exercises(&self) -> &[Exercise] {
        &self.workout.exercises
    }

    #[must_use]
    pub const fn store(&self) -> &SharedStore {
        &self.store
    }

    #[must_use]
    pub fn find(&self, id: Uuid) -> Option<&Exercise> {
        self.workout.exercises.iter().find(|e| e.id == id)
    }

    /// Case-insensitive lookup by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownExercise`] with the closest name as a
    /// suggestion when nothing matches.
    pub fn find_by_name(&self, name: &str) -> Result<&Exercise, RegistryError> {
        let wanted = name.trim();
        self.workout
            .exercises
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RegistryError::UnknownExercise {
                name: wanted.to_string(),
                suggestion: suggest_name(wanted, self.names()),
            })
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.workout.exercises.iter().map(|e| e.name.as_str())
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.workout.completed_count()
    }

    /// First incomplete exercise after `after`, wrapping to the start.
    ///
    /// With `after` unset (or unknown) the search starts at the top.
    #[must_use]
    pub fn next_incomplete(&self, after: Option<Uuid>) -> Option<&Exercise> {
        let exercises = &self.workout.exercises;
        let Some(current) = after.and_then(|id| self.workout.position(id)) else {
            return exercises.iter().find(|e| !e.is_completed);
        };
        exercises[current + 1..]
            .iter()
            .chain(&exercises[..current])
            .find(|e| !e.is_completed)
    }

    fn index_of(&self, id: Uuid) -> Result<usize, RegistryError> {
        self.workout.position(id).ok_or(RegistryError::UnknownId(id))
    }

    fn validate_name(&self, name: &str, ignore: Option<Uuid>) -> Result<String, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let taken = self
            .workout
            .exercises
            .iter()
            .any(|e| Some(e.id) != ignore && e.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(RegistryError::DuplicateExercise(name.to_string()));
        }
        Ok(name.to_string())
    }

    // ========================================================================
    // Layout edits
    // ========================================================================

    /// Appends an exercise.
    ///
    /// # Errors
    ///
    /// Rejects blank and duplicate names, or fails to persist.
    pub fn add_exercise(&mut self, mut exercise: Exercise) -> Result<Uuid, RegistryError> {
        exercise.name = self.validate_name(&exercise.name, None)?;
        let id = exercise.id;
        info!(name = %exercise.name, profile = %self.profile, "adding exercise");
        self.workout.exercises.push(exercise);
        self.save_workout()?;
        self.save_progress(id)?;
        Ok(id)
    }

    /// Replaces the exercise with the same id. A rename moves its stored
    /// results to the new name.
    ///
    /// # Errors
    ///
    /// Unknown id, blank or duplicate name, or a persistence failure.
    pub fn update_exercise(&mut self, mut exercise: Exercise) -> Result<(), RegistryError> {
        let index = self.index_of(exercise.id)?;
        exercise.name = self.validate_name(&exercise.name, Some(exercise.id))?;

        let old_name = self.workout.exercises[index].name.clone();
        if old_name != exercise.name {
            self.clear_keys(&old_name)?;
        }
        self.workout.exercises[index] = exercise;
        self.save_workout()?;
        self.save_progress(self.workout.exercises[index].id)
    }

    /// Removes an exercise and its stored results.
    ///
    /// # Errors
    ///
    /// Unknown id or a persistence failure.
    pub fn remove_exercise(&mut self, id: Uuid) -> Result<Exercise, RegistryError> {
        let index = self.index_of(id)?;
        let removed = self.workout.exercises.remove(index);
        self.clear_keys(&removed.name)?;
        self.save_workout()?;
        info!(name = %removed.name, "removed exercise");
        Ok(removed)
    }

    /// Moves the exercise at `from` to position `to`.
    ///
    /// # Errors
    ///
    /// Either index out of range, or a persistence failure.
    pub fn move_exercise(&mut self, from: usize, to: usize) -> Result<(), RegistryError> {
        let len = self.workout.exercises.len();
        for index in [from, to] {
            if index >= len {
                return Err(RegistryError::IndexOutOfRange { index, len });
            }
        }
        let exercise = self.workout.exercises.remove(from);
        self.workout.exercises.insert(to, exercise);
        self.save_workout()
    }

    /// Replaces the whole workout, resetting completion. Used when loading
    /// a template or rebuilding a workout from history.
    ///
    /// # Errors
    ///
    /// Returns a persistence failure.
    pub fn load_exercises(&mut self, exercises: Vec<Exercise>) -> Result<(), RegistryError> {
        let old: Vec<String> = self.workout.exercises.iter().map(|e| e.name.clone()).collect();
        for name in &old {
            self.store.remove(&keys::exercise_completed(self.profile, name))?;
            self.store.remove(&keys::exercise_logged(self.profile, name))?;
        }

        self.workout.exercises = exercises;
        for exercise in &mut self.workout.exercises {
            exercise.reset_progress();
        }
        self.save_workout()?;
        let ids: Vec<Uuid> = self.workout.exercises.iter().map(|e| e.id).collect();
        for id in ids {
            self.save_progress(id)?;
        }
        info!(
            profile = %self.profile,
            exercises = self.workout.exercises.len(),
            "loaded exercises into workout"
        );
        Ok(())
    }

    // ========================================================================
    // Results and progress
    // ========================================================================

    fn exercise_mut(&mut self, id: Uuid) -> Result<&mut Exercise, RegistryError> {
        let index = self.index_of(id)?;
        Ok(&mut self.workout.exercises[index])
    }

    /// # Errors
    ///
    /// Unknown id or a persistence failure.
    pub fn update_weight(&mut self, id: Uuid, weight: f64) -> Result<(), RegistryError> {
        self.exercise_mut(id)?.last_weight = Some(weight);
        self.save_progress(id)
    }

    /// # Errors
    ///
    /// Unknown id or a persistence failure.
    pub fn update_duration(&mut self, id: Uuid, seconds: u32) -> Result<(), RegistryError> {
        self.exercise_mut(id)?.last_duration = Some(seconds);
        self.save_progress(id)
    }

    /// Switches negative-only mode for one exercise.
    ///
    /// # Errors
    ///
    /// Unknown id or a persistence failure.
    pub fn set_negative_only(
        &mut self,
        id: Uuid,
        negative_only: bool,
    ) -> Result<(), RegistryError> {
        self.exercise_mut(id)?.is_negative_only = negative_only;
        self.save_progress(id)
    }

    /// Records the outcome of a set: weight plus failure flag.
    ///
    /// # Errors
    ///
    /// Unknown id or a persistence failure.
    pub fn record_result(
        &mut self,
        id: Uuid,
        weight: f64,
        reached_failure: bool,
    ) -> Result<(), RegistryError> {
        let exercise = self.exercise_mut(id)?;
        exercise.last_weight = Some(weight);
        exercise.reached_failure = reached_failure;
        self.save_progress(id)
    }

    /// # Errors
    ///
    /// Unknown id or a persistence failure.
    pub fn mark_completed(&mut self, id: Uuid, completed: bool) -> Result<(), RegistryError> {
        self.exercise_mut(id)?.is_completed = completed;
        self.save_progress(id)
    }

    /// # Errors
    ///
    /// Unknown id or a persistence failure.
    pub fn mark_logged(&mut self, id: Uuid, logged: bool) -> Result<(), RegistryError> {
        self.exercise_mut(id)?.is_logged = logged;
        self.save_progress(id)
    }

    /// Marks an exercise done without logging a set.
    ///
    /// # Errors
    ///
    /// Unknown id or a persistence failure.
    pub fn skip_exercise(&mut self, id: Uuid) -> Result<(), RegistryError> {
        debug!(%id, "skipping exercise");
        self.mark_completed(id, true)
    }

    /// Clears completion and logged flags, keeping weights for next time.
    ///
    /// # Errors
    ///
    /// Returns a persistence failure.
    pub fn finish_workout(&mut self) -> Result<(), RegistryError> {
        let profile = self.profile;
        for exercise in &mut self.workout.exercises {
            self.store.remove(&keys::exercise_completed(profile, &exercise.name))?;
            self.store.remove(&keys::exercise_logged(profile, &exercise.name))?;
            exercise.reset_progress();
        }
        info!(profile = %profile, "workout finished, progress cleared");
        Ok(())
    }

    /// Drops every stored result and the custom layout, restoring the
    /// built-in workout.
    ///
    /// # Errors
    ///
    /// Returns a persistence failure.
    pub fn reset_workout(&mut self) -> Result<(), RegistryError> {
        let names: Vec<String> = self.workout.exercises.iter().map(|e| e.name.clone()).collect();
        for name in &names {
            self.clear_keys(name)?;
        }
        self.store.remove(&keys::custom_workout(self.profile))?;
        self.workout = Workout::default_workout();
        self.overlay_progress();
        info!(profile = %self.profile, "workout reset to defaults");
        Ok(())
    }

    // ========================================================================
    // Settings and profile
    // ========================================================================

    /// Stored phase durations, or the defaults, pulled into their allowed
    /// ranges.
    #[must_use]
    pub fn phase_settings(&self) -> PhaseSettings {
        self.store
            .get_as::<PhaseSettings>(keys::PHASE_SETTINGS)
            .unwrap_or_default()
            .clamped()
    }

    /// # Errors
    ///
    /// Returns a persistence failure.
    pub fn set_phase_settings(&self, settings: &PhaseSettings) -> Result<(), RegistryError> {
        self.store.set_as(keys::PHASE_SETTINGS, settings)?;
        Ok(())
    }

    /// Switches to `profile`, recording it as current and reloading.
    ///
    /// # Errors
    ///
    /// Returns a persistence failure.
    pub fn select_profile(&mut self, profile: Profile) -> Result<(), RegistryError> {
        self.store
            .set(keys::CURRENT_PROFILE, serde_json::Value::from(profile.number()))?;
        *self = Self::load(self.store.clone(), profile);
        Ok(())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    fn save_workout(&self) -> Result<(), RegistryError> {
        self.store
            .set_as(&keys::custom_workout(self.profile), &self.workout.exercises)?;
        Ok(())
    }

    fn save_progress(&self, id: Uuid) -> Result<(), RegistryError> {
        let Some(exercise) = self.find(id) else {
            return Err(RegistryError::UnknownId(id));
        };
        let p = self.profile;
        let name = exercise.name.as_str();

        match exercise.last_weight {
            Some(w) => self.store.set_as(&keys::exercise_weight(p, name), &w)?,
            None => self.store.remove(&keys::exercise_weight(p, name))?,
        }
        match exercise.last_duration {
            Some(d) => self.store.set_as(&keys::exercise_duration(p, name), &d)?,
            None => self.store.remove(&keys::exercise_duration(p, name))?,
        }
        self.store
            .set_as(&keys::exercise_failure(p, name), &exercise.reached_failure)?;
        self.store
            .set_as(&keys::exercise_negative(p, name), &exercise.is_negative_only)?;
        self.store
            .set_as(&keys::exercise_completed(p, name), &exercise.is_completed)?;
        self.store
            .set_as(&keys::exercise_logged(p, name), &exercise.is_logged)?;
        Ok(())
    }

    fn clear_keys(&self, name: &str) -> Result<(), RegistryError> {
        for key in keys::all_exercise_keys(self.profile, name) {
            self.store.remove(&key)?;
        }
        Ok(())
    }
}

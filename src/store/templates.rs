//! Saved workout templates.
//!
//! Templates are stored per profile as one JSON list under
//! `workoutTemplates_{p}`, newest first. The shareable form drops ids and
//! profile so a template can move between installations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::keys;
use super::kv::SharedStore;
use super::log::LogStore;
use crate::error::{RegistryError, StoreError};
use crate::model::{Exercise, Profile, WorkoutLogEntry};

/// Current shareable format version.
pub const SHARE_VERSION: u32 = 1;

/// Default icon for exercises created from templates or history.
const DEFAULT_ICON: &str = "dumbbell.png";

/// Default audio stem for exercises created from templates or history.
const DEFAULT_AUDIO: &str = "exercise_custom";

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

fn default_audio() -> String {
    DEFAULT_AUDIO.to_string()
}

/// One exercise slot in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateExercise {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_duration: Option<u32>,
    #[serde(default)]
    pub is_bodyweight: bool,
    #[serde(default)]
    pub is_negative_only: bool,
    #[serde(default = "default_icon")]
    pub icon_name: String,
    #[serde(default = "default_audio")]
    pub audio_file_name: String,
}

impl TemplateExercise {
    fn from_exercise(exercise: &Exercise) -> Self {
        Self {
            name: exercise.name.clone(),
            target_weight: exercise.last_weight,
            target_duration: exercise.last_duration,
            is_bodyweight: exercise.is_bodyweight,
            is_negative_only: exercise.is_negative_only,
            icon_name: exercise.icon_name.clone(),
            audio_file_name: exercise.audio_file_name.clone(),
        }
    }

    fn to_exercise(&self) -> Exercise {
        Exercise {
            last_weight: self.target_weight,
            last_duration: self.target_duration,
            is_bodyweight: self.is_bodyweight,
            is_negative_only: self.is_negative_only,
            ..Exercise::new(self.name.clone(), &self.icon_name, &self.audio_file_name)
        }
    }
}

/// A reusable exercise list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplate {
    pub id: Uuid,
    pub name: String,
    pub profile: Profile,
    pub exercises: Vec<TemplateExercise>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_built_in: bool,
}

impl WorkoutTemplate {
    fn new(
        name: &str,
        profile: Profile,
        exercises: Vec<TemplateExercise>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            profile,
            exercises,
            created_at: now,
            last_used_at: None,
            is_built_in: false,
        }
    }

    /// Snapshot of a workout's exercises and their current weights.
    #[must_use]
    pub fn from_exercises(
        name: &str,
        profile: Profile,
        exercises: &[Exercise],
        now: DateTime<Utc>,
    ) -> Self {
        let exercises = exercises.iter().map(TemplateExercise::from_exercise).collect();
        Self::new(name, profile, exercises, now)
    }

    /// Template rebuilt from history. Each exercise appears once, in the
    /// order it was first performed, with its most recent weight.
    #[must_use]
    pub fn from_log_entries(
        name: &str,
        profile: Profile,
        entries: &[&WorkoutLogEntry],
        now: DateTime<Utc>,
    ) -> Self {
        let mut chronological: Vec<&WorkoutLogEntry> = entries.to_vec();
        chronological.sort_by_key(|e| e.date);

        let mut exercises: Vec<TemplateExercise> = Vec::new();
        for entry in chronological {
            if let Some(slot) = exercises.iter_mut().find(|t| t.name == entry.exercise_name) {
                slot.target_weight = Some(entry.weight);
                slot.target_duration = entry.duration.or(slot.target_duration);
            } else {
                exercises.push(TemplateExercise {
                    name: entry.exercise_name.clone(),
                    target_weight: Some(entry.weight),
                    target_duration: entry.duration,
                    is_bodyweight: false,
                    is_negative_only: false,
                    icon_name: default_icon(),
                    audio_file_name: default_audio(),
                });
            }
        }
        Self::new(name, profile, exercises, now)
    }

    /// Fresh exercises (new ids, no progress) for loading into a workout.
    #[must_use]
    pub fn to_exercises(&self) -> Vec<Exercise> {
        self.exercises.iter().map(TemplateExercise::to_exercise).collect()
    }
}

/// Portable template payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareableTemplate {
    pub version: u32,
    pub name: String,
    pub exercises: Vec<TemplateExercise>,
    pub exported_at: DateTime<Utc>,
}

/// Suggested name for a template built from one day of history.
#[must_use]
pub fn suggested_name(date: NaiveDate) -> String {
    format!("Workout - {}", date.format("%b %-d"))
}

/// History grouped by calendar day, newest day first, at most `limit` days.
#[must_use]
pub fn recent_workout_days(
    log: &LogStore,
    profile: Profile,
    limit: usize,
) -> Vec<(NaiveDate, Vec<&WorkoutLogEntry>)> {
    let mut days: Vec<(NaiveDate, Vec<&WorkoutLogEntry>)> = Vec::new();
    for entry in log.entries_for_profile(profile) {
        let day = log.day_of(entry.date);
        match days.iter_mut().find(|(d, _)| *d == day) {
            Some((_, entries)) => entries.push(entry),
            None => days.push((day, vec![entry])),
        }
    }
    days.sort_by(|a, b| b.0.cmp(&a.0));
    days.truncate(limit);
    days
}

/// Per-profile template persistence.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    store: SharedStore,
}

impl TemplateStore {
    #[must_use]
    pub const fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Every template of `profile`, in stored order.
    #[must_use]
    pub fn templates(&self, profile: Profile) -> Vec<WorkoutTemplate> {
        self.store
            .get_as(&keys::workout_templates(profile))
            .unwrap_or_default()
    }

    fn persist(&self, profile: Profile, templates: &[WorkoutTemplate]) -> Result<(), StoreError> {
        self.store.set_as(&keys::workout_templates(profile), templates)
    }

    /// Case-insensitive lookup by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownTemplate`] when nothing matches.
    pub fn find(&self, profile: Profile, name: &str) -> Result<WorkoutTemplate, RegistryError> {
        self.templates(profile)
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| RegistryError::UnknownTemplate {
                name: name.to_string(),
                profile,
            })
    }

    /// Inserts `template` at the front, or replaces the one with its id.
    ///
    /// # Errors
    ///
    /// Returns a persistence failure.
    pub fn save(&self, template: WorkoutTemplate) -> Result<(), RegistryError> {
        let profile = template.profile;
        let mut templates = self.templates(profile);
        if let Some(slot) = templates.iter_mut().find(|t| t.id == template.id) {
            *slot = template;
        } else {
            info!(name = %template.name, profile = %profile, "saving new template");
            templates.insert(0, template);
        }
        self.persist(profile, &templates)?;
        Ok(())
    }

    /// Saves the given exercises as a new template.
    ///
    /// # Errors
    ///
    /// Returns a persistence failure.
    pub fn create_from_exercises(
        &self,
        name: &str,
        profile: Profile,
        exercises: &[Exercise],
        now: DateTime<Utc>,
    ) -> Result<WorkoutTemplate, RegistryError> {
        let template = WorkoutTemplate::from_exercises(name, profile, exercises, now);
        self.save(template.clone())?;
        Ok(template)
    }

    /// Saves a template rebuilt from log entries.
    ///
    /// # Errors
    ///
    /// Returns a persistence failure.
    pub fn create_from_logs(
        &self,
        name: &str,
        profile: Profile,
        entries: &[&WorkoutLogEntry],
        now: DateTime<Utc>,
    ) -> Result<WorkoutTemplate, RegistryError> {
        let template = WorkoutTemplate::from_log_entries(name, profile, entries, now);
        self.save(template.clone())?;
        Ok(template)
    }

    /// # Errors
    ///
    /// Unknown template or a persistence failure.
    pub fn delete(&self, profile: Profile, name: &str) -> Result<WorkoutTemplate, RegistryError> {
        let target = self.find(profile, name)?;
        let mut templates = self.templates(profile);
        templates.retain(|t| t.id != target.id);
        self.persist(profile, &templates)?;
        info!(name = %target.name, "deleted template");
        Ok(target)
    }

    /// # Errors
    ///
    /// Unknown template, blank name, or a persistence failure.
    pub fn rename(&self, profile: Profile, name: &str, new_name: &str) -> Result<(), RegistryError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let mut template = self.find(profile, name)?;
        template.name = new_name.to_string();
        self.save(template)
    }

    /// Stamps the template as used at `now`.
    ///
    /// # Errors
    ///
    /// Unknown template or a persistence failure.
    pub fn mark_used(
        &self,
        profile: Profile,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let mut template = self.find(profile, name)?;
        template.last_used_at = Some(now);
        debug!(name = %template.name, "template used");
        self.save(template)
    }

    /// Used templates, most recent first.
    #[must_use]
    pub fn recent(&self, profile: Profile, limit: usize) -> Vec<WorkoutTemplate> {
        let mut used: Vec<_> = self
            .templates(profile)
            .into_iter()
            .filter(|t| t.last_used_at.is_some())
            .collect();
        used.sort_by(|a, b| b.last_used_at.cmp(&a.last_used_at));
        used.truncate(limit);
        used
    }

    /// User-created templates, newest first.
    #[must_use]
    pub fn saved(&self, profile: Profile) -> Vec<WorkoutTemplate> {
        let mut saved: Vec<_> = self
            .templates(profile)
            .into_iter()
            .filter(|t| !t.is_built_in)
            .collect();
        saved.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        saved
    }

    /// Serializes a template for sharing.
    ///
    /// # Errors
    ///
    /// Unknown template or an encoding failure.
    pub fn export(
        &self,
        profile: Profile,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<String, RegistryError> {
        let template = self.find(profile, name)?;
        let shareable = ShareableTemplate {
            version: SHARE_VERSION,
            name: template.name,
            exercises: template.exercises,
            exported_at: now,
        };
        serde_json::to_string_pretty(&shareable).map_err(|source| {
            RegistryError::Store(StoreError::Encode {
                key: name.to_string(),
                source,
            })
        })
    }

    /// Decodes a shared template and saves it for `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTemplate`] for undecodable or newer
    /// payloads, or a persistence failure.
    pub fn import(
        &self,
        profile: Profile,
        data: &str,
        now: DateTime<Utc>,
    ) -> Result<WorkoutTemplate, RegistryError> {
        let shareable: ShareableTemplate = serde_json::from_str(data)
            .map_err(|e| StoreError::InvalidTemplate(e.to_string()))?;
        if shareable.version > SHARE_VERSION {
            return Err(StoreError::InvalidTemplate(format!(
                "format version {} is newer than supported version {SHARE_VERSION}",
                shareable.version
            ))
            .into());
        }
        if shareable.name.trim().is_empty() {
            return Err(StoreError::InvalidTemplate("template has no name".to_string()).into());
        }
        let template = WorkoutTemplate::new(&shareable.name, profile, shareable.exercises, now);
        self.save(template.clone())?;
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::*;
    use crate::model::Workout;
    use crate::model::log::NewLogEntry;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, day, 12, 0, 0).unwrap()
    }

    fn templates() -> TemplateStore {
        TemplateStore::new(SharedStore::memory())
    }

    #[test]
    fn save_inserts_front_and_replaces_by_id() {
        let store = templates();
        let workout = Workout::default_workout();
        let a = store
            .create_from_exercises("A", Profile::PRIMARY, &workout.exercises, at(1))
            .unwrap();
        store
            .create_from_exercises("B", Profile::PRIMARY, &workout.exercises[..2], at(2))
            .unwrap();
        assert_eq!(store.templates(Profile::PRIMARY)[0].name, "B");

        let mut edited = a;
        edited.exercises.truncate(1);
        store.save(edited).unwrap();
        let all = store.templates(Profile::PRIMARY);
        assert_eq!(all.len(), 2);
        assert_eq!(store.find(Profile::PRIMARY, "a").unwrap().exercises.len(), 1);
    }

    #[test]
    fn from_exercises_carries_weights() {
        let mut workout = Workout::default_workout();
        workout.exercises[0].last_weight = Some(220.0);
        let template = WorkoutTemplate::from_exercises("Legs", Profile::PRIMARY, &workout.exercises, at(1));
        assert_eq!(template.exercises[0].target_weight, Some(220.0));

        let exercises = template.to_exercises();
        assert_eq!(exercises[0].last_weight, Some(220.0));
        assert_ne!(exercises[0].id, workout.exercises[0].id);
        assert!(!exercises[0].is_completed);
    }

    #[test]
    fn from_logs_keeps_latest_weight_per_exercise() {
        let mut log = LogStore::in_memory().with_offset(FixedOffset::east_opt(0).unwrap());
        for (name, weight, day) in [
            ("Leg Press", 200.0, 1),
            ("Pulldown", 100.0, 1),
            ("Leg Press", 210.0, 2),
        ] {
            log.append(Profile::PRIMARY, NewLogEntry::new(name, weight, true), at(day))
                .unwrap();
        }
        let entries: Vec<_> = log.entries_for_profile(Profile::PRIMARY).collect();
        let template = WorkoutTemplate::from_log_entries("From log", Profile::PRIMARY, &entries, at(3));

        let names: Vec<_> = template.exercises.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Leg Press", "Pulldown"]);
        assert_eq!(template.exercises[0].target_weight, Some(210.0));
    }

    #[test]
    fn rename_delete_and_unknown() {
        let store = templates();
        store
            .create_from_exercises("Push", Profile::PRIMARY, &[], at(1))
            .unwrap();
        store.rename(Profile::PRIMARY, "push", "Push Day").unwrap();
        assert!(store.find(Profile::PRIMARY, "Push Day").is_ok());
        assert!(matches!(
            store.rename(Profile::PRIMARY, "Push Day", "  "),
            Err(RegistryError::EmptyName)
        ));

        store.delete(Profile::PRIMARY, "Push Day").unwrap();
        assert!(matches!(
            store.delete(Profile::PRIMARY, "Push Day"),
            Err(RegistryError::UnknownTemplate { .. })
        ));
    }

    #[test]
    fn recent_and_saved_ordering() {
        let store = templates();
        for (name, day) in [("One", 1), ("Two", 2), ("Three", 3)] {
            store
                .create_from_exercises(name, Profile::PRIMARY, &[], at(day))
                .unwrap();
        }
        store.mark_used(Profile::PRIMARY, "One", at(10)).unwrap();
        store.mark_used(Profile::PRIMARY, "Three", at(5)).unwrap();

        let recent: Vec<_> = store
            .recent(Profile::PRIMARY, 5)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(recent, vec!["One", "Three"]);

        let saved: Vec<_> = store
            .saved(Profile::PRIMARY)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(saved, vec!["Three", "Two", "One"]);
    }

    #[test]
    fn export_import_between_profiles() {
        let store = templates();
        let workout = Workout::default_workout();
        store
            .create_from_exercises("Full", Profile::PRIMARY, &workout.exercises, at(1))
            .unwrap();
        let json = store.export(Profile::PRIMARY, "Full", at(2)).unwrap();
        assert!(!json.contains("\"id\""));

        let second = Profile::new(2).unwrap();
        let imported = store.import(second, &json, at(3)).unwrap();
        assert_eq!(imported.profile, second);
        assert_eq!(imported.exercises.len(), 8);
        assert_eq!(store.templates(second).len(), 1);
    }

    #[test]
    fn import_rejects_garbage_and_future_versions() {
        let store = templates();
        assert!(matches!(
            store.import(Profile::PRIMARY, "{}", at(1)),
            Err(RegistryError::Store(StoreError::InvalidTemplate(_)))
        ));
        let future = r#"{"version": 9, "name": "X", "exercises": [], "exportedAt": "2026-04-01T00:00:00Z"}"#;
        assert!(matches!(
            store.import(Profile::PRIMARY, future, at(1)),
            Err(RegistryError::Store(StoreError::InvalidTemplate(_)))
        ));
    }

    #[test]
    fn recent_days_group_newest_first() {
        let mut log = LogStore::in_memory().with_offset(FixedOffset::east_opt(0).unwrap());
        for day in [1, 1, 3] {
            log.append(Profile::PRIMARY, NewLogEntry::new("Leg Press", 100.0, true), at(day))
                .unwrap();
        }
        let days = recent_workout_days(&log, Profile::PRIMARY, 10);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].0, NaiveDate::from_ymd_opt(2026, 4, 3).unwrap());
        assert_eq!(days[1].1.len(), 2);
        assert_eq!(suggested_name(days[0].0), "Workout - Apr 3");
    }
}

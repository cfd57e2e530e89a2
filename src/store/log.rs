//! Set history.
//!
//! The history is a JSON array on disk, newest entry first. Entries are
//! never edited; the only removal is an explicit per-profile clear.
//! Calendar questions (streaks, "today") are answered in the store's UTC
//! offset, which defaults to the local one.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Days, FixedOffset, Local, NaiveDate, Offset, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::kv::{read_json_lenient, write_atomic};
use crate::error::StoreError;
use crate::model::Profile;
use crate::model::WorkoutLogEntry;
use crate::model::log::NewLogEntry;

/// Streaks are never counted further back than this.
pub const MAX_STREAK_DAYS: u32 = 365;

/// CSV header row.
pub const CSV_HEADER: &str =
    "Date,Exercise,Workout,Weight (lbs),Reps,RPE,Reached Failure,Notes,Estimated 1RM";

/// A stored entry and whether it set a personal record.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedSet {
    pub entry: WorkoutLogEntry,
    pub is_personal_record: bool,
}

/// Aggregate stats shown by the home-screen widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSummary {
    pub streak: u32,
    /// Distinct calendar days with at least one set.
    pub total_workouts: usize,
    /// Distinct workout days in the last seven days.
    pub weekly_workouts: usize,
    pub last_workout_date: Option<DateTime<Utc>>,
    pub last_workout_type: Option<String>,
    /// Sum of weights logged in the last seven days.
    pub total_volume: f64,
    pub primary_profile: Profile,
}

/// Append-only set history.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: Option<PathBuf>,
    entries: Vec<WorkoutLogEntry>,
    offset: FixedOffset,
}

impl LogStore {
    /// File name used inside the data directory.
    pub const FILE_NAME: &'static str = "workout_logs.json";

    /// Opens the history at `path`. A missing or corrupt file is an empty
    /// history.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries: Vec<WorkoutLogEntry> = read_json_lenient(&path).unwrap_or_default();
        debug!(path = %path.display(), entries = entries.len(), "opened log store");
        Self {
            path: Some(path),
            entries,
            offset: Local::now().offset().fix(),
        }
    }

    /// A history that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Vec::new(),
            offset: Local::now().offset().fix(),
        }
    }

    /// Uses `offset` for calendar-day calculations and CSV timestamps.
    #[must_use]
    pub const fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Every entry, newest first.
    #[must_use]
    pub fn entries(&self) -> &[WorkoutLogEntry] {
        &self.entries
    }

    /// Calendar day of `date` in the store's offset.
    #[must_use]
    pub fn day_of(&self, date: DateTime<Utc>) -> NaiveDate {
        date.with_timezone(&self.offset).date_naive()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Appends a set at `now` and reports whether it is a personal record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the history cannot be written. The entry is
    /// kept in memory either way.
    pub fn append(
        &mut self,
        profile: Profile,
        new: NewLogEntry,
        now: DateTime<Utc>,
    ) -> Result<LoggedSet, StoreError> {
        let logged = self.record(profile, new, now);
        self.save()?;
        Ok(logged)
    }

    /// Adds a set to the in-memory history without writing it. Pair with
    /// [`Self::save`].
    pub fn record(&mut self, profile: Profile, new: NewLogEntry, now: DateTime<Utc>) -> LoggedSet {
        let is_personal_record = self.is_new_pr(&new.exercise_name, new.weight, profile);
        let entry = WorkoutLogEntry {
            id: Uuid::new_v4(),
            date: now,
            exercise_name: new.exercise_name,
            workout_type: new.workout_type,
            weight: new.weight,
            reached_failure: new.reached_failure,
            profile,
            rpe: new.rpe,
            notes: new.notes,
            duration: new.duration,
            reps: new.reps,
        };
        self.entries.insert(0, entry.clone());
        debug!(
            exercise = %entry.exercise_name,
            weight = entry.weight,
            pr = is_personal_record,
            "appended log entry"
        );
        LoggedSet {
            entry,
            is_personal_record,
        }
    }

    /// Removes every entry of `profile`, returning how many were dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the history cannot be written.
    pub fn clear_profile(&mut self, profile: Profile) -> Result<usize, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.profile != profile);
        let removed = before - self.entries.len();
        info!(profile = %profile, removed, "cleared log entries");
        self.save()?;
        Ok(removed)
    }

    /// Writes the whole history. In-memory stores do nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the history cannot be encoded or written.
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(&self.entries).map_err(|source| StoreError::Encode {
            key: Self::FILE_NAME.to_string(),
            source,
        })?;
        write_atomic(path, &bytes)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Entries of `profile`, newest first.
    pub fn entries_for_profile(
        &self,
        profile: Profile,
    ) -> impl Iterator<Item = &WorkoutLogEntry> + '_ {
        self.entries.iter().filter(move |e| e.profile == profile)
    }

    /// Entries of one exercise for `profile`, newest first.
    pub fn entries_for_exercise<'a>(
        &'a self,
        exercise: &'a str,
        profile: Profile,
    ) -> impl Iterator<Item = &'a WorkoutLogEntry> + 'a {
        self.entries_for_profile(profile)
            .filter(move |e| e.exercise_name == exercise)
    }

    #[must_use]
    pub fn recent(&self, profile: Profile, limit: usize) -> Vec<&WorkoutLogEntry> {
        self.entries_for_profile(profile).take(limit).collect()
    }

    #[must_use]
    pub fn max_weight(&self, exercise: &str, profile: Profile) -> Option<f64> {
        self.entries_for_exercise(exercise, profile)
            .map(|e| e.weight)
            .reduce(f64::max)
    }

    #[must_use]
    pub fn last_weight(&self, exercise: &str, profile: Profile) -> Option<f64> {
        self.entries_for_exercise(exercise, profile)
            .next()
            .map(|e| e.weight)
    }

    #[must_use]
    pub fn total_sets(&self, profile: Profile) -> usize {
        self.entries_for_profile(profile).count()
    }

    /// Sets logged on calendar day `date`.
    #[must_use]
    pub fn sets_on(&self, profile: Profile, date: NaiveDate) -> usize {
        self.entries_for_profile(profile)
            .filter(|e| self.day_of(e.date) == date)
            .count()
    }

    /// Percentage of sets taken to failure, 0 with no history.
    #[must_use]
    pub fn failure_rate(&self, exercise: &str, profile: Profile) -> f64 {
        let (failures, total) = self
            .entries_for_exercise(exercise, profile)
            .fold((0u32, 0u32), |(f, t), e| (f + u32::from(e.reached_failure), t + 1));
        if total == 0 {
            return 0.0;
        }
        f64::from(failures) / f64::from(total) * 100.0
    }

    /// The last `last` weights of an exercise, oldest first.
    #[must_use]
    pub fn progress(
        &self,
        exercise: &str,
        profile: Profile,
        last: usize,
    ) -> Vec<(DateTime<Utc>, f64)> {
        let mut points: Vec<_> = self
            .entries_for_exercise(exercise, profile)
            .take(last)
            .map(|e| (e.date, e.weight))
            .collect();
        points.reverse();
        points
    }

    /// Best estimated one-rep max across the exercise's history.
    #[must_use]
    pub fn estimated_1rm(&self, exercise: &str, profile: Profile) -> Option<f64> {
        self.entries_for_exercise(exercise, profile)
            .filter_map(WorkoutLogEntry::estimated_1rm)
            .reduce(f64::max)
    }

    #[must_use]
    pub fn average_rpe(&self, exercise: &str, profile: Profile) -> Option<f64> {
        let rpes: Vec<u8> = self
            .entries_for_exercise(exercise, profile)
            .filter_map(|e| e.rpe)
            .collect();
        if rpes.is_empty() {
            return None;
        }
        let sum: u32 = rpes.iter().map(|&r| u32::from(r)).sum();
        let count = u32::try_from(rpes.len()).unwrap_or(u32::MAX);
        Some(f64::from(sum) / f64::from(count))
    }

    /// Distinct exercise names, sorted.
    #[must_use]
    pub fn unique_exercises(&self, profile: Profile) -> Vec<String> {
        self.entries_for_profile(profile)
            .map(|e| e.exercise_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Heaviest weight per exercise.
    #[must_use]
    pub fn personal_records(&self, profile: Profile) -> BTreeMap<String, f64> {
        let mut prs = BTreeMap::new();
        for entry in self.entries_for_profile(profile) {
            prs.entry(entry.exercise_name.clone())
                .and_modify(|w: &mut f64| *w = w.max(entry.weight))
                .or_insert(entry.weight);
        }
        prs
    }

    /// Whether `weight` would beat the exercise's best. Anything is a record
    /// for an exercise without history.
    #[must_use]
    pub fn is_new_pr(&self, exercise: &str, weight: f64, profile: Profile) -> bool {
        self.max_weight(exercise, profile)
            .is_none_or(|max| weight > max)
    }

    /// Sum of weights logged within `days` days before `now`.
    #[must_use]
    pub fn total_volume(&self, profile: Profile, days: i64, now: DateTime<Utc>) -> f64 {
        let since = now - TimeDelta::days(days);
        self.entries_for_profile(profile)
            .filter(|e| e.date >= since)
            .map(|e| e.weight)
            .sum()
    }

    /// Distinct calendar days with at least one set.
    #[must_use]
    pub fn workout_days(&self, profile: Profile) -> BTreeSet<NaiveDate> {
        self.entries_for_profile(profile)
            .map(|e| self.day_of(e.date))
            .collect()
    }

    /// Consecutive workout days ending today, or yesterday when today has
    /// no sets yet.
    #[must_use]
    pub fn streak(&self, profile: Profile, today: NaiveDate) -> u32 {
        let days = self.workout_days(profile);
        let Some(&last) = days.last() else {
            return 0;
        };
        let yesterday = today.pred_opt().unwrap_or(today);
        if last != today && last != yesterday {
            return 0;
        }

        let mut streak = 0;
        for back in 0..MAX_STREAK_DAYS {
            let Some(day) = today.checked_sub_days(Days::new(u64::from(back))) else {
                break;
            };
            if days.contains(&day) {
                streak += 1;
            } else if back == 0 {
                continue;
            } else {
                break;
            }
        }
        streak
    }

    /// Widget summary as of `now`.
    #[must_use]
    pub fn summary(&self, profile: Profile, now: DateTime<Utc>) -> WidgetSummary {
        let today = self.day_of(now);
        let days = self.workout_days(profile);
        let week_ago = today.checked_sub_days(Days::new(7)).unwrap_or(today);
        let last = self.entries_for_profile(profile).next();

        WidgetSummary {
            streak: self.streak(profile, today),
            total_workouts: days.len(),
            weekly_workouts: days.range(week_ago..).count(),
            last_workout_date: last.map(|e| e.date),
            last_workout_type: last.map(|e| e.workout_type.clone()),
            total_volume: self.total_volume(profile, 7, now),
            primary_profile: profile,
        }
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Renders a profile's history as CSV, newest first.
    #[must_use]
    pub fn export_csv(&self, profile: Profile) -> String {
        let mut csv = String::from(CSV_HEADER);
        csv.push('\n');
        for e in self.entries_for_profile(profile) {
            let date = e.date.with_timezone(&self.offset).format("%Y-%m-%d %H:%M");
            let reps = e.reps.map(|r| r.to_string()).unwrap_or_default();
            let rpe = e.rpe.map(|r| r.to_string()).unwrap_or_default();
            let notes = e.notes.as_deref().unwrap_or_default().replace(',', ";");
            let one_rm = e
                .estimated_1rm()
                .map(|v| format!("{v:.1}"))
                .unwrap_or_default();
            let _ = writeln!(
                csv,
                "{date},{},{},{:?},{reps},{rpe},{},{notes},{one_rm}",
                e.exercise_name, e.workout_type, e.weight, e.reached_failure
            );
        }
        csv
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn store() -> LogStore {
        LogStore::in_memory().with_offset(FixedOffset::east_opt(0).unwrap())
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn log(store: &mut LogStore, name: &str, weight: f64, when: DateTime<Utc>) -> LoggedSet {
        store
            .append(Profile::PRIMARY, NewLogEntry::new(name, weight, true), when)
            .unwrap()
    }

    #[test]
    fn first_entry_is_pr_then_strictly_greater() {
        let mut store = store();
        assert!(log(&mut store, "Leg Press", 200.0, at(1, 9)).is_personal_record);
        assert!(!log(&mut store, "Leg Press", 200.0, at(2, 9)).is_personal_record);
        assert!(!log(&mut store, "Leg Press", 190.0, at(3, 9)).is_personal_record);
        assert!(log(&mut store, "Leg Press", 205.0, at(4, 9)).is_personal_record);
        assert!(log(&mut store, "Pulldown", 100.0, at(4, 9)).is_personal_record);
    }

    #[test]
    fn prs_are_per_profile() {
        let mut store = store();
        log(&mut store, "Leg Press", 300.0, at(1, 9));
        let other = store
            .append(
                Profile::new(2).unwrap(),
                NewLogEntry::new("Leg Press", 150.0, true),
                at(1, 10),
            )
            .unwrap();
        assert!(other.is_personal_record);
    }

    #[test]
    fn entries_are_newest_first() {
        let mut store = store();
        log(&mut store, "Leg Press", 100.0, at(1, 9));
        log(&mut store, "Leg Press", 110.0, at(2, 9));
        assert_eq!(store.entries()[0].weight, 110.0);
        assert_eq!(store.last_weight("Leg Press", Profile::PRIMARY), Some(110.0));
        assert_eq!(store.recent(Profile::PRIMARY, 1).len(), 1);
    }

    #[test]
    fn progress_is_oldest_first() {
        let mut store = store();
        for (day, w) in [(1, 100.0), (2, 105.0), (3, 110.0)] {
            log(&mut store, "Chest Press", w, at(day, 9));
        }
        let weights: Vec<f64> = store
            .progress("Chest Press", Profile::PRIMARY, 2)
            .into_iter()
            .map(|(_, w)| w)
            .collect();
        assert_eq!(weights, vec![105.0, 110.0]);
    }

    #[test]
    fn failure_rate_and_rpe() {
        let mut store = store();
        store
            .append(
                Profile::PRIMARY,
                NewLogEntry {
                    rpe: Some(8),
                    ..NewLogEntry::new("Leg Curl", 50.0, true)
                },
                at(1, 9),
            )
            .unwrap();
        store
            .append(
                Profile::PRIMARY,
                NewLogEntry {
                    rpe: Some(10),
                    ..NewLogEntry::new("Leg Curl", 55.0, false)
                },
                at(2, 9),
            )
            .unwrap();
        assert!((store.failure_rate("Leg Curl", Profile::PRIMARY) - 50.0).abs() < f64::EPSILON);
        assert_eq!(store.average_rpe("Leg Curl", Profile::PRIMARY), Some(9.0));
        assert_eq!(store.failure_rate("Unknown", Profile::PRIMARY), 0.0);
        assert_eq!(store.average_rpe("Unknown", Profile::PRIMARY), None);
    }

    #[test]
    fn unique_exercises_and_personal_records() {
        let mut store = store();
        log(&mut store, "Pulldown", 90.0, at(1, 9));
        log(&mut store, "Chest Press", 120.0, at(1, 9));
        log(&mut store, "Pulldown", 95.0, at(2, 9));
        log(&mut store, "Pulldown", 85.0, at(3, 9));

        assert_eq!(
            store.unique_exercises(Profile::PRIMARY),
            vec!["Chest Press", "Pulldown"]
        );
        let prs = store.personal_records(Profile::PRIMARY);
        assert_eq!(prs["Pulldown"], 95.0);
        assert_eq!(prs["Chest Press"], 120.0);
    }

    #[test]
    fn streak_counts_back_from_today() {
        let mut store = store();
        for day in [5, 6, 7] {
            log(&mut store, "Leg Press", 100.0, at(day, 9));
        }
        let day = |d| NaiveDate::from_ymd_opt(2026, 3, d).unwrap();
        assert_eq!(store.streak(Profile::PRIMARY, day(7)), 3);
        assert_eq!(store.streak(Profile::PRIMARY, day(8)), 3, "today not done yet");
        assert_eq!(store.streak(Profile::PRIMARY, day(9)), 0, "gap of a full day");
    }

    #[test]
    fn streak_breaks_on_gap() {
        let mut store = store();
        for day in [1, 3, 4] {
            log(&mut store, "Leg Press", 100.0, at(day, 9));
        }
        let today = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        assert_eq!(store.streak(Profile::PRIMARY, today), 2);
        assert_eq!(LogStore::in_memory().streak(Profile::PRIMARY, today), 0);
    }

    #[test]
    fn summary_counts_days_and_volume() {
        let mut store = store();
        log(&mut store, "Leg Press", 100.0, at(1, 9));
        log(&mut store, "Pulldown", 80.0, at(10, 9));
        log(&mut store, "Leg Press", 120.0, at(10, 10));

        let summary = store.summary(Profile::PRIMARY, at(10, 18));
        assert_eq!(summary.streak, 1);
        assert_eq!(summary.total_workouts, 2);
        assert_eq!(summary.weekly_workouts, 1);
        assert_eq!(summary.last_workout_date, Some(at(10, 10)));
        assert_eq!(summary.last_workout_type.as_deref(), Some("workout"));
        assert!((summary.total_volume - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sets_on_uses_offset_days() {
        let mut store = LogStore::in_memory().with_offset(FixedOffset::east_opt(-5 * 3600).unwrap());
        log(&mut store, "Leg Press", 100.0, at(2, 3));
        let march_1 = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(store.sets_on(Profile::PRIMARY, march_1), 1);
    }

    #[test]
    fn csv_export_formats_row() {
        let mut store = store();
        store
            .append(
                Profile::PRIMARY,
                NewLogEntry {
                    reps: Some(10),
                    rpe: Some(9),
                    notes: Some("slow, controlled, strict".to_string()),
                    ..NewLogEntry::new("Chest Press", 100.0, true)
                },
                Utc.with_ymd_and_hms(2026, 3, 4, 7, 5, 0).unwrap(),
            )
            .unwrap();

        let csv = store.export_csv(Profile::PRIMARY);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some("2026-03-04 07:05,Chest Press,workout,100.0,10,9,true,slow; controlled; strict,133.3")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn clear_profile_keeps_other_profiles() {
        let mut store = store();
        log(&mut store, "Leg Press", 100.0, at(1, 9));
        store
            .append(
                Profile::new(2).unwrap(),
                NewLogEntry::new("Leg Press", 50.0, false),
                at(1, 9),
            )
            .unwrap();
        assert_eq!(store.clear_profile(Profile::PRIMARY).unwrap(), 1);
        assert_eq!(store.total_sets(Profile::PRIMARY), 0);
        assert_eq!(store.total_sets(Profile::new(2).unwrap()), 1);
    }

    #[test]
    fn file_roundtrip_and_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LogStore::FILE_NAME);

        let mut store = LogStore::open(&path);
        store
            .append(Profile::PRIMARY, NewLogEntry::new("Leg Press", 100.0, true), at(1, 9))
            .unwrap();
        assert_eq!(LogStore::open(&path).entries().len(), 1);

        std::fs::write(&path, b"[{\"broken\": ").unwrap();
        assert!(LogStore::open(&path).entries().is_empty());
    }
}

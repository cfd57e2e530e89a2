//! Workout session.
//!
//! Owns the phase timer for the active exercise and glues it to the
//! registry, the log and the coach. The session is synchronous: a caller
//! feeds it [`WorkoutSession::tick`] once per second (usually from a
//! [`Ticker`](crate::phase::Ticker)) and reacts to the returned
//! [`SessionStep`].
//!
//! Setting a set's flags follows one rule: entering `Complete` marks the
//! exercise completed and logs the set, unless the set was already logged
//! by hand since it started.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::coach::{Cue, CueSink};
use crate::error::{RegistryError, SessionError};
use crate::model::{Exercise, NewLogEntry, PhaseSettings, TimerPhase};
use crate::observability::metrics;
use crate::observability::{Event, EventEmitter, FinishReason};
use crate::phase::{PhaseTimer, PhaseTransition, TickOutcome};
use crate::store::templates::WorkoutTemplate;
use crate::store::{ExerciseRegistry, LogStore, LoggedSet, TemplateStore, keys};
use crate::sync::SyncClient;

/// Highest accepted rate of perceived exertion.
const MAX_RPE: u8 = 10;

/// Optional details recorded with a set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetDetails {
    pub reps: Option<u32>,
    pub rpe: Option<u8>,
    pub notes: Option<String>,
}

/// What one session call produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStep {
    /// Cues played, in order.
    pub cues: Vec<Cue>,
    /// Phase transitions taken, in order.
    pub transitions: Vec<PhaseTransition>,
    /// Set written by auto-logging.
    pub logged: Option<LoggedSet>,
    /// Why the auto-logged set could not be saved, if it could not.
    pub save_error: Option<String>,
    /// Exercise started by this call.
    pub started: Option<Uuid>,
    /// The last exercise finished and the timer stopped.
    pub workout_complete: bool,
}

impl SessionStep {
    fn merge(&mut self, other: Self) {
        self.cues.extend(other.cues);
        self.transitions.extend(other.transitions);
        self.logged = self.logged.take().or(other.logged);
        self.save_error = self.save_error.take().or(other.save_error);
        self.started = other.started.or(self.started);
        self.workout_complete |= other.workout_complete;
    }
}

/// Live state mirrored to companion displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub exercise_name: Option<String>,
    pub phase: TimerPhase,
    pub phase_name: String,
    pub time_remaining: u32,
    pub phase_duration: u32,
    pub progress: f64,
    pub is_running: bool,
    pub weight: Option<f64>,
    pub is_active: bool,
    pub next_exercise_name: Option<String>,
    pub completed_exercises: usize,
    pub total_exercises: usize,
}

/// A workout in progress.
pub struct WorkoutSession {
    registry: ExerciseRegistry,
    log: LogStore,
    templates: TemplateStore,
    timer: PhaseTimer,
    coach: Box<dyn CueSink>,
    events: Arc<EventEmitter>,
    sync: Option<SyncClient>,
    workout_type: String,
    current: Option<Uuid>,
    set_logged: bool,
    started_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for WorkoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkoutSession")
            .field("profile", &self.registry.profile())
            .field("current", &self.current)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

impl WorkoutSession {
    /// Creates an idle session.
    #[must_use]
    pub fn new(
        registry: ExerciseRegistry,
        log: LogStore,
        templates: TemplateStore,
        coach: Box<dyn CueSink>,
        events: Arc<EventEmitter>,
    ) -> Self {
        let timer = PhaseTimer::new(registry.phase_settings());
        Self {
            registry,
            log,
            templates,
            timer,
            coach,
            events,
            sync: None,
            workout_type: "workout".to_string(),
            current: None,
            set_logged: false,
            started_at: None,
        }
    }

    /// Mirrors every logged set to a webhook.
    #[must_use]
    pub fn with_sync(mut self, sync: SyncClient) -> Self {
        self.sync = Some(sync);
        self
    }

    /// Tags logged sets with a routine name ("A", "B").
    #[must_use]
    pub fn with_workout_type(mut self, workout_type: impl Into<String>) -> Self {
        self.workout_type = workout_type.into();
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub const fn registry(&self) -> &ExerciseRegistry {
        &self.registry
    }

    pub const fn registry_mut(&mut self) -> &mut ExerciseRegistry {
        &mut self.registry
    }

    #[must_use]
    pub const fn log(&self) -> &LogStore {
        &self.log
    }

    #[must_use]
    pub const fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    #[must_use]
    pub const fn timer(&self) -> &PhaseTimer {
        &self.timer
    }

    /// The exercise whose timer is active.
    #[must_use]
    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.current.and_then(|id| self.registry.find(id))
    }

    /// Whether an exercise is in progress (running or paused).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Time since the first exercise of this workout started.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.started_at
            .and_then(|start| (now - start).to_std().ok())
            .unwrap_or_default()
    }

    /// Companion state for watch and live-activity displays.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let current = self.current_exercise();
        let next = self
            .current
            .and_then(|id| self.registry.next_incomplete(Some(id)));
        SessionSnapshot {
            exercise_name: current.map(|e| e.name.clone()),
            phase: self.timer.phase(),
            phase_name: self.timer.phase().display_name().to_string(),
            time_remaining: self.timer.remaining(),
            phase_duration: self.timer.phase_duration(),
            progress: self.timer.progress(),
            is_running: self.timer.is_running(),
            weight: current.and_then(|e| e.last_weight),
            is_active: self.is_active(),
            next_exercise_name: next.map(|e| e.name.clone()),
            completed_exercises: self.registry.completed_count(),
            total_exercises: self.registry.exercises().len(),
        }
    }

    // ========================================================================
    // Timer control
    // ========================================================================

    /// Starts `id` from prep. The first start of a workout also starts the
    /// workout clock.
    ///
    /// # Errors
    ///
    /// Unknown exercise, or a persistence failure while cascading through
    /// zero-length phases.
    pub fn start_exercise(&mut self, id: Uuid) -> Result<SessionStep, SessionError> {
        let exercise = self.registry.find(id).ok_or(RegistryError::UnknownId(id))?;
        let name = exercise.name.clone();
        let negative_only = exercise.is_negative_only;
        let settings = set_settings(self.registry.phase_settings(), exercise);
        self.coach.stop();

        let now = Utc::now();
        if self.started_at.is_none() {
            self.started_at = Some(now);
            info!(profile = %self.registry.profile(), "workout started");
            self.events.emit(Event::SessionStarted {
                timestamp: now,
                profile: self.registry.profile(),
                workout: self.registry.workout().name.clone(),
                exercises: self.registry.exercises().len(),
            });
        }

        let previous = self.current.map(|_| self.timer.phase());
        self.current = Some(id);
        self.set_logged = false;
        self.timer.set_settings(settings);
        self.timer.set_negative_only(negative_only);

        info!(exercise = %name, negative_only, "exercise started");
        self.events.emit(Event::ExerciseStarted {
            timestamp: now,
            exercise: name.clone(),
        });
        metrics::set_current_phase(TimerPhase::Prep, previous);
        self.events.emit(Event::PhaseEntered {
            timestamp: now,
            exercise: name,
            phase: TimerPhase::Prep,
            duration_secs: self.timer.settings().duration(TimerPhase::Prep),
        });

        let outcome = self.timer.start(TimerPhase::Prep);
        let mut step = self.absorb(outcome)?;
        step.started = step.started.or(Some(id));
        Ok(step)
    }

    /// Abandons the current exercise and starts `id` instead, e.g. when a
    /// machine is taken.
    ///
    /// # Errors
    ///
    /// See [`Self::start_exercise`].
    pub fn switch_exercise(&mut self, id: Uuid) -> Result<SessionStep, SessionError> {
        debug!(from = ?self.current, to = %id, "switching exercise");
        self.start_exercise(id)
    }

    /// Repeats the current exercise from prep.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoActiveExercise`] when nothing is active.
    pub fn another_set(&mut self) -> Result<SessionStep, SessionError> {
        let id = self.current.ok_or(SessionError::NoActiveExercise)?;
        self.start_exercise(id)
    }

    /// Advances the timer by one second. Does nothing unless running.
    ///
    /// An auto-logged set that cannot be written is logged as a warning and
    /// kept in memory; the timer carries on into rest.
    ///
    /// # Errors
    ///
    /// An unknown exercise while starting the next one.
    pub fn tick(&mut self) -> Result<SessionStep, SessionError> {
        if !self.timer.is_running() {
            return Ok(SessionStep::default());
        }
        metrics::record_tick();
        let outcome = self.timer.tick();
        self.absorb(outcome)
    }

    /// Returns whether the timer was running.
    pub fn pause(&mut self) -> bool {
        self.timer.pause()
    }

    /// Returns whether the timer was paused.
    pub fn resume(&mut self) -> bool {
        self.timer.resume()
    }

    /// Pauses a running timer or resumes a paused one. Returns whether the
    /// timer is now running.
    pub fn toggle(&mut self) -> bool {
        if !self.timer.pause() {
            self.timer.resume();
        }
        self.timer.is_running()
    }

    /// Jumps to the next phase. Skipping rest starts the next exercise.
    ///
    /// # Errors
    ///
    /// See [`Self::tick`].
    pub fn skip_phase(&mut self) -> Result<SessionStep, SessionError> {
        self.coach.stop();
        let outcome = self.timer.skip();
        self.absorb(outcome)
    }

    /// Ends rest early and moves on.
    ///
    /// # Errors
    ///
    /// See [`Self::start_exercise`].
    pub fn skip_rest(&mut self) -> Result<SessionStep, SessionError> {
        self.coach.stop();
        self.timer.stop();
        self.start_next()
    }

    /// Restores the full duration of the current phase, paused.
    pub fn reset_phase(&mut self) {
        self.timer.reset_phase();
    }

    /// Stops the timer and clears the active exercise.
    pub fn stop(&mut self) {
        self.timer.stop();
        self.coach.stop();
        self.current = None;
    }

    // ========================================================================
    // Logging
    // ========================================================================

    /// Logs a set for the active exercise.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoActiveExercise`], invalid input, or a persistence
    /// failure.
    pub fn log_set(
        &mut self,
        weight: f64,
        reached_failure: bool,
        details: SetDetails,
    ) -> Result<LoggedSet, SessionError> {
        let id = self.current.ok_or(SessionError::NoActiveExercise)?;
        self.log_set_for(id, weight, reached_failure, details)
    }

    /// Records the result on the exercise, marks it completed and appends
    /// it to the log.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidWeight`] for negative or non-finite weights,
    /// [`SessionError::InvalidRpe`] outside 1-10, an unknown exercise, or
    /// a persistence failure.
    pub fn log_set_for(
        &mut self,
        id: Uuid,
        weight: f64,
        reached_failure: bool,
        details: SetDetails,
    ) -> Result<LoggedSet, SessionError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(SessionError::InvalidWeight(weight));
        }
        if let Some(rpe) = details.rpe.filter(|r| !(1..=MAX_RPE).contains(r)) {
            return Err(SessionError::InvalidRpe(rpe));
        }

        self.registry.record_result(id, weight, reached_failure)?;
        self.registry.mark_completed(id, true)?;
        let name = self
            .registry
            .find(id)
            .map(|e| e.name.clone())
            .ok_or(RegistryError::UnknownId(id))?;

        let entry = NewLogEntry {
            workout_type: self.workout_type.clone(),
            reps: details.reps,
            rpe: details.rpe,
            notes: details.notes.filter(|n| !n.trim().is_empty()),
            ..NewLogEntry::new(name, weight, reached_failure)
        };
        self.write_log(id, entry)
    }

    /// Logs every completed exercise that has no log entry yet, using its
    /// last recorded weight.
    ///
    /// # Errors
    ///
    /// Stops at the first persistence failure.
    pub fn log_all_completed(&mut self) -> Result<Vec<LoggedSet>, SessionError> {
        let pending: Vec<Exercise> = self
            .registry
            .exercises()
            .iter()
            .filter(|e| e.is_completed && !e.is_logged)
            .cloned()
            .collect();

        let mut logged = Vec::with_capacity(pending.len());
        for exercise in pending {
            let entry = NewLogEntry {
                workout_type: self.workout_type.clone(),
                ..NewLogEntry::new(
                    exercise.name,
                    exercise.last_weight.unwrap_or(0.0),
                    exercise.reached_failure,
                )
            };
            logged.push(self.write_log(exercise.id, entry)?);
        }
        Ok(logged)
    }

    fn write_log(&mut self, id: Uuid, entry: NewLogEntry) -> Result<LoggedSet, SessionError> {
        let (logged, persisted) = self.record_log(id, entry);
        persisted.map(|()| logged)
    }

    /// Adds `entry` to the history and does the bookkeeping for a logged
    /// set. Every step runs even when a write fails; the first write failure
    /// is returned next to the set.
    fn record_log(
        &mut self,
        id: Uuid,
        entry: NewLogEntry,
    ) -> (LoggedSet, Result<(), SessionError>) {
        let profile = self.registry.profile();
        let previous_best = self.log.max_weight(&entry.exercise_name, profile);
        let now = Utc::now();

        let logged = self.log.record(profile, entry, now);
        let saved = self.log.save().map_err(SessionError::from);
        let marked = self
            .registry
            .mark_logged(id, true)
            .map_err(SessionError::from);
        if self.current == Some(id) {
            self.set_logged = true;
        }

        let e = &logged.entry;
        info!(
            exercise = %e.exercise_name,
            weight = e.weight,
            failure = e.reached_failure,
            pr = logged.is_personal_record,
            "set logged"
        );
        metrics::record_set_logged(logged.is_personal_record);
        self.events.emit(Event::SetLogged {
            timestamp: now,
            exercise: e.exercise_name.clone(),
            weight: e.weight,
            reached_failure: e.reached_failure,
            personal_record: logged.is_personal_record,
        });
        if logged.is_personal_record {
            self.events.emit(Event::PersonalRecord {
                timestamp: now,
                exercise: e.exercise_name.clone(),
                weight: e.weight,
                previous_best,
            });
            self.play(Cue::PersonalRecord);
        }
        if let Some(sync) = &self.sync {
            sync.push(e);
        }

        let published = self.publish_summary(now);
        (logged, saved.and(marked).and(published))
    }

    /// Stores the widget summary and last workout date for companions.
    fn publish_summary(&self, now: DateTime<Utc>) -> Result<(), SessionError> {
        let profile = self.registry.profile();
        let store = self.registry.store();
        store.set_as(keys::WIDGET_SUMMARY, &self.log.summary(profile, now))?;
        store.set_as(&keys::last_workout_date(profile), &now)?;
        Ok(())
    }

    // ========================================================================
    // Workout lifecycle
    // ========================================================================

    /// Marks `id` done without logging a set.
    ///
    /// # Errors
    ///
    /// Unknown exercise or a persistence failure.
    pub fn skip_exercise(&mut self, id: Uuid) -> Result<(), SessionError> {
        self.registry.skip_exercise(id)?;
        Ok(())
    }

    /// Ends the workout, clearing checkmarks but keeping weights. Returns
    /// how long the workout ran.
    ///
    /// # Errors
    ///
    /// Returns a persistence failure.
    pub fn finish_workout(&mut self) -> Result<Duration, SessionError> {
        let total = self.registry.exercises().len();
        let completed = self.registry.completed_count();
        let reason = if total > 0 && completed == total {
            FinishReason::Completed
        } else {
            FinishReason::Finished
        };

        self.stop();
        self.registry.finish_workout()?;
        let duration = self.end_clock(reason, completed);
        info!(completed, total, secs = duration.as_secs(), "workout finished");
        Ok(duration)
    }

    /// Records an interrupted workout without touching progress.
    pub fn interrupt(&mut self, reason: FinishReason) {
        let completed = self.registry.completed_count();
        self.stop();
        let duration = self.end_clock(reason, completed);
        info!(?reason, secs = duration.as_secs(), "workout interrupted");
    }

    fn end_clock(&mut self, reason: FinishReason, completed: usize) -> Duration {
        let now = Utc::now();
        let duration = self.elapsed(now);
        self.started_at = None;
        self.events.emit(Event::WorkoutFinished {
            timestamp: now,
            reason,
            completed_exercises: completed,
            duration_secs: duration.as_secs(),
        });
        duration
    }

    /// Throws away all results and restores the built-in workout.
    ///
    /// # Errors
    ///
    /// Returns a persistence failure.
    pub fn reset_workout(&mut self) -> Result<(), SessionError> {
        self.stop();
        self.started_at = None;
        self.registry.reset_workout()?;
        Ok(())
    }

    /// Replaces the workout with a saved template and stamps it as used.
    ///
    /// # Errors
    ///
    /// Unknown template or a persistence failure.
    pub fn load_template(&mut self, name: &str) -> Result<WorkoutTemplate, SessionError> {
        let profile = self.registry.profile();
        let template = self.templates.find(profile, name)?;
        self.stop();
        self.registry.load_exercises(template.to_exercises())?;
        self.templates.mark_used(profile, &template.name, Utc::now())?;
        Ok(template)
    }

    /// Rebuilds the workout from the sets logged on `day`. Returns the
    /// number of exercises loaded; a day without sets changes nothing.
    ///
    /// # Errors
    ///
    /// Returns a persistence failure.
    pub fn repeat_day(&mut self, day: NaiveDate) -> Result<usize, SessionError> {
        let profile = self.registry.profile();
        let entries: Vec<_> = self
            .log
            .entries_for_profile(profile)
            .filter(|e| self.log.day_of(e.date) == day)
            .collect();
        if entries.is_empty() {
            return Ok(0);
        }
        let exercises =
            WorkoutTemplate::from_log_entries("", profile, &entries, Utc::now()).to_exercises();
        let count = exercises.len();
        self.stop();
        self.registry.load_exercises(exercises)?;
        Ok(count)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn play(&mut self, cue: Cue) {
        self.coach.play(&cue);
        self.events.emit(Event::CueEmitted {
            timestamp: Utc::now(),
            cue,
        });
    }

    /// Plays a timer outcome and reacts to completion and end of rest.
    fn absorb(&mut self, outcome: TickOutcome) -> Result<SessionStep, SessionError> {
        let TickOutcome {
            cues,
            transitions,
            rest_finished,
        } = outcome;
        let mut step = SessionStep::default();

        for cue in &cues {
            self.play(*cue);
        }
        step.cues = cues;

        let exercise = self.current_exercise().map(|e| e.name.clone()).unwrap_or_default();
        for t in &transitions {
            metrics::record_phase_transition(t.from, t.to);
            self.events.emit(Event::PhaseEntered {
                timestamp: Utc::now(),
                exercise: exercise.clone(),
                phase: t.to,
                duration_secs: self.timer.settings().duration(t.to),
            });
        }
        let completed = transitions.iter().any(|t| t.to == TimerPhase::Complete);
        step.transitions = transitions;

        if completed {
            if let Some((logged, save_error)) = self.complete_current()? {
                if logged.is_personal_record {
                    step.cues.push(Cue::PersonalRecord);
                }
                step.logged = Some(logged);
                step.save_error = save_error;
            }
        }
        if rest_finished {
            let next = self.start_next()?;
            step.merge(next);
        }
        Ok(step)
    }

    /// Marks the current exercise done and auto-logs it. A set that cannot
    /// be saved comes back with the reason.
    fn complete_current(
        &mut self,
    ) -> Result<Option<(LoggedSet, Option<String>)>, SessionError> {
        let Some(id) = self.current else {
            return Ok(None);
        };
        if let Err(error) = self.registry.mark_completed(id, true) {
            warn!(%id, %error, "could not save completion");
        }
        if self.set_logged {
            debug!(%id, "set already logged, skipping auto-log");
            return Ok(None);
        }
        let Some(exercise) = self.registry.find(id).cloned() else {
            return Ok(None);
        };
        let entry = NewLogEntry {
            workout_type: self.workout_type.clone(),
            duration: Some(self.timer.working_time()),
            ..NewLogEntry::new(
                exercise.name,
                exercise.last_weight.unwrap_or(0.0),
                exercise.reached_failure,
            )
        };
        let (logged, persisted) = self.record_log(id, entry);
        let save_error = persisted.err().map(|error| {
            warn!(
                exercise = %logged.entry.exercise_name,
                %error,
                "auto-logged set was not saved"
            );
            error.to_string()
        });
        Ok(Some((logged, save_error)))
    }

    fn start_next(&mut self) -> Result<SessionStep, SessionError> {
        let next = self.registry.next_incomplete(self.current).map(|e| e.id);
        if let Some(id) = next {
            return self.start_exercise(id);
        }

        info!("all exercises complete");
        let mut step = SessionStep {
            workout_complete: true,
            ..SessionStep::default()
        };
        for cue in [Cue::WorkoutComplete, Cue::WorkoutCrushed] {
            self.play(cue);
            step.cues.push(cue);
        }
        self.timer.stop();
        self.current = None;
        Ok(step)
    }
}

/// Phase durations for one set of `exercise`. A negative-only exercise
/// with a recorded duration holds its eccentric for that long.
fn set_settings(mut settings: PhaseSettings, exercise: &Exercise) -> PhaseSettings {
    if exercise.is_negative_only {
        if let Some(seconds) = exercise.last_duration {
            let range = TimerPhase::Eccentric.duration_range();
            settings.set_duration(
                TimerPhase::Eccentric,
                seconds.clamp(*range.start(), *range.end()),
            );
        }
    }
    settings
}

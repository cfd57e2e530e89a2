//! Structured session event stream.
//!
//! Each event is one JSON line carrying a monotonically increasing
//! `sequence`, so a companion display or a test harness can follow a
//! session without scraping log output.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::coach::Cue;
use crate::model::{Profile, TimerPhase};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// How a workout came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Every exercise was completed.
    Completed,
    /// The user finished early.
    Finished,
    /// Interrupted by SIGINT.
    Interrupted,
    /// Terminated by SIGTERM.
    Terminated,
}

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a workout session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A session began.
    SessionStarted {
        timestamp: DateTime<Utc>,
        profile: Profile,
        workout: String,
        exercises: usize,
    },

    /// An exercise's timer started from prep.
    ExerciseStarted {
        timestamp: DateTime<Utc>,
        exercise: String,
    },

    /// The timer entered a phase.
    PhaseEntered {
        timestamp: DateTime<Utc>,
        exercise: String,
        phase: TimerPhase,
        duration_secs: u32,
    },

    /// A coaching cue was played.
    CueEmitted {
        timestamp: DateTime<Utc>,
        cue: Cue,
    },

    /// A set was written to the log.
    SetLogged {
        timestamp: DateTime<Utc>,
        exercise: String,
        weight: f64,
        reached_failure: bool,
        personal_record: bool,
    },

    /// A logged set beat the previous best.
    PersonalRecord {
        timestamp: DateTime<Utc>,
        exercise: String,
        weight: f64,
        previous_best: Option<f64>,
    },

    /// The workout ended.
    WorkoutFinished {
        timestamp: DateTime<Utc>,
        reason: FinishReason,
        completed_exercises: usize,
        duration_secs: u64,
    },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Serialization and I/O failures are dropped; the event stream must never
/// interrupt a workout.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

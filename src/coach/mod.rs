//! Audio coaching
//!
//! The phase timer produces [`Cue`] values; a [`CueSink`] turns them into
//! sound. Playback is fire-and-forget: sinks never report failures back to
//! the timer.
//!
//! - [`VoiceCoach`]: maps cues to commander audio assets with a speech fallback
//! - [`speaker`]: process-spawning and terminal speakers

pub mod speaker;
pub mod voice;

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::model::TimerPhase;

pub use speaker::{CommandSpeaker, Speaker};
pub use voice::{Voice, VoiceCoach};

/// Haptic pulse strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Haptic {
    Medium,
    Heavy,
}

/// A coaching cue emitted by the timer or the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum Cue {
    /// A phase was entered.
    PhaseStarted { phase: TimerPhase },
    /// A spoken countdown number.
    Countdown { seconds: u32, rest: bool },
    /// A random motivational line.
    Encouragement,
    /// Rest has begun.
    RestStarting,
    /// Rest is ending soon.
    RestGetReady,
    /// The last exercise is done.
    WorkoutComplete,
    /// Follow-up to [`Cue::WorkoutComplete`].
    WorkoutCrushed,
    /// A new personal record was logged.
    PersonalRecord,
    /// Vibration pulse.
    Haptic { strength: Haptic },
}

impl Cue {
    /// Text spoken when no audio asset is available.
    #[must_use]
    pub fn speech_text(&self) -> String {
        match self {
            Self::PhaseStarted { phase } => phase.label().to_string(),
            Self::Countdown { seconds, .. } => seconds.to_string(),
            Self::Encouragement => "Keep going".to_string(),
            Self::RestStarting => "Rest starting".to_string(),
            Self::RestGetReady => "Get ready for the next exercise".to_string(),
            Self::WorkoutComplete => "Workout complete! Amazing job!".to_string(),
            Self::WorkoutCrushed => "You crushed it!".to_string(),
            Self::PersonalRecord => "New personal record!".to_string(),
            Self::Haptic { .. } => String::new(),
        }
    }

    /// Whether the cue is a vibration rather than a sound.
    #[must_use]
    pub const fn is_haptic(&self) -> bool {
        matches!(self, Self::Haptic { .. })
    }
}

/// Consumer of coaching cues.
pub trait CueSink: Send {
    /// Plays (or otherwise renders) a cue. Must not block the tick loop.
    fn play(&mut self, cue: &Cue);

    /// Cuts off anything still playing, e.g. before the next phase cue.
    fn stop(&mut self) {}
}

/// Sink used when coaching is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCoach;

impl CueSink for SilentCoach {
    fn play(&mut self, _cue: &Cue) {}
}

/// Sink that records every cue, for dry runs and tests.
#[derive(Debug, Default, Clone)]
pub struct CueRecorder(Arc<Mutex<Vec<Cue>>>);

impl CueRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every cue recorded so far.
    #[must_use]
    pub fn cues(&self) -> Vec<Cue> {
        self.0.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Discards recorded cues.
    pub fn clear(&self) {
        if let Ok(mut cues) = self.0.lock() {
            cues.clear();
        }
    }
}

impl CueSink for CueRecorder {
    fn play(&mut self, cue: &Cue) {
        if let Ok(mut cues) = self.0.lock() {
            cues.push(*cue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_serializes_with_tag() {
        let json = serde_json::to_value(Cue::Countdown {
            seconds: 5,
            rest: true,
        })
        .unwrap();
        assert_eq!(json["cue"], "countdown");
        assert_eq!(json["seconds"], 5);
        assert_eq!(json["rest"], true);

        let json = serde_json::to_value(Cue::PhaseStarted {
            phase: TimerPhase::FinalEccentric,
        })
        .unwrap();
        assert_eq!(json["phase"], "final_eccentric");
    }

    #[test]
    fn speech_text_for_phase_uses_label() {
        let cue = Cue::PhaseStarted {
            phase: TimerPhase::Positioning,
        };
        assert_eq!(cue.speech_text(), "Get Into Position");
    }

    #[test]
    fn recorder_shares_state_between_clones() {
        let recorder = CueRecorder::new();
        let mut sink = recorder.clone();
        sink.play(&Cue::RestStarting);
        sink.play(&Cue::Encouragement);
        assert_eq!(recorder.cues(), vec![Cue::RestStarting, Cue::Encouragement]);

        recorder.clear();
        assert!(recorder.cues().is_empty());
    }
}

//! Voice selection and asset resolution.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::speaker::Speaker;
use super::{Cue, CueSink};

/// Encouragement assets, picked at random.
pub const ENCOURAGEMENTS: [&str; 14] = [
    "enc_doing_great",
    "enc_keep_going",
    "enc_almost_there",
    "enc_stay_strong",
    "enc_push_through",
    "enc_you_got_this",
    "enc_excellent_form",
    "enc_perfect",
    "enc_fantastic",
    "enc_thats_it",
    "enc_well_done",
    "enc_great_work",
    "enc_one_more",
    "enc_strong_finish",
];

/// File extensions tried for commander assets, in order.
const ASSET_EXTENSIONS: [&str; 3] = ["mp3", "m4a", "wav"];

/// Coaching voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    /// Pre-recorded drill-sergeant clips, with speech fallback.
    #[default]
    Commander,
    /// Synthesized male voice.
    Male,
    /// Synthesized female voice.
    Female,
    /// Synthesized robotic voice.
    Digital,
}

/// Converts an asset stem such as `enc_keep_going` into speakable text.
#[must_use]
pub fn stem_to_text(stem: &str) -> String {
    let words = stem.split_once('_').map_or(stem, |(_, rest)| rest);
    let spaced = words.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// [`CueSink`] that resolves cues to audio assets for a [`Voice`].
pub struct VoiceCoach {
    voice: Voice,
    asset_dir: PathBuf,
    speaker: Box<dyn Speaker>,
}

impl std::fmt::Debug for VoiceCoach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceCoach")
            .field("voice", &self.voice)
            .field("asset_dir", &self.asset_dir)
            .finish_non_exhaustive()
    }
}

impl VoiceCoach {
    /// Creates a coach speaking through `speaker`.
    #[must_use]
    pub fn new(voice: Voice, asset_dir: impl Into<PathBuf>, speaker: Box<dyn Speaker>) -> Self {
        Self {
            voice,
            asset_dir: asset_dir.into(),
            speaker,
        }
    }

    /// The selected voice.
    #[must_use]
    pub const fn voice(&self) -> Voice {
        self.voice
    }

    /// Asset stem and fallback text for a cue. Haptics have no audio.
    #[must_use]
    pub fn resolve(cue: &Cue) -> Option<(String, String)> {
        let stem = match cue {
            Cue::PhaseStarted { phase } => phase.audio_file().to_string(),
            Cue::Countdown { seconds: 30, rest: true } => "rest_30_sec".to_string(),
            Cue::Countdown { seconds, .. } => format!("num_{seconds}"),
            Cue::Encouragement => {
                let stem = ENCOURAGEMENTS
                    .choose(&mut rand::rng())
                    .copied()
                    .unwrap_or("enc_great_work");
                return Some((stem.to_string(), stem_to_text(stem)));
            }
            Cue::RestStarting => "rest_starting".to_string(),
            Cue::RestGetReady => "rest_get_ready".to_string(),
            Cue::WorkoutComplete => "workout_complete".to_string(),
            Cue::WorkoutCrushed => "workout_crushed".to_string(),
            Cue::PersonalRecord => "pr_celebration".to_string(),
            Cue::Haptic { .. } => return None,
        };
        Some((stem, cue.speech_text()))
    }

    /// Finds the first existing asset file for `stem`.
    #[must_use]
    pub fn find_asset(dir: &Path, stem: &str) -> Option<PathBuf> {
        ASSET_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{stem}.{ext}")))
            .find(|p| p.is_file())
    }
}

impl CueSink for VoiceCoach {
    fn play(&mut self, cue: &Cue) {
        let Some((stem, text)) = Self::resolve(cue) else {
            trace!(?cue, "haptic cue");
            return;
        };

        if self.voice == Voice::Commander {
            if let Some(path) = Self::find_asset(&self.asset_dir, &stem) {
                self.speaker.play_file(&path);
                return;
            }
            debug!(%stem, "commander asset missing, using speech");
        }
        self.speaker.speak(&text);
    }

    fn stop(&mut self) {
        self.speaker.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::model::TimerPhase;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Played {
        File(PathBuf),
        Speech(String),
    }

    #[derive(Clone, Default)]
    struct FakeSpeaker(Arc<Mutex<Vec<Played>>>);

    impl Speaker for FakeSpeaker {
        fn play_file(&mut self, path: &Path) {
            self.0.lock().unwrap().push(Played::File(path.to_path_buf()));
        }

        fn speak(&mut self, text: &str) {
            self.0.lock().unwrap().push(Played::Speech(text.to_string()));
        }
    }

    #[test]
    fn stem_to_text_drops_category_prefix() {
        assert_eq!(stem_to_text("enc_keep_going"), "Keep going");
        assert_eq!(stem_to_text("rest_get_ready"), "Get ready");
        assert_eq!(stem_to_text("plain"), "Plain");
        assert_eq!(stem_to_text(""), "");
    }

    #[test]
    fn resolve_countdown_stems() {
        let (stem, text) = VoiceCoach::resolve(&Cue::Countdown {
            seconds: 5,
            rest: false,
        })
        .unwrap();
        assert_eq!(stem, "num_5");
        assert_eq!(text, "5");

        let (stem, _) = VoiceCoach::resolve(&Cue::Countdown {
            seconds: 30,
            rest: true,
        })
        .unwrap();
        assert_eq!(stem, "rest_30_sec");
    }

    #[test]
    fn resolve_encouragement_from_known_set() {
        let (stem, _) = VoiceCoach::resolve(&Cue::Encouragement).unwrap();
        assert!(ENCOURAGEMENTS.contains(&stem.as_str()));
    }

    #[test]
    fn haptics_have_no_audio() {
        assert!(VoiceCoach::resolve(&Cue::Haptic {
            strength: crate::coach::Haptic::Heavy
        })
        .is_none());
    }

    #[test]
    fn commander_plays_existing_asset() {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("phase_rest.m4a");
        std::fs::write(&asset, b"fake").unwrap();

        let speaker = FakeSpeaker::default();
        let mut coach = VoiceCoach::new(Voice::Commander, dir.path(), Box::new(speaker.clone()));
        coach.play(&Cue::PhaseStarted {
            phase: TimerPhase::Rest,
        });

        assert_eq!(*speaker.0.lock().unwrap(), vec![Played::File(asset)]);
    }

    #[test]
    fn commander_falls_back_to_speech() {
        let dir = tempfile::tempdir().unwrap();
        let speaker = FakeSpeaker::default();
        let mut coach = VoiceCoach::new(Voice::Commander, dir.path(), Box::new(speaker.clone()));
        coach.play(&Cue::PhaseStarted {
            phase: TimerPhase::Prep,
        });

        assert_eq!(
            *speaker.0.lock().unwrap(),
            vec![Played::Speech("Get Ready".to_string())]
        );
    }

    #[test]
    fn synthesized_voice_ignores_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("num_3.mp3"), b"fake").unwrap();

        let speaker = FakeSpeaker::default();
        let mut coach = VoiceCoach::new(Voice::Female, dir.path(), Box::new(speaker.clone()));
        coach.play(&Cue::Countdown {
            seconds: 3,
            rest: false,
        });

        assert_eq!(
            *speaker.0.lock().unwrap(),
            vec![Played::Speech("3".to_string())]
        );
    }
}

//! Configuration file schema.
//!
//! Every section is optional; an empty file yields the built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coach::Voice;
use crate::model::{PhaseSettings, TimerPhase};
use crate::workout::ExperienceLevel;

/// Root of `onerep.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub profile: ProfileConfig,
    pub phases: PhasesConfig,
    pub coach: CoachConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncConfig>,
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding `settings.json` and `workout_logs.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// Profile used when none is stored or given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<u8>,
    pub experience: ExperienceLevel,
}

// ============================================================================
// Phases
// ============================================================================

/// A duration written as whole seconds (`90`) or humantime (`"1m30s"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    /// Whole seconds, or a description of why the value is unreadable.
    ///
    /// # Errors
    ///
    /// Returns the parser message for malformed text and rejects
    /// sub-second remainders.
    pub fn as_secs(&self) -> Result<u64, String> {
        match self {
            Self::Seconds(s) => Ok(*s),
            Self::Text(text) => {
                let parsed: Duration =
                    humantime::parse_duration(text.trim()).map_err(|e| e.to_string())?;
                if parsed.subsec_nanos() != 0 {
                    return Err("durations must be whole seconds".to_string());
                }
                Ok(parsed.as_secs())
            }
        }
    }
}

/// Phase duration overrides. Unset phases keep their stored or built-in
/// value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhasesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prep: Option<DurationValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positioning: Option<DurationValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eccentric: Option<DurationValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concentric: Option<DurationValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_eccentric: Option<DurationValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest: Option<DurationValue>,
}

impl PhasesConfig {
    /// Configurable phases paired with their override, in phase order.
    #[must_use]
    pub fn entries(&self) -> [(TimerPhase, Option<&DurationValue>); 6] {
        [
            (TimerPhase::Prep, self.prep.as_ref()),
            (TimerPhase::Positioning, self.positioning.as_ref()),
            (TimerPhase::Eccentric, self.eccentric.as_ref()),
            (TimerPhase::Concentric, self.concentric.as_ref()),
            (TimerPhase::FinalEccentric, self.final_eccentric.as_ref()),
            (TimerPhase::Rest, self.rest.as_ref()),
        ]
    }

    /// Whether any override is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, v)| v.is_none())
    }

    /// Applies the overrides on top of `base`. Unreadable values are
    /// skipped; validation reports them.
    #[must_use]
    pub fn apply(&self, base: PhaseSettings) -> PhaseSettings {
        let mut settings = base;
        for (phase, value) in self.entries() {
            if let Some(secs) = value
                .and_then(|v| v.as_secs().ok())
                .and_then(|s| u32::try_from(s).ok())
            {
                settings.set_duration(phase, secs);
            }
        }
        settings
    }
}

// ============================================================================
// Coach
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoachConfig {
    pub enabled: bool,
    pub voice: Voice,
    /// Directory searched for `<stem>.mp3|m4a|wav` assets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_dir: Option<PathBuf>,
    /// Audio player command line; `{file}` is replaced by the asset path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    /// Speech command line; `{text}` is replaced by the phrase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<String>,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            voice: Voice::default(),
            asset_dir: None,
            player: None,
            speech: None,
        }
    }
}

// ============================================================================
// Sync
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    pub webhook_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<DurationValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_is_default() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.coach.enabled);
        assert!(config.phases.is_empty());
    }

    #[test]
    fn durations_accept_ints_and_humantime() {
        let yaml = "phases:\n  rest: 1m30s\n  prep: 5\n  eccentric: \"45s\"\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let settings = config.phases.apply(PhaseSettings::default());
        assert_eq!(settings.rest_duration, 90);
        assert_eq!(settings.prep_duration, 5);
        assert_eq!(settings.eccentric_duration, 45);
        assert_eq!(
            settings.concentric_duration,
            TimerPhase::Concentric.default_duration()
        );
    }

    #[test]
    fn sub_second_durations_rejected() {
        let value = DurationValue::Text("1500ms".to_string());
        assert!(value.as_secs().is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<AppConfig, _> = serde_yaml::from_str("coach:\n  volume: 11\n");
        assert!(result.is_err());
    }

    #[test]
    fn coach_section_parses() {
        let yaml = "coach:\n  voice: female\n  speech: \"say {text}\"\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.coach.voice, Voice::Female);
        assert_eq!(config.coach.speech.as_deref(), Some("say {text}"));
    }
}

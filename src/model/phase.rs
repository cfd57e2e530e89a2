//! Timer phases and their configured durations.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Longest configurable timed phase, in seconds.
pub const MAX_TIMED_SECS: u32 = 600;

/// Longest configurable rest, in seconds.
pub const MAX_REST_SECS: u32 = 1800;

/// A named, timed segment of one repetition cycle.
///
/// Variants are declared in execution order; [`TimerPhase::successor`]
/// walks that order and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// Countdown before the set.
    Prep,
    /// Settle into the machine.
    Positioning,
    /// Slow lowering.
    Eccentric,
    /// Slow lifting.
    Concentric,
    /// Last lowering to failure.
    FinalEccentric,
    /// Zero-length marker between the work and the rest.
    Complete,
    /// Recovery before the next exercise.
    Rest,
}

impl TimerPhase {
    /// Every phase in execution order.
    pub const ALL: [Self; 7] = [
        Self::Prep,
        Self::Positioning,
        Self::Eccentric,
        Self::Concentric,
        Self::FinalEccentric,
        Self::Complete,
        Self::Rest,
    ];

    /// The phase that follows this one, or `None` after rest.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Prep => Some(Self::Positioning),
            Self::Positioning => Some(Self::Eccentric),
            Self::Eccentric => Some(Self::Concentric),
            Self::Concentric => Some(Self::FinalEccentric),
            Self::FinalEccentric => Some(Self::Complete),
            Self::Complete => Some(Self::Rest),
            Self::Rest => None,
        }
    }

    /// Built-in duration in seconds.
    #[must_use]
    pub const fn default_duration(self) -> u32 {
        match self {
            Self::Prep => 10,
            Self::Positioning => 5,
            Self::Eccentric => 30,
            Self::Concentric => 20,
            Self::FinalEccentric => 40,
            Self::Complete => 0,
            Self::Rest => 90,
        }
    }

    /// Spoken label, also the fallback speech text for the phase cue.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Prep => "Get Ready",
            Self::Positioning => "Get Into Position",
            Self::Eccentric => "Eccentric",
            Self::Concentric => "Concentric",
            Self::FinalEccentric => "Final Eccentric",
            Self::Complete => "Complete",
            Self::Rest => "Rest",
        }
    }

    /// Short name for compact status displays.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Prep => "Get Ready",
            Self::Positioning => "Position",
            Self::Eccentric => "Lower",
            Self::Concentric => "Push",
            Self::FinalEccentric => "Final Negative",
            Self::Complete => "Complete",
            Self::Rest => "Rest",
        }
    }

    /// Audio asset stem for the commander voice.
    #[must_use]
    pub const fn audio_file(self) -> &'static str {
        match self {
            Self::Prep => "phase_get_ready",
            Self::Positioning => "phase_position",
            Self::Eccentric => "phase_eccentric",
            Self::Concentric => "phase_concentric",
            Self::FinalEccentric => "phase_final_eccentric",
            Self::Complete => "phase_complete",
            Self::Rest => "phase_rest",
        }
    }

    /// Colour tag used by status renderers.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Prep | Self::Positioning => "gray",
            Self::Eccentric => "blue",
            Self::Concentric => "green",
            Self::FinalEccentric => "orange",
            Self::Complete => "gold",
            Self::Rest => "purple",
        }
    }

    /// Seconds a user may configure for this phase.
    #[must_use]
    pub const fn duration_range(self) -> RangeInclusive<u32> {
        match self {
            Self::Complete => 0..=0,
            Self::Rest => 0..=MAX_REST_SECS,
            _ => 1..=MAX_TIMED_SECS,
        }
    }

    /// Whether the phase is one of the three timed working phases.
    #[must_use]
    pub const fn is_working(self) -> bool {
        matches!(self, Self::Eccentric | Self::Concentric | Self::FinalEccentric)
    }
}

impl std::fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// User-configured phase durations, in seconds.
///
/// `Complete` is not configurable and always lasts zero seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhaseSettings {
    /// Prep countdown.
    pub prep_duration: u32,
    /// Positioning countdown.
    pub positioning_duration: u32,
    /// Eccentric countdown.
    pub eccentric_duration: u32,
    /// Concentric countdown.
    pub concentric_duration: u32,
    /// Final eccentric countdown.
    pub final_eccentric_duration: u32,
    /// Rest countdown.
    pub rest_duration: u32,
}

impl Default for PhaseSettings {
    fn default() -> Self {
        Self {
            prep_duration: TimerPhase::Prep.default_duration(),
            positioning_duration: TimerPhase::Positioning.default_duration(),
            eccentric_duration: TimerPhase::Eccentric.default_duration(),
            concentric_duration: TimerPhase::Concentric.default_duration(),
            final_eccentric_duration: TimerPhase::FinalEccentric.default_duration(),
            rest_duration: TimerPhase::Rest.default_duration(),
        }
    }
}

impl PhaseSettings {
    /// Configured duration of `phase` in seconds.
    #[must_use]
    pub const fn duration(&self, phase: TimerPhase) -> u32 {
        match phase {
            TimerPhase::Prep => self.prep_duration,
            TimerPhase::Positioning => self.positioning_duration,
            TimerPhase::Eccentric => self.eccentric_duration,
            TimerPhase::Concentric => self.concentric_duration,
            TimerPhase::FinalEccentric => self.final_eccentric_duration,
            TimerPhase::Complete => 0,
            TimerPhase::Rest => self.rest_duration,
        }
    }

    /// Overrides one phase's duration. Setting `Complete` is ignored.
    pub const fn set_duration(&mut self, phase: TimerPhase, seconds: u32) {
        match phase {
            TimerPhase::Prep => self.prep_duration = seconds,
            TimerPhase::Positioning => self.positioning_duration = seconds,
            TimerPhase::Eccentric => self.eccentric_duration = seconds,
            TimerPhase::Concentric => self.concentric_duration = seconds,
            TimerPhase::FinalEccentric => self.final_eccentric_duration = seconds,
            TimerPhase::Complete => {}
            TimerPhase::Rest => self.rest_duration = seconds,
        }
    }

    /// Total seconds of one set, prep through final eccentric.
    #[must_use]
    pub const fn working_time(&self) -> u32 {
        self.prep_duration
            .saturating_add(self.positioning_duration)
            .saturating_add(self.eccentric_duration)
            .saturating_add(self.concentric_duration)
            .saturating_add(self.final_eccentric_duration)
    }

    /// Pulls every duration into its [`TimerPhase::duration_range`].
    #[must_use]
    pub fn clamped(mut self) -> Self {
        for phase in TimerPhase::ALL {
            let range = phase.duration_range();
            let seconds = self.duration(phase).clamp(*range.start(), *range.end());
            self.set_duration(phase, seconds);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_chain_follows_declaration_order() {
        for pair in TimerPhase::ALL.windows(2) {
            assert_eq!(pair[0].successor(), Some(pair[1]));
        }
        assert_eq!(TimerPhase::Rest.successor(), None);
    }

    #[test]
    fn complete_is_always_zero() {
        let mut settings = PhaseSettings::default();
        settings.set_duration(TimerPhase::Complete, 12);
        assert_eq!(settings.duration(TimerPhase::Complete), 0);
    }

    #[test]
    fn defaults_match_phase_defaults() {
        let settings = PhaseSettings::default();
        for phase in TimerPhase::ALL {
            assert_eq!(settings.duration(phase), phase.default_duration());
        }
    }

    #[test]
    fn working_time_saturates() {
        let settings = PhaseSettings {
            final_eccentric_duration: u32::MAX,
            ..PhaseSettings::default()
        };
        assert_eq!(settings.working_time(), u32::MAX);
    }

    #[test]
    fn clamped_limits_each_phase() {
        let settings = PhaseSettings {
            prep_duration: 0,
            eccentric_duration: 601,
            final_eccentric_duration: u32::MAX,
            rest_duration: 5000,
            ..PhaseSettings::default()
        }
        .clamped();
        assert_eq!(settings.prep_duration, 1);
        assert_eq!(settings.eccentric_duration, MAX_TIMED_SECS);
        assert_eq!(settings.final_eccentric_duration, MAX_TIMED_SECS);
        assert_eq!(settings.rest_duration, MAX_REST_SECS);
        assert_eq!(PhaseSettings::default().clamped(), PhaseSettings::default());

        let no_rest = PhaseSettings {
            rest_duration: 0,
            ..PhaseSettings::default()
        };
        assert_eq!(no_rest.clamped().rest_duration, 0);
    }

    #[test]
    fn settings_serialize_camel_case() {
        let json = serde_json::to_value(PhaseSettings::default()).unwrap();
        assert_eq!(json["finalEccentricDuration"], 40);
        assert_eq!(json["restDuration"], 90);
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let settings: PhaseSettings = serde_json::from_str(r#"{"restDuration": 60}"#).unwrap();
        assert_eq!(settings.rest_duration, 60);
        assert_eq!(settings.prep_duration, 10);
    }

    #[test]
    fn working_time_sums_timed_phases() {
        assert_eq!(PhaseSettings::default().working_time(), 105);
    }

    #[test]
    fn working_phases() {
        assert!(TimerPhase::Eccentric.is_working());
        assert!(TimerPhase::FinalEccentric.is_working());
        assert!(!TimerPhase::Prep.is_working());
        assert!(!TimerPhase::Rest.is_working());
    }
}

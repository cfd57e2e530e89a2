//! Countdown state machine.
//!
//! Each running tick first emits the cues for the current remaining value,
//! then decrements. Reaching zero advances to the successor phase in the
//! same tick. Zero-length phases are passed through immediately, which is
//! how `Complete` hands over to `Rest`. A negative-only set skips the
//! concentric and final eccentric and completes straight after the
//! eccentric.

use serde::Serialize;
use tracing::{debug, trace};

use crate::coach::{Cue, Haptic};
use crate::model::{PhaseSettings, TimerPhase};

/// Working phases at or below this length get no entry encouragement.
const ENCOURAGE_MIN_SECS: u32 = 7;

/// Working phases above this length also get a midpoint encouragement.
const MIDPOINT_MIN_SECS: u32 = 15;

/// Spoken countdown marks outside rest.
const EXERCISE_MARKS: [u32; 4] = [30, 20, 15, 10];

/// Whether the countdown is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

/// Why a transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// The countdown reached zero.
    Expired,
    /// The user skipped ahead.
    Skipped,
}

/// Record of one phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseTransition {
    pub from: TimerPhase,
    pub to: TimerPhase,
    pub reason: TransitionReason,
}

/// Everything a tick (or a start / skip) produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Cues to play, in order.
    pub cues: Vec<Cue>,
    /// Transitions taken, in order.
    pub transitions: Vec<PhaseTransition>,
    /// Rest ran out; the caller decides what comes next.
    pub rest_finished: bool,
}

impl TickOutcome {
    /// Whether `phase` was entered during this step.
    #[must_use]
    pub fn entered(&self, phase: TimerPhase) -> bool {
        self.transitions.iter().any(|t| t.to == phase)
    }
}

/// Phase countdown for a single exercise.
#[derive(Debug, Clone)]
pub struct PhaseTimer {
    settings: PhaseSettings,
    phase: TimerPhase,
    remaining: u32,
    status: TimerStatus,
    negative_only: bool,
}

impl PhaseTimer {
    /// Creates an idle timer parked at `Prep`.
    #[must_use]
    pub const fn new(settings: PhaseSettings) -> Self {
        Self {
            remaining: settings.duration(TimerPhase::Prep),
            settings,
            phase: TimerPhase::Prep,
            status: TimerStatus::Idle,
            negative_only: false,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> TimerPhase {
        self.phase
    }

    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub const fn status(&self) -> TimerStatus {
        self.status
    }

    #[must_use]
    pub const fn settings(&self) -> &PhaseSettings {
        &self.settings
    }

    #[must_use]
    pub const fn is_negative_only(&self) -> bool {
        self.negative_only
    }

    /// Routes the eccentric straight to `Complete` for the sets that
    /// follow.
    pub const fn set_negative_only(&mut self, negative_only: bool) {
        self.negative_only = negative_only;
    }

    /// Seconds of work in one set on the current route, prep included.
    #[must_use]
    pub const fn working_time(&self) -> u32 {
        if self.negative_only {
            let s = &self.settings;
            s.prep_duration
                .saturating_add(s.positioning_duration)
                .saturating_add(s.eccentric_duration)
        } else {
            self.settings.working_time()
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Configured length of the current phase.
    #[must_use]
    pub const fn phase_duration(&self) -> u32 {
        self.settings.duration(self.phase)
    }

    /// Fraction of the current phase already elapsed, in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let total = self.phase_duration();
        if total == 0 {
            return 1.0;
        }
        let elapsed = total.saturating_sub(self.remaining);
        f64::from(elapsed) / f64::from(total)
    }

    /// Replaces the durations. An idle timer also resets its countdown.
    pub const fn set_settings(&mut self, settings: PhaseSettings) {
        self.settings = settings;
        if matches!(self.status, TimerStatus::Idle) {
            self.remaining = settings.duration(self.phase);
        }
    }

    /// Enters `phase` with a full countdown and starts running.
    pub fn start(&mut self, phase: TimerPhase) -> TickOutcome {
        let mut out = TickOutcome::default();
        self.status = TimerStatus::Running;
        self.enter(phase, &mut out);
        out
    }

    /// Advances the countdown by one second.
    ///
    /// A tick while idle or paused changes nothing and returns an empty
    /// outcome.
    pub fn tick(&mut self) -> TickOutcome {
        let mut out = TickOutcome::default();
        if self.status != TimerStatus::Running {
            return out;
        }

        self.threshold_cues(&mut out.cues);
        self.remaining = self.remaining.saturating_sub(1);
        trace!(phase = %self.phase, remaining = self.remaining, "tick");

        if self.remaining == 0 {
            self.advance(TransitionReason::Expired, &mut out);
        }
        out
    }

    /// Stops the countdown, keeping the remaining time. Returns whether the
    /// timer was running.
    pub fn pause(&mut self) -> bool {
        if self.status == TimerStatus::Running {
            self.status = TimerStatus::Paused;
            true
        } else {
            false
        }
    }

    /// Restarts a paused countdown. Returns whether the timer was paused.
    pub fn resume(&mut self) -> bool {
        if self.status == TimerStatus::Paused {
            self.status = TimerStatus::Running;
            true
        } else {
            false
        }
    }

    /// Jumps to the successor phase now, whatever the countdown says.
    ///
    /// Skipping rest finishes it. An idle timer cannot skip.
    pub fn skip(&mut self) -> TickOutcome {
        let mut out = TickOutcome::default();
        if self.status == TimerStatus::Idle {
            return out;
        }
        self.status = TimerStatus::Running;
        self.advance(TransitionReason::Skipped, &mut out);
        out
    }

    /// Restores the full duration of the current phase and pauses.
    pub fn reset_phase(&mut self) {
        self.remaining = self.phase_duration();
        if self.status != TimerStatus::Idle {
            self.status = TimerStatus::Paused;
        }
    }

    /// Returns to idle at `Prep`.
    pub const fn stop(&mut self) {
        self.status = TimerStatus::Idle;
        self.phase = TimerPhase::Prep;
        self.remaining = self.settings.duration(TimerPhase::Prep);
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// The phase after `phase` on this timer's route.
    fn next_phase(&self, phase: TimerPhase) -> Option<TimerPhase> {
        if self.negative_only && phase == TimerPhase::Eccentric {
            return Some(TimerPhase::Complete);
        }
        phase.successor()
    }

    fn advance(&mut self, reason: TransitionReason, out: &mut TickOutcome) {
        let from = self.phase;
        match self.next_phase(from) {
            Some(to) => {
                debug!(%from, %to, ?reason, "phase transition");
                out.transitions.push(PhaseTransition { from, to, reason });
                self.enter(to, out);
            }
            None => self.finish_rest(out),
        }
    }

    /// Enters `phase`, cascading through phases that have no duration.
    fn enter(&mut self, phase: TimerPhase, out: &mut TickOutcome) {
        let mut phase = phase;
        loop {
            self.phase = phase;
            self.remaining = self.settings.duration(phase);
            Self::entry_cues(phase, self.remaining, &mut out.cues);

            if self.remaining > 0 {
                return;
            }
            let Some(next) = self.next_phase(phase) else {
                self.finish_rest(out);
                return;
            };
            out.transitions.push(PhaseTransition {
                from: phase,
                to: next,
                reason: TransitionReason::Expired,
            });
            phase = next;
        }
    }

    fn finish_rest(&mut self, out: &mut TickOutcome) {
        debug!("rest finished");
        self.remaining = 0;
        self.status = TimerStatus::Idle;
        out.rest_finished = true;
    }

    // ========================================================================
    // Cues
    // ========================================================================

    fn entry_cues(phase: TimerPhase, duration: u32, cues: &mut Vec<Cue>) {
        cues.push(Cue::PhaseStarted { phase });
        if phase == TimerPhase::Rest {
            cues.push(Cue::Encouragement);
            cues.push(Cue::RestStarting);
        } else if phase.is_working() && duration > ENCOURAGE_MIN_SECS {
            cues.push(Cue::Encouragement);
        }
    }

    fn threshold_cues(&self, cues: &mut Vec<Cue>) {
        let seconds = self.remaining;
        if self.phase == TimerPhase::Rest {
            match seconds {
                30 => cues.push(Cue::Countdown { seconds, rest: true }),
                20 => {
                    cues.push(Cue::RestGetReady);
                    cues.push(Cue::Haptic { strength: Haptic::Medium });
                }
                10 => {
                    cues.push(Cue::Countdown { seconds, rest: true });
                    cues.push(Cue::Haptic { strength: Haptic::Medium });
                }
                1..=5 => {
                    cues.push(Cue::Countdown { seconds, rest: true });
                    cues.push(Cue::Haptic { strength: Haptic::Heavy });
                }
                _ => {}
            }
            return;
        }

        if EXERCISE_MARKS.contains(&seconds) {
            cues.push(Cue::Countdown { seconds, rest: false });
            if seconds == 10 {
                cues.push(Cue::Haptic { strength: Haptic::Medium });
            }
        } else if (1..=5).contains(&seconds) {
            cues.push(Cue::Countdown { seconds, rest: false });
            cues.push(Cue::Haptic { strength: Haptic::Heavy });
        }

        let duration = self.phase_duration();
        if self.phase.is_working() && duration > MIDPOINT_MIN_SECS && seconds == duration / 2 {
            cues.push(Cue::Encouragement);
        }
    }
}

impl Default for PhaseTimer {
    fn default() -> Self {
        Self::new(PhaseSettings::default())
    }
}

//! Prometheus-compatible workout metrics.
//!
//! Phase labels come from the fixed [`TimerPhase`] set, so label
//! cardinality is bounded without sanitizing.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::OneRepError;
use crate::model::TimerPhase;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// With a `port`, a Prometheus listener is served on `127.0.0.1:<port>`;
/// without one, the recorder is installed for in-process reads only.
///
/// # Errors
///
/// Returns [`OneRepError::Io`] if the recorder or listener cannot be
/// installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), OneRepError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| OneRepError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!("onerep_ticks_total", "Timer ticks processed while running");
    describe_counter!(
        "onerep_phase_transitions_total",
        "Phase transitions by source and target phase"
    );
    describe_counter!("onerep_sets_logged_total", "Sets written to the log");
    describe_counter!(
        "onerep_personal_records_total",
        "Logged sets that beat the previous best"
    );
    describe_gauge!("onerep_current_phase", "Currently active phase (1 = active)");
}

pub fn record_tick() {
    counter!("onerep_ticks_total").increment(1);
}

/// Records a transition and moves the current-phase gauge.
pub fn record_phase_transition(from: TimerPhase, to: TimerPhase) {
    counter!(
        "onerep_phase_transitions_total",
        "from" => phase_label(from),
        "to" => phase_label(to)
    )
    .increment(1);
    set_current_phase(to, Some(from));
}

/// Sets the current-phase gauge, zeroing the previous label.
pub fn set_current_phase(phase: TimerPhase, previous: Option<TimerPhase>) {
    if let Some(prev) = previous {
        gauge!("onerep_current_phase", "phase" => phase_label(prev)).set(0.0);
    }
    gauge!("onerep_current_phase", "phase" => phase_label(phase)).set(1.0);
}

pub fn record_set_logged(personal_record: bool) {
    counter!("onerep_sets_logged_total").increment(1);
    if personal_record {
        counter!("onerep_personal_records_total").increment(1);
    }
}

const fn phase_label(phase: TimerPhase) -> &'static str {
    match phase {
        TimerPhase::Prep => "prep",
        TimerPhase::Positioning => "positioning",
        TimerPhase::Eccentric => "eccentric",
        TimerPhase::Concentric => "concentric",
        TimerPhase::FinalEccentric => "final_eccentric",
        TimerPhase::Complete => "complete",
        TimerPhase::Rest => "rest",
    }
}

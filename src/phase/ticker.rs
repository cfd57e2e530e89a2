//! One-second tick source.
//!
//! Pausing cancels the background task outright; resuming spawns a fresh
//! one whose first tick lands a full period later. The countdown lives in
//! [`PhaseTimer`](super::PhaseTimer), so nothing is lost in between.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One elapsed period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

/// Handle to the background tick task.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    tx: mpsc::UnboundedSender<Tick>,
    shutdown: CancellationToken,
    task: Option<(CancellationToken, JoinHandle<()>)>,
}

impl Ticker {
    /// Creates a stopped ticker that will send into `tx`.
    ///
    /// Cancelling `shutdown` also stops any running task.
    #[must_use]
    pub const fn new(
        period: Duration,
        tx: mpsc::UnboundedSender<Tick>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            period,
            tx,
            shutdown,
            task: None,
        }
    }

    /// Whether a tick task is currently alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|(_, handle)| !handle.is_finished())
    }

    /// Spawns the tick task. A no-op when already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let cancel = self.shutdown.child_token();
        let handle = spawn_tick_task(self.period, self.tx.clone(), cancel.clone());
        self.task = Some((cancel, handle));
    }

    /// Cancels the tick task, if any.
    pub fn stop(&mut self) {
        if let Some((cancel, _handle)) = self.task.take() {
            cancel.cancel();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_tick_task(
    period: Duration,
    tx: mpsc::UnboundedSender<Tick>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("tick task cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if tx.send(Tick).is_err() {
                        debug!("tick receiver dropped");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<Tick>) -> usize {
        let mut n = 0;
        while rx.try_recv().is_ok() {
            n += 1;
        }
        n
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = Ticker::new(TICK_PERIOD, tx, CancellationToken::new());
        ticker.start();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(drain(&mut rx), 3);
        assert!(ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_ticks_and_restart_waits_full_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = Ticker::new(TICK_PERIOD, tx, CancellationToken::new());
        ticker.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        ticker.stop();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(drain(&mut rx), 1);
        assert!(!ticker.is_running());

        ticker.start();
        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(drain(&mut rx), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(drain(&mut rx), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_spawns_one_task() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = Ticker::new(TICK_PERIOD, tx, CancellationToken::new());
        ticker.start();
        ticker.start();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(drain(&mut rx), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_token_stops_task() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let mut ticker = Ticker::new(TICK_PERIOD, tx, shutdown.clone());
        ticker.start();
        shutdown.cancel();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(drain(&mut rx), 0);
        assert!(!ticker.is_running());
    }
}

//! Periodic background reload of the dashboard data.

use crate::state::StateStore;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

struct RunningTimer {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Fires a reload every `period` while auto-refresh is enabled.
///
/// At most one timer runs per scheduler: starting again replaces the running
/// timer, and dropping the scheduler stops it. Ticks that find a load already
/// in flight are skipped.
pub struct RefreshScheduler {
    store: StateStore,
    period: Duration,
    running: Option<RunningTimer>,
}

impl RefreshScheduler {
    pub fn new(store: StateStore, period: Duration) -> Self {
        Self {
            store,
            period,
            running: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|timer| !timer.task.is_finished())
    }

    /// Starts the timer. Must be called from within a tokio runtime.
    pub fn start<F, Fut>(&mut self, reload: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let store = self.store.clone();
        let period = self.period;
        let first_tick = Instant::now() + period;

        let task = tokio::spawn(async move {
            tracing::info!("Auto-refresh started (every {:?})", period);
            let mut ticker = tokio::time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let state = store.get_state();
                        if !state.auto_refresh || state.is_loading {
                            tracing::debug!(
                                "Skipping refresh tick (auto_refresh={}, loading={})",
                                state.auto_refresh,
                                state.is_loading
                            );
                            continue;
                        }
                        tracing::debug!("Refresh tick");
                        tokio::select! {
                            biased;
                            _ = token.cancelled() => break,
                            _ = reload() => {}
                        }
                    }
                }
            }
            tracing::info!("Auto-refresh stopped");
        });

        self.running = Some(RunningTimer { cancel, task });
    }

    /// Idempotent.
    pub fn stop(&mut self) {
        if let Some(timer) = self.running.take() {
            timer.cancel.cancel();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

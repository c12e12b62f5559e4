//! Background task that keeps snapshots fresh.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::refresh::{panic_message, RefreshCoordinator, RefreshOutcome};

/// Handle to a running refresh loop. Dropping it leaves the loop running;
/// call [`shutdown`](Self::shutdown) to stop it.
pub struct RefreshLoopHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl RefreshLoopHandle {
    /// Token that stops the loop when cancelled.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop the loop and wait for it to exit. A refresh already in flight
    /// is dropped, which releases the refresh flag.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "refresh loop ended abnormally");
        }
    }
}

/// Check staleness now and then every `check_interval`, refreshing when any
/// source is missing or older than `stale_after`.
///
/// Refreshes go through the coordinator's in-progress guard, so a tick that
/// lands during an admin-triggered refresh does nothing. A failed or
/// panicking tick is logged and the loop carries on.
pub fn spawn_refresh_loop(
    coordinator: Arc<RefreshCoordinator>,
    stale_after: Duration,
    check_interval: Duration,
) -> RefreshLoopHandle {
    let token = CancellationToken::new();
    let cancelled = token.clone();

    let task = tokio::spawn(async move {
        let mut ticker = time::interval(check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = cancelled.cancelled() => break,
                tick = AssertUnwindSafe(refresh_if_stale(&coordinator, stale_after)).catch_unwind() => {
                    if let Err(payload) = tick {
                        error!(panic = %panic_message(payload.as_ref()), "scheduled refresh check panicked");
                    }
                }
            }
        }
        info!("refresh loop stopped");
    });

    RefreshLoopHandle { token, task }
}

/// One scheduler tick. Returns the outcome when a refresh was attempted.
pub async fn refresh_if_stale(
    coordinator: &RefreshCoordinator,
    stale_after: Duration,
) -> Option<RefreshOutcome> {
    let stale = coordinator.store().stale_sources(stale_after);
    if stale.is_empty() {
        debug!("all snapshots fresh");
        return None;
    }

    let stale: Vec<&str> = stale.iter().map(|source| source.key()).collect();
    info!(?stale, "stale snapshots found, refreshing");
    let outcome = coordinator.refresh_once().await;
    match &outcome {
        RefreshOutcome::InProgress => debug!("refresh already running"),
        RefreshOutcome::Finished(report) if !report.is_complete() => {
            warn!(error = ?report.error, "scheduled refresh did not complete");
        }
        RefreshOutcome::Finished(_) => {}
    }
    Some(outcome)
}

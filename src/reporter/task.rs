//! Tokio-task periodic reporter for async work.

use super::{ProgressReporter, StopOutcome};
use crate::notification::Notifier;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Keeps the background reporting task alive.
///
/// Prefer [`AsyncProgressGuard::stop`], which waits for the task. Dropping the
/// guard only signals cancellation.
pub struct AsyncProgressGuard {
    cancel_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
    join_timeout: Duration,
}

impl AsyncProgressGuard {
    pub(super) fn start(reporter: &ProgressReporter) -> Self {
        reporter.notifier.send(&reporter.message);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(report_until_cancelled(
            reporter.notifier.clone(),
            reporter.message.clone(),
            reporter.interval,
            cancel_rx,
        ));
        debug!(interval = ?reporter.interval, "Progress reporter task started");

        Self {
            cancel_tx,
            handle: Some(handle),
            join_timeout: reporter.join_timeout,
        }
    }

    /// Signals cancellation and waits up to the join timeout for the task.
    pub async fn stop(mut self) -> StopOutcome {
        let _ = self.cancel_tx.send(true);
        let Some(handle) = self.handle.take() else {
            return StopOutcome::NotStarted;
        };

        match tokio::time::timeout(self.join_timeout, handle).await {
            Ok(Ok(())) => {
                debug!("Progress reporter task stopped");
                StopOutcome::Joined
            }
            Ok(Err(e)) => {
                warn!("Progress reporter task failed: {}", e);
                StopOutcome::Joined
            }
            Err(_) => {
                debug!(
                    timeout = ?self.join_timeout,
                    "Progress reporter task did not stop in time, abandoning it"
                );
                StopOutcome::Abandoned
            }
        }
    }
}

impl Drop for AsyncProgressGuard {
    fn drop(&mut self) {
        let _ = self.cancel_tx.send(true);
    }
}

async fn report_until_cancelled(
    notifier: Notifier,
    message: Arc<str>,
    interval: Duration,
    mut cancel_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            // Also fires when the guard is gone.
            _ = cancel_rx.changed() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        // Sinks are synchronous and may block; keep them off the runtime workers.
        let notifier = notifier.clone();
        let message = message.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || notifier.send(&message)).await {
            warn!("Progress notification task failed: {}", e);
        }
    }
}

//! Thread-backed periodic reporter for blocking work.

use super::{ProgressReporter, StopOutcome};
use crate::notification::Notifier;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

struct Worker {
    cancel_tx: Sender<()>,
    done_rx: Receiver<()>,
    handle: JoinHandle<()>,
}

/// Keeps the background reporting thread alive.
///
/// Dropping the guard signals cancellation and waits up to the reporter's
/// join timeout; this also happens while unwinding from a panic.
pub struct ProgressGuard {
    worker: Option<Worker>,
    join_timeout: Duration,
}

impl ProgressGuard {
    pub(super) fn start(reporter: &ProgressReporter) -> Self {
        reporter.notifier.send(&reporter.message);

        let (cancel_tx, cancel_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let notifier = reporter.notifier.clone();
        let message = reporter.message.clone();
        let interval = reporter.interval;

        let spawned = thread::Builder::new()
            .name("progress-reporter".to_string())
            .spawn(move || {
                report_until_cancelled(&notifier, &message, interval, &cancel_rx);
                let _ = done_tx.send(());
            });

        let worker = match spawned {
            Ok(handle) => {
                debug!(?interval, "Progress reporter thread started");
                Some(Worker {
                    cancel_tx,
                    done_rx,
                    handle,
                })
            }
            Err(e) => {
                warn!("Failed to spawn progress reporter thread, continuing without periodic updates: {}", e);
                None
            }
        };

        Self {
            worker,
            join_timeout: reporter.join_timeout,
        }
    }

    /// Stops reporting now and reports how the thread ended.
    pub fn stop(mut self) -> StopOutcome {
        self.shutdown()
    }

    fn shutdown(&mut self) -> StopOutcome {
        let Some(worker) = self.worker.take() else {
            return StopOutcome::NotStarted;
        };

        // The thread may already be gone if it panicked.
        let _ = worker.cancel_tx.send(());

        match worker.done_rx.recv_timeout(self.join_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.handle.join().is_err() {
                    warn!("Progress reporter thread panicked");
                }
                debug!("Progress reporter thread stopped");
                StopOutcome::Joined
            }
            Err(RecvTimeoutError::Timeout) => {
                // Dropping the handle detaches the thread; it exits after its
                // current notification.
                debug!(
                    timeout = ?self.join_timeout,
                    "Progress reporter thread did not stop in time, abandoning it"
                );
                StopOutcome::Abandoned
            }
        }
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Waits `interval` for cancellation, sending the message each time the wait
/// times out. No catch-up is attempted for slow sends.
fn report_until_cancelled(
    notifier: &Notifier,
    message: &Arc<str>,
    interval: Duration,
    cancel_rx: &Receiver<()>,
) {
    loop {
        match cancel_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => notifier.send(message),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NotificationSink, Payload, SinkError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    #[derive(Default)]
    struct CountingSink {
        count: AtomicUsize,
    }

    impl NotificationSink for CountingSink {
        fn send_event(&self, _event: &str, _payload: &Payload) -> Result<(), SinkError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn reporter(sink: &Arc<CountingSink>, interval_ms: u64) -> ProgressReporter {
        ProgressReporter::new(Notifier::with_sink(sink.clone()), "working")
            .with_interval(Duration::from_millis(interval_ms))
            .unwrap()
    }

    #[test]
    fn test_stop_joins_idle_thread_promptly() {
        let sink = Arc::new(CountingSink::default());
        let guard = reporter(&sink, 10_000).start();

        let started = Instant::now();
        assert_eq!(guard.stop(), StopOutcome::Joined);
        // Cancellation wakes the waiting thread; no need to sit out the interval.
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(sink.count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_sends_after_stop() {
        let sink = Arc::new(CountingSink::default());
        let guard = reporter(&sink, 20).start();
        thread::sleep(Duration::from_millis(70));
        guard.stop();

        let after_stop = sink.count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(sink.count.load(Ordering::SeqCst), after_stop);
        assert!(after_stop >= 2);
    }

    #[test]
    fn test_log_only_reporter_still_runs_loop() {
        let guard = ProgressReporter::new(Notifier::log_only(), "quiet")
            .with_interval(Duration::from_millis(10))
            .unwrap()
            .start();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(guard.stop(), StopOutcome::Joined);
    }
}

//! Periodic progress reporting around a block of work.
//!
//! A [`ProgressReporter`] holds the message, interval and join timeout. Starting
//! it sends the message once, synchronously, and spawns a background loop that
//! repeats the send every `interval` until the returned guard is stopped or
//! dropped. Teardown waits at most `join_timeout` for the loop to finish; a
//! loop still busy after that is abandoned and exits on its own.
//!
//! Two flavours share the same contract:
//! - [`ProgressReporter::start`] / [`ProgressReporter::run`] use an OS thread
//!   and suit blocking work.
//! - [`ProgressReporter::start_async`] / [`ProgressReporter::run_async`] use a
//!   tokio task and must be called from within a runtime.

pub mod blocking;
pub mod task;

pub use blocking::ProgressGuard;
pub use task::AsyncProgressGuard;

use crate::notification::Notifier;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Time between repeated notifications when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// How long teardown waits for the background loop before abandoning it.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors raised while configuring a reporter.
#[derive(Debug, Error, PartialEq)]
pub enum ReporterError {
    #[error("progress interval must be a positive, finite number of seconds (got {0})")]
    InvalidInterval(f64),
}

/// How a reporter's background loop ended at teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The loop observed cancellation and finished within the join timeout.
    Joined,
    /// The loop was still busy when the join timeout expired and was left
    /// to finish on its own.
    Abandoned,
    /// No background loop was running.
    NotStarted,
}

/// Converts a number of seconds into a reporting interval.
pub fn interval_from_secs(secs: f64) -> Result<Duration, ReporterError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ReporterError::InvalidInterval(secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ReporterError::InvalidInterval(secs))
}

/// Configuration for a scoped periodic reporter.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    notifier: Notifier,
    message: Arc<str>,
    interval: Duration,
    join_timeout: Duration,
}

impl ProgressReporter {
    /// Creates a reporter with the default interval and join timeout.
    pub fn new(notifier: Notifier, message: impl AsRef<str>) -> Self {
        Self {
            notifier,
            message: Arc::from(message.as_ref()),
            interval: DEFAULT_INTERVAL,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }

    /// Sets the time between repeated notifications. Zero is rejected.
    pub fn with_interval(mut self, interval: Duration) -> Result<Self, ReporterError> {
        if interval.is_zero() {
            return Err(ReporterError::InvalidInterval(0.0));
        }
        self.interval = interval;
        Ok(self)
    }

    /// Sets the interval from fractional seconds.
    pub fn with_interval_secs(self, secs: f64) -> Result<Self, ReporterError> {
        let interval = interval_from_secs(secs)?;
        self.with_interval(interval)
    }

    /// Sets how long teardown waits for the background loop.
    pub fn with_join_timeout(mut self, join_timeout: Duration) -> Self {
        self.join_timeout = join_timeout;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn join_timeout(&self) -> Duration {
        self.join_timeout
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Sends the message once and starts the background thread.
    ///
    /// Reporting stops when the returned guard is dropped or stopped.
    #[must_use = "reporting stops as soon as the guard is dropped"]
    pub fn start(&self) -> ProgressGuard {
        ProgressGuard::start(self)
    }

    /// Runs `work` with periodic reporting and returns its result unchanged.
    ///
    /// Panics inside `work` still stop the background thread before they
    /// propagate.
    pub fn run<R>(&self, work: impl FnOnce() -> R) -> R {
        let _guard = self.start();
        work()
    }

    /// Sends the message once and starts the background task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use = "reporting stops as soon as the guard is dropped"]
    pub fn start_async(&self) -> AsyncProgressGuard {
        AsyncProgressGuard::start(self)
    }

    /// Awaits `work` with periodic reporting and returns its output unchanged.
    pub async fn run_async<F: Future>(&self, work: F) -> F::Output {
        let guard = self.start_async();
        let output = work.await;
        guard.stop().await;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_secs_accepts_fractions() {
        assert_eq!(interval_from_secs(0.1).unwrap(), Duration::from_millis(100));
        assert_eq!(interval_from_secs(5.0).unwrap(), DEFAULT_INTERVAL);
    }

    #[test]
    fn test_interval_from_secs_rejects_non_positive_and_non_finite() {
        assert_eq!(interval_from_secs(0.0), Err(ReporterError::InvalidInterval(0.0)));
        assert_eq!(interval_from_secs(-1.5), Err(ReporterError::InvalidInterval(-1.5)));
        assert!(interval_from_secs(f64::NAN).is_err());
        assert!(interval_from_secs(f64::INFINITY).is_err());
        assert!(interval_from_secs(1e300).is_err());
    }

    #[test]
    fn test_reporter_defaults() {
        let reporter = ProgressReporter::new(Notifier::log_only(), "Training");
        assert_eq!(reporter.message(), "Training");
        assert_eq!(reporter.interval(), Duration::from_secs_f64(5.0));
        assert_eq!(reporter.join_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_reporter_rejects_zero_interval() {
        let result = ProgressReporter::new(Notifier::log_only(), "x").with_interval(Duration::ZERO);
        assert!(matches!(result, Err(ReporterError::InvalidInterval(_))));
    }
}

//! Best-effort dispatch of a single progress message.
//!
//! The notifier never fails visibly: a configured sink is tried once and any
//! error is downgraded to a warning. Without a sink the message is only logged.

use crate::core::{progress_payload, NotificationSink, SinkError, PROGRESS_EVENT};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info, warn};

/// The tag used in log lines when none is configured.
pub const DEFAULT_LOG_TAG: &str = "Progress";

/// Sends a progress message to `sink`, falling back to a log line.
///
/// On success an info line is logged as well. On failure, including a panic
/// inside the sink, a warning carrying the error is logged and the call
/// returns normally.
pub fn send_progress(sink: Option<&dyn NotificationSink>, tag: &str, message: &str) {
    let Some(sink) = sink else {
        info!("[{}] {}", tag, message);
        return;
    };

    let payload = progress_payload(message);
    let sent = panic::catch_unwind(AssertUnwindSafe(|| {
        sink.send_event(PROGRESS_EVENT, &payload)
    }))
    .unwrap_or_else(|panic| {
        Err(SinkError::Send(format!(
            "sink panicked: {}",
            panic_message(&*panic)
        )))
    });

    match sent {
        Ok(()) => {
            metrics::counter!("progress_notifications_sent_total").increment(1);
            info!("[{}] {}", tag, message);
        }
        Err(e) => {
            metrics::counter!("progress_notifications_failed_total").increment(1);
            warn!("[{}] Failed to send progress: {}", tag, e);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// A cheaply cloneable handle bundling an optional sink with a log tag.
///
/// Whether a sink is present is decided once, at construction.
#[derive(Clone)]
pub struct Notifier {
    sink: Option<Arc<dyn NotificationSink>>,
    tag: Arc<str>,
}

impl Notifier {
    /// Creates a notifier around an optional sink.
    pub fn new(sink: Option<Arc<dyn NotificationSink>>) -> Self {
        Self {
            sink,
            tag: Arc::from(DEFAULT_LOG_TAG),
        }
    }

    /// Creates a notifier that dispatches to `sink`.
    pub fn with_sink(sink: Arc<dyn NotificationSink>) -> Self {
        Self::new(Some(sink))
    }

    /// Creates a notifier that only logs.
    pub fn log_only() -> Self {
        Self::new(None)
    }

    /// Replaces the tag prefixed to every log line.
    pub fn with_tag(mut self, tag: impl AsRef<str>) -> Self {
        self.tag = Arc::from(tag.as_ref());
        self
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Dispatches one message. See [`send_progress`].
    pub fn send(&self, message: &str) {
        send_progress(self.sink.as_deref(), &self.tag, message);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::log_only()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("has_sink", &self.has_sink())
            .field("tag", &self.tag)
            .finish()
    }
}

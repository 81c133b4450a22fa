#![allow(dead_code)]
//! Fake notification sinks for exercising the notifier and reporters.

use progress_notify::core::{NotificationSink, Payload, SinkError};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

/// A sink that records every message it receives.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn send_event(&self, event: &str, payload: &Payload) -> Result<(), SinkError> {
        assert_eq!(event, "progress");
        let message = payload.get("message").cloned().unwrap_or_default();
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

/// A sink that always fails, counting how often it was tried.
#[derive(Clone, Debug, Default)]
pub struct FailingSink {
    pub attempts: Arc<AtomicUsize>,
}

impl NotificationSink for FailingSink {
    fn send_event(&self, _event: &str, _payload: &Payload) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Disconnected)
    }
}

/// A sink whose first send returns immediately and every later send blocks
/// for `delay`.
#[derive(Clone, Debug)]
pub struct SlowSink {
    pub calls: Arc<AtomicUsize>,
    pub delay: Duration,
}

impl SlowSink {
    pub fn new(delay: Duration) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            delay,
        }
    }
}

impl NotificationSink for SlowSink {
    fn send_event(&self, _event: &str, _payload: &Payload) -> Result<(), SinkError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            std::thread::sleep(self.delay);
        }
        Ok(())
    }
}

/// A sink that panics on every send, counting how often it was tried.
#[derive(Clone, Debug, Default)]
pub struct PanickingSink {
    pub attempts: Arc<AtomicUsize>,
}

impl NotificationSink for PanickingSink {
    fn send_event(&self, _event: &str, _payload: &Payload) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        panic!("sink lost its connection");
    }
}

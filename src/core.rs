//! Core domain types and service traits for progress-notify
//!
//! This module defines the notification sink contract that every progress
//! channel implements, along with the payload and frame types that flow
//! through it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// The event name used for every progress notification.
pub const PROGRESS_EVENT: &str = "progress";

/// The payload key carrying the progress message.
pub const MESSAGE_KEY: &str = "message";

/// String-to-string mapping sent alongside an event.
pub type Payload = BTreeMap<String, String>;

/// Builds the payload for a progress event: `{"message": message}`.
pub fn progress_payload(message: &str) -> Payload {
    let mut payload = Payload::new();
    payload.insert(MESSAGE_KEY.to_string(), message.to_string());
    payload
}

/// Errors a sink can report when an event could not be delivered.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink has been shut down and no longer accepts events.
    #[error("notification sink is disconnected")]
    Disconnected,
    /// The sink rejected or failed to deliver the event.
    #[error("failed to send event: {0}")]
    Send(String),
}

/// A channel that can accept named events carrying a string payload.
///
/// Implementations are called from background threads and tasks, so they must
/// be safe to share. Calls are synchronous; the async reporter runs them on
/// tokio's blocking pool. A panic inside `send_event` is caught by the
/// notifier and reported like any other send failure.
pub trait NotificationSink: Send + Sync {
    /// Delivers a single event.
    fn send_event(&self, event: &str, payload: &Payload) -> Result<(), SinkError>;
}

/// The JSON envelope pushed to WebSocket observers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressFrame {
    /// The event name, e.g. `"progress"`.
    #[serde(rename = "type")]
    pub event: String,
    /// The event payload.
    pub data: Payload,
}

impl ProgressFrame {
    pub fn new(event: &str, data: &Payload) -> Self {
        Self {
            event: event.to_string(),
            data: data.clone(),
        }
    }
}

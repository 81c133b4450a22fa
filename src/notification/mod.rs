//! Progress notification: the best-effort notifier and the sinks behind it.
//!
//! The notifier only knows the [`NotificationSink`](crate::core::NotificationSink)
//! trait; the WebSocket server is one implementation of it.
pub mod logging_subscriber;
pub mod notifier;
pub mod websocket;

pub use notifier::{send_progress, Notifier};

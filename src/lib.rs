//! progress-notify - periodic progress notifications for long-running work
//!
//! A best-effort notifier pushes progress messages to an optional sink (such
//! as the bundled WebSocket server) and falls back to log lines. A scoped
//! reporter repeats the notification on a timer while a block of work runs.

pub mod cli;
pub mod config;
pub mod core;
pub mod notification;
pub mod reporter;

// Re-export core types for convenience
pub use crate::core::*;
pub use notification::{send_progress, Notifier};
pub use reporter::{AsyncProgressGuard, ProgressGuard, ProgressReporter, StopOutcome};

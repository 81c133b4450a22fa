//! A simple subscriber that logs every progress frame the server publishes.
//!
//! Useful for checking what observers would see without connecting a client.

use crate::core::ProgressFrame;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn, Instrument};

/// Spawns a task that listens for frames on a broadcast channel and logs them.
#[instrument(skip_all)]
pub fn spawn(mut frame_rx: broadcast::Receiver<ProgressFrame>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Frame logging subscriber started.");
        loop {
            match frame_rx.recv().await {
                Ok(frame) => {
                    info!(event = %frame.event, data = ?frame.data, "Published progress frame");
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Frame logging subscriber lagged behind and missed {} frames.", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Frame channel closed. Logging subscriber shutting down.");
                    break;
                }
            }
        }
    }
    .in_current_span())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{progress_payload, PROGRESS_EVENT};
    use std::time::Duration;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_logging_subscriber_logs_frames_and_exits_on_close() {
        let (frame_tx, frame_rx) = broadcast::channel(16);
        let handle = spawn(frame_rx);

        frame_tx
            .send(ProgressFrame::new(PROGRESS_EVENT, &progress_payload("unit-test step")))
            .unwrap();
        drop(frame_tx);

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("subscriber should exit once the channel closes")
            .unwrap();

        assert!(logs_contain("Published progress frame"));
        assert!(logs_contain("unit-test step"));
        assert!(logs_contain("Frame channel closed"));
    }
}

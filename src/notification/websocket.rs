//! A WebSocket server that pushes progress frames to connected observers.
//!
//! Frames are published on a `tokio::sync::broadcast` channel by
//! [`BroadcastSink`] and fanned out to one forwarding task per client.

use crate::core::{NotificationSink, Payload, ProgressFrame, SinkError};
use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

/// A [`NotificationSink`] that publishes frames to every connected client.
#[derive(Clone, Debug)]
pub struct BroadcastSink {
    frame_tx: broadcast::Sender<ProgressFrame>,
    closed: Arc<AtomicBool>,
}

impl BroadcastSink {
    pub fn new(frame_tx: broadcast::Sender<ProgressFrame>, closed: Arc<AtomicBool>) -> Self {
        Self { frame_tx, closed }
    }

    /// Number of clients currently subscribed.
    pub fn receiver_count(&self) -> usize {
        self.frame_tx.receiver_count()
    }
}

impl NotificationSink for BroadcastSink {
    fn send_event(&self, event: &str, payload: &Payload) -> Result<(), SinkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SinkError::Disconnected);
        }
        // A send error only means nobody is listening right now.
        if self.frame_tx.send(ProgressFrame::new(event, payload)).is_err() {
            debug!(event, "No observers connected, frame dropped");
        }
        Ok(())
    }
}

/// Accepts WebSocket clients and forwards progress frames to them.
pub struct ProgressServer {
    listener: TcpListener,
    frame_tx: broadcast::Sender<ProgressFrame>,
    closed: Arc<AtomicBool>,
}

impl ProgressServer {
    /// Binds the listener and creates a frame channel holding `capacity` frames.
    pub async fn bind(addr: SocketAddr, capacity: usize) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind progress server to {}", addr))?;
        let (frame_tx, _) = broadcast::channel(capacity.max(1));
        Ok(Self {
            listener,
            frame_tx,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Returns a sink publishing into this server.
    pub fn sink(&self) -> BroadcastSink {
        BroadcastSink::new(self.frame_tx.clone(), self.closed.clone())
    }

    /// Returns a raw receiver for every frame the server publishes.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressFrame> {
        self.frame_tx.subscribe()
    }

    /// Runs the accept loop until `shutdown_rx` fires.
    ///
    /// Connected observers are sent a close frame on shutdown. Sinks obtained
    /// from this server report [`SinkError::Disconnected`] once the loop has
    /// exited, including when the task running it is aborted.
    #[instrument(skip_all)]
    pub async fn run(self, mut shutdown_rx: watch::Receiver<()>) -> Result<()> {
        let _closed = MarkClosedOnDrop(self.closed.clone());
        info!(addr = ?self.listener.local_addr().ok(), "Progress server listening");
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Progress server received shutdown signal.");
                    break;
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let frame_rx = self.frame_tx.subscribe();
                            tokio::spawn(serve_client(stream, peer, frame_rx, shutdown_rx.clone()));
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Flags the sinks as disconnected however the accept loop ends.
struct MarkClosedOnDrop(Arc<AtomicBool>);

impl Drop for MarkClosedOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Upgrades one connection and forwards frames to it until either side
/// closes or the server shuts down.
async fn serve_client(
    stream: TcpStream,
    peer: SocketAddr,
    mut frame_rx: broadcast::Receiver<ProgressFrame>,
    mut shutdown_rx: watch::Receiver<()>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, "WebSocket handshake failed: {}", e);
            return;
        }
    };
    info!(%peer, "Progress observer connected");
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                if let Err(e) = write.send(Message::Close(None)).await {
                    debug!(%peer, "Failed to send close frame: {}", e);
                }
                break;
            }
            frame = frame_rx.recv() => {
                match frame {
                    Ok(frame) => {
                        let text = match serde_json::to_string(&frame) {
                            Ok(text) => text,
                            Err(e) => {
                                error!("Failed to serialize progress frame: {}", e);
                                continue;
                            }
                        };
                        if let Err(e) = write.send(Message::text(text)).await {
                            debug!(%peer, "Failed to write frame, dropping client: {}", e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(%peer, "Observer lagged behind and missed {} frames.", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(%peer, "WebSocket read error: {}", e);
                        break;
                    }
                }
            }
        }
    }
    info!(%peer, "Progress observer disconnected");
}

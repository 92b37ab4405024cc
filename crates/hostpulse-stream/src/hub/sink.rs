//! Per-client bounded sink and its delivery task.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use hostpulse_core::types::ClientId;

use super::broadcast::BroadcastHub;
use super::transport::FrameTransport;
use crate::frame::Frame;
use crate::metrics::{EngineMetrics, clients};

/// Longest a transport may take to close before it is dropped.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Outcome of offering a frame to one sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Queued for delivery.
    Queued,
    /// The sink was full; the frame is dropped for this client.
    Full,
    /// The delivery task is gone.
    Closed,
}

/// A bounded queue feeding exactly one delivery task.
#[derive(Debug)]
pub struct ClientSink {
    /// Client identifier
    pub id: ClientId,
    sender: mpsc::Sender<Frame>,
    connected_at: DateTime<Utc>,
    alive: AtomicBool,
    delivered: AtomicU64,
    dropped: AtomicU64,
    cancel: CancellationToken,
}

impl ClientSink {
    /// Create a sink with the given capacity and its receiving end.
    pub fn new(id: ClientId, capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let sink = Self {
            id,
            sender,
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        };
        (sink, receiver)
    }

    /// Non-blocking enqueue.
    pub fn offer(&self, frame: Frame) -> Offer {
        if !self.is_alive() {
            return Offer::Closed;
        }
        match self.sender.try_send(frame) {
            Ok(()) => Offer::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Offer::Full
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                Offer::Closed
            }
        }
    }

    /// Check if the sink still accepts frames
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the sink as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Stop accepting frames and abandon any in-flight delivery.
    pub fn close(&self) {
        self.mark_dead();
        self.cancel.cancel();
    }

    /// Snapshot of sink state
    pub fn info(&self) -> ClientInfo {
        ClientInfo {
            id: self.id,
            connected_at: self.connected_at,
            frames_delivered: self.delivered.load(Ordering::Relaxed),
            frames_dropped: self.dropped.load(Ordering::Relaxed),
            alive: self.is_alive(),
        }
    }
}

/// Serializable client state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client ID
    pub id: ClientId,
    /// Connected at
    pub connected_at: DateTime<Utc>,
    /// Frames written to the transport
    pub frames_delivered: u64,
    /// Frames dropped because the sink was full
    pub frames_dropped: u64,
    /// Is alive
    pub alive: bool,
}

/// Drain one sink into its transport, one frame in flight at a time.
///
/// Exits when the sink is closed or the transport fails; a transport failure
/// unregisters the client.
pub(crate) async fn deliver_loop<T: FrameTransport>(
    sink: Arc<ClientSink>,
    mut receiver: mpsc::Receiver<Frame>,
    mut transport: T,
    hub: Weak<BroadcastHub>,
    metrics: Arc<EngineMetrics>,
) {
    loop {
        let frame = tokio::select! {
            biased;
            _ = sink.cancel.cancelled() => break,
            frame = receiver.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        let result = tokio::select! {
            biased;
            _ = sink.cancel.cancelled() => break,
            result = transport.deliver(&frame) => result,
        };

        match result {
            Ok(()) => {
                sink.delivered.fetch_add(1, Ordering::Relaxed);
                clients::record_delivered(&metrics);
            }
            Err(e) => {
                debug!(client_id = %sink.id, error = %e, "Delivery failed, disconnecting client");
                break;
            }
        }
    }

    sink.mark_dead();
    receiver.close();
    if tokio::time::timeout(CLOSE_TIMEOUT, transport.close()).await.is_err() {
        debug!(client_id = %sink.id, "Transport close timed out, dropping it");
    }
    drop(transport);

    if let Some(hub) = hub.upgrade() {
        hub.unregister_client(sink.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hostpulse_core::AppResult;

    fn frame(sequence: u64) -> Frame {
        Frame::new(sequence, Utc::now(), Duration::ZERO, vec![sequence as u8])
    }

    #[test]
    fn test_offer_full_drops_newest() {
        let (sink, mut rx) = ClientSink::new(ClientId::new(), 2);
        assert_eq!(sink.offer(frame(1)), Offer::Queued);
        assert_eq!(sink.offer(frame(2)), Offer::Queued);
        assert_eq!(sink.offer(frame(3)), Offer::Full);
        assert_eq!(sink.info().frames_dropped, 1);

        assert_eq!(rx.try_recv().map(|f| f.sequence()).ok(), Some(1));
        assert_eq!(rx.try_recv().map(|f| f.sequence()).ok(), Some(2));
    }

    #[test]
    fn test_offer_after_close() {
        let (sink, _rx) = ClientSink::new(ClientId::new(), 2);
        sink.close();
        assert_eq!(sink.offer(frame(1)), Offer::Closed);
        assert!(!sink.info().alive);
    }

    #[test]
    fn test_offer_after_receiver_dropped() {
        let (sink, rx) = ClientSink::new(ClientId::new(), 2);
        drop(rx);
        assert_eq!(sink.offer(frame(1)), Offer::Closed);
        assert!(!sink.is_alive());
    }

    /// Never finishes a write or a close; flags its own drop.
    struct WedgedTransport {
        released: Arc<AtomicBool>,
    }

    impl Drop for WedgedTransport {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl FrameTransport for WedgedTransport {
        async fn deliver(&mut self, _frame: &Frame) -> AppResult<()> {
            std::future::pending::<()>().await;
            Ok(())
        }

        async fn close(&mut self) {
            std::future::pending::<()>().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wedged_transport_released_after_unregister() {
        let metrics = Arc::new(EngineMetrics::new());
        let hub = BroadcastHub::new(2, metrics);
        let released = Arc::new(AtomicBool::new(false));
        let handle = hub.register_client(WedgedTransport {
            released: released.clone(),
        });

        hub.publish(frame(1));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.unregister());
        assert!(!released.load(Ordering::SeqCst));

        tokio::time::sleep(CLOSE_TIMEOUT + Duration::from_millis(100)).await;
        assert!(released.load(Ordering::SeqCst));
    }
}

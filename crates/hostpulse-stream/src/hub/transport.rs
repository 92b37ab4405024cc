//! Client transport abstraction.

use async_trait::async_trait;
use tokio::sync::mpsc;

use hostpulse_core::{AppError, AppResult};

use crate::frame::Frame;

/// Ordered, byte-oriented delivery channel to one consumer.
///
/// The hub never calls `deliver` concurrently for the same client.
#[async_trait]
pub trait FrameTransport: Send + 'static {
    /// Write one frame. An error unregisters the client.
    async fn deliver(&mut self, frame: &Frame) -> AppResult<()>;

    /// Called once after the last delivery.
    async fn close(&mut self) {}
}

/// In-process transport forwarding frames into a channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Frame>,
}

impl ChannelTransport {
    /// Create a transport and the receiving end for the consumer.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl FrameTransport for ChannelTransport {
    async fn deliver(&mut self, frame: &Frame) -> AppResult<()> {
        self.tx
            .send(frame.clone())
            .await
            .map_err(|_| AppError::transport("Consumer channel closed"))
    }
}

//! Broadcast hub: client registration, lifecycle edges, and frame fan-out.

use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};

use serde::Serialize;
use tracing::{debug, info};

use hostpulse_core::types::ClientId;

use super::lifecycle::{LifecycleEvent, LifecycleListener};
use super::registry::ClientRegistry;
use super::sink::{ClientInfo, ClientSink, Offer, deliver_loop};
use super::transport::FrameTransport;
use crate::frame::Frame;
use crate::metrics::{EngineMetrics, clients};

/// Per-publish outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Sinks that accepted the frame.
    pub queued: usize,
    /// Sinks that were full.
    pub dropped: usize,
}

/// Handle returned by [`BroadcastHub::register_client`].
///
/// Does not keep the hub alive; unregistering after the hub is gone is a
/// no-op.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ClientId,
    hub: Weak<BroadcastHub>,
}

impl ClientHandle {
    /// Client identifier.
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Remove this client. Returns `false` if it was already removed.
    pub fn unregister(&self) -> bool {
        self.hub
            .upgrade()
            .is_some_and(|hub| hub.unregister_client(self.id))
    }
}

/// Fan-out registry distributing each frame to every registered sink.
pub struct BroadcastHub {
    registry: ClientRegistry,
    /// Serializes register/unregister so edge events fire exactly once.
    membership: Mutex<()>,
    listeners: RwLock<Vec<Arc<dyn LifecycleListener>>>,
    sink_capacity: usize,
    metrics: Arc<EngineMetrics>,
    self_ref: Weak<BroadcastHub>,
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("clients", &self.registry.len())
            .field("sink_capacity", &self.sink_capacity)
            .finish()
    }
}

impl BroadcastHub {
    /// Creates a hub whose sinks hold `sink_capacity` frames each.
    pub fn new(sink_capacity: usize, metrics: Arc<EngineMetrics>) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            registry: ClientRegistry::new(),
            membership: Mutex::new(()),
            listeners: RwLock::new(Vec::new()),
            sink_capacity: sink_capacity.max(1),
            metrics,
            self_ref: self_ref.clone(),
        })
    }

    /// Add a listener for client-count edges.
    pub fn subscribe_lifecycle(&self, listener: Arc<dyn LifecycleListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    /// Register a consumer and spawn its delivery task.
    ///
    /// Emits [`LifecycleEvent::FirstClientConnected`] when this is the only
    /// client. Must be called from within a Tokio runtime.
    pub fn register_client<T: FrameTransport>(&self, transport: T) -> ClientHandle {
        let (sink, receiver) = ClientSink::new(ClientId::new(), self.sink_capacity);
        let sink = Arc::new(sink);
        let id = sink.id;

        let count = {
            let _guard = self.lock_membership();
            let first = self.registry.is_empty();
            self.registry.insert(sink.clone());
            clients::record_connect(&self.metrics);
            if first {
                self.emit(LifecycleEvent::FirstClientConnected);
            }
            self.registry.len()
        };

        tokio::spawn(deliver_loop(
            sink,
            receiver,
            transport,
            self.self_ref.clone(),
            self.metrics.clone(),
        ));

        info!(client_id = %id, clients = count, "Client registered");

        ClientHandle {
            id,
            hub: self.self_ref.clone(),
        }
    }

    /// Remove a client. Idempotent: returns `false` if it was not registered.
    ///
    /// Emits [`LifecycleEvent::LastClientDisconnected`] when no client remains.
    pub fn unregister_client(&self, id: ClientId) -> bool {
        let (removed, count) = {
            let _guard = self.lock_membership();
            let removed = self.registry.remove(&id);
            if removed.is_some() {
                clients::record_disconnect(&self.metrics);
                if self.registry.is_empty() {
                    self.emit(LifecycleEvent::LastClientDisconnected);
                }
            }
            (removed, self.registry.len())
        };

        match removed {
            Some(sink) => {
                sink.close();
                info!(client_id = %id, clients = count, "Client unregistered");
                true
            }
            None => false,
        }
    }

    /// Offer a frame to every registered sink without blocking.
    pub fn publish(&self, frame: Frame) -> PublishReport {
        let mut report = PublishReport::default();

        for sink in self.registry.snapshot() {
            match sink.offer(frame.clone()) {
                Offer::Queued => report.queued += 1,
                Offer::Full => {
                    report.dropped += 1;
                    clients::record_sink_drop(&self.metrics);
                    debug!(client_id = %sink.id, frame = frame.sequence(), "Sink full, dropping frame");
                }
                Offer::Closed => {}
            }
        }

        report
    }

    /// Unregister every client. Returns how many were removed.
    pub fn close_all(&self) -> usize {
        self.registry
            .ids()
            .into_iter()
            .filter(|id| self.unregister_client(*id))
            .count()
    }

    /// Number of registered clients.
    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    /// Snapshot of every registered client.
    pub fn clients(&self) -> Vec<ClientInfo> {
        self.registry.snapshot().iter().map(|s| s.info()).collect()
    }

    fn lock_membership(&self) -> MutexGuard<'_, ()> {
        self.membership.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: LifecycleEvent) {
        info!(event = ?event, "Client lifecycle edge");
        let listeners = self.listeners.read().unwrap_or_else(|e| e.into_inner());
        for listener in listeners.iter() {
            listener.on_lifecycle(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::transport::ChannelTransport;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn frame(sequence: u64) -> Frame {
        Frame::new(sequence, Utc::now(), Duration::ZERO, vec![0u8])
    }

    fn hub_with_events() -> (Arc<BroadcastHub>, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let hub = BroadcastHub::new(2, Arc::new(EngineMetrics::new()));
        let (tx, rx) = mpsc::unbounded_channel();
        hub.subscribe_lifecycle(Arc::new(tx));
        (hub, rx)
    }

    #[tokio::test]
    async fn test_edges_fire_once() {
        let (hub, mut events) = hub_with_events();
        let (t1, _r1) = ChannelTransport::new(4);
        let (t2, _r2) = ChannelTransport::new(4);

        let a = hub.register_client(t1);
        let b = hub.register_client(t2);
        assert_eq!(events.try_recv().ok(), Some(LifecycleEvent::FirstClientConnected));
        assert!(events.try_recv().is_err());

        assert!(a.unregister());
        assert!(events.try_recv().is_err());
        assert!(b.unregister());
        assert_eq!(events.try_recv().ok(), Some(LifecycleEvent::LastClientDisconnected));
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let (hub, mut events) = hub_with_events();
        let (transport, _rx) = ChannelTransport::new(4);
        let handle = hub.register_client(transport);
        let _ = events.try_recv();

        assert!(handle.unregister());
        assert!(!handle.unregister());
        assert!(!hub.unregister_client(handle.id()));
        assert_eq!(events.try_recv().ok(), Some(LifecycleEvent::LastClientDisconnected));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_reaches_client() {
        let (hub, _events) = hub_with_events();
        let (transport, mut rx) = ChannelTransport::new(4);
        let _handle = hub.register_client(transport);

        let report = hub.publish(frame(1));
        assert_eq!(report.queued, 1);
        let received = rx.recv().await.expect("frame");
        assert_eq!(received.sequence(), 1);
    }

    #[tokio::test]
    async fn test_close_all() {
        let (hub, mut events) = hub_with_events();
        let (t1, _r1) = ChannelTransport::new(1);
        let (t2, _r2) = ChannelTransport::new(1);
        hub.register_client(t1);
        hub.register_client(t2);

        assert_eq!(hub.close_all(), 2);
        assert_eq!(hub.client_count(), 0);
        let _ = events.try_recv();
        assert_eq!(events.try_recv().ok(), Some(LifecycleEvent::LastClientDisconnected));
    }

    #[tokio::test]
    async fn test_handle_outlives_hub() {
        let (hub, _events) = hub_with_events();
        let (transport, _rx) = ChannelTransport::new(1);
        let handle = hub.register_client(transport);
        hub.close_all();
        drop(hub);
        assert!(!handle.unregister());
    }
}

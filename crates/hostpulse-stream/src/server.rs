//! Top-level stream engine that ties the hub and the controller together.

use std::sync::{Arc, Weak};

use tracing::info;

use hostpulse_core::config::{CollectionConfig, StreamConfig};
use hostpulse_core::traits::Collector;

use crate::engine::{EngineController, EngineState};
use crate::hub::{BroadcastHub, LifecycleEvent, LifecycleListener};
use crate::metrics::{EngineMetrics, MetricsSnapshot};

/// Drives the controller from hub edges.
///
/// Holds the controller weakly so the hub does not keep it alive.
#[derive(Debug)]
pub struct ControllerLink(Weak<EngineController>);

impl ControllerLink {
    /// Link to a controller.
    pub fn new(controller: &Arc<EngineController>) -> Self {
        Self(Arc::downgrade(controller))
    }
}

impl LifecycleListener for ControllerLink {
    fn on_lifecycle(&self, event: LifecycleEvent) {
        let Some(controller) = self.0.upgrade() else {
            return;
        };
        match event {
            LifecycleEvent::FirstClientConnected => {
                controller.start();
            }
            LifecycleEvent::LastClientDisconnected => {
                controller.stop();
            }
        }
    }
}

/// Application context for the streaming engine.
#[derive(Clone)]
pub struct StreamEngine {
    /// Client fan-out.
    pub hub: Arc<BroadcastHub>,
    /// Collection loop owner.
    pub controller: Arc<EngineController>,
    /// Shared counters.
    pub metrics: Arc<EngineMetrics>,
}

impl std::fmt::Debug for StreamEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamEngine").finish()
    }
}

impl StreamEngine {
    /// Creates a stopped engine whose lifecycle follows client presence.
    pub fn new(
        collection: CollectionConfig,
        stream: &StreamConfig,
        collectors: Vec<Arc<dyn Collector>>,
    ) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        let hub = BroadcastHub::new(stream.sink_buffer_capacity, metrics.clone());
        let controller = Arc::new(EngineController::new(
            collectors,
            hub.clone(),
            collection,
            metrics.clone(),
        ));
        hub.subscribe_lifecycle(Arc::new(ControllerLink::new(&controller)));

        info!(
            collectors = controller.collectors().len(),
            sink_capacity = stream.sink_buffer_capacity,
            "Stream engine initialized"
        );

        Self {
            hub,
            controller,
            metrics,
        }
    }

    /// Current engine state.
    pub fn state(&self) -> EngineState {
        self.controller.state()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Unregister every client and stop collection.
    pub fn shutdown(&self) {
        info!("Shutting down stream engine");
        let closed = self.hub.close_all();
        self.controller.stop();
        info!(clients = closed, "Stream engine shut down");
    }
}

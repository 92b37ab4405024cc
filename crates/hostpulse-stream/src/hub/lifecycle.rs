//! Client-count edge events.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Emitted only on 0→1 and 1→0 client-count transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// The first client registered.
    FirstClientConnected,
    /// The last client unregistered.
    LastClientDisconnected,
}

/// Synchronous consumer of lifecycle events.
///
/// Called while the hub's membership lock is held, so implementations must
/// not register or unregister clients and must return quickly.
pub trait LifecycleListener: Send + Sync {
    /// Handle one edge.
    fn on_lifecycle(&self, event: LifecycleEvent);
}

impl LifecycleListener for mpsc::UnboundedSender<LifecycleEvent> {
    fn on_lifecycle(&self, event: LifecycleEvent) {
        let _ = self.send(event);
    }
}

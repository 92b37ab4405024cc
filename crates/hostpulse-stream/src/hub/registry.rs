//! Client registry: all live sinks indexed by client ID.

use std::sync::Arc;

use dashmap::DashMap;

use hostpulse_core::types::ClientId;

use super::sink::ClientSink;

/// Thread-safe map of registered sinks.
///
/// Membership changes go through the hub, which serializes them; readers
/// take point-in-time snapshots.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    by_id: DashMap<ClientId, Arc<ClientSink>>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink.
    pub fn insert(&self, sink: Arc<ClientSink>) {
        self.by_id.insert(sink.id, sink);
    }

    /// Removes a sink, returning it if it was present.
    pub fn remove(&self, id: &ClientId) -> Option<Arc<ClientSink>> {
        self.by_id.remove(id).map(|(_, sink)| sink)
    }

    /// Gets a sink by ID.
    pub fn get(&self, id: &ClientId) -> Option<Arc<ClientSink>> {
        self.by_id.get(id).map(|entry| entry.value().clone())
    }

    /// Stable copy of all sinks for one broadcast.
    pub fn snapshot(&self) -> Vec<Arc<ClientSink>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// All registered client IDs.
    pub fn ids(&self) -> Vec<ClientId> {
        self.by_id.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no client is registered.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let registry = ClientRegistry::new();
        let (sink, _rx) = ClientSink::new(ClientId::new(), 2);
        let id = sink.id;
        registry.insert(Arc::new(sink));

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&id).is_some());
        assert!(registry.remove(&id).is_some());
        assert!(registry.remove(&id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = ClientRegistry::new();
        let (sink, _rx) = ClientSink::new(ClientId::new(), 2);
        let id = sink.id;
        registry.insert(Arc::new(sink));

        let snapshot = registry.snapshot();
        registry.remove(&id);
        assert_eq!(snapshot.len(), 1);
        assert!(registry.snapshot().is_empty());
    }
}

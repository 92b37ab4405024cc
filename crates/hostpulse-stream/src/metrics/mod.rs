//! Engine metrics.
//!
//! Every drop the engine performs is counted here; nothing is surfaced as an
//! error to producers or other clients.

pub mod clients;
pub mod pipeline;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Ticks started by the collection loop
    pub ticks_scheduled: AtomicU64,
    /// Ticks assembled by the join stage
    pub ticks_joined: AtomicU64,
    /// Frames handed to the broadcast hub
    pub frames_published: AtomicU64,
    /// Items rejected by a full source buffer
    pub source_drops: AtomicU64,
    /// Items discarded because their tick could no longer complete
    pub stale_items_discarded: AtomicU64,
    /// Collector errors, panics, and timeouts
    pub collector_failures: AtomicU64,
    /// Ticks whose collection took longer than the interval
    pub collection_overruns: AtomicU64,
    /// Ticks dropped because encoding failed
    pub encode_failures: AtomicU64,
    /// Frames dropped for a client because its sink was full
    pub sink_drops: AtomicU64,
    /// Frames written to client transports
    pub frames_delivered: AtomicU64,
    /// Clients ever registered
    pub clients_total: AtomicU64,
    /// Clients currently registered
    pub clients_active: AtomicU64,
    /// Stopped → Running transitions
    pub engine_starts: AtomicU64,
    /// Running → Stopped transitions
    pub engine_stops: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks_scheduled: self.ticks_scheduled.load(Ordering::Relaxed),
            ticks_joined: self.ticks_joined.load(Ordering::Relaxed),
            frames_published: self.frames_published.load(Ordering::Relaxed),
            source_drops: self.source_drops.load(Ordering::Relaxed),
            stale_items_discarded: self.stale_items_discarded.load(Ordering::Relaxed),
            collector_failures: self.collector_failures.load(Ordering::Relaxed),
            collection_overruns: self.collection_overruns.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            sink_drops: self.sink_drops.load(Ordering::Relaxed),
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            clients_total: self.clients_total.load(Ordering::Relaxed),
            clients_active: self.clients_active.load(Ordering::Relaxed),
            engine_starts: self.engine_starts.load(Ordering::Relaxed),
            engine_stops: self.engine_stops.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Ticks started by the collection loop
    pub ticks_scheduled: u64,
    /// Ticks assembled by the join stage
    pub ticks_joined: u64,
    /// Frames handed to the broadcast hub
    pub frames_published: u64,
    /// Items rejected by a full source buffer
    pub source_drops: u64,
    /// Items discarded because their tick could no longer complete
    pub stale_items_discarded: u64,
    /// Collector errors, panics, and timeouts
    pub collector_failures: u64,
    /// Ticks whose collection took longer than the interval
    pub collection_overruns: u64,
    /// Ticks dropped because encoding failed
    pub encode_failures: u64,
    /// Frames dropped for a client because its sink was full
    pub sink_drops: u64,
    /// Frames written to client transports
    pub frames_delivered: u64,
    /// Clients ever registered
    pub clients_total: u64,
    /// Clients currently registered
    pub clients_active: u64,
    /// Stopped → Running transitions
    pub engine_starts: u64,
    /// Running → Stopped transitions
    pub engine_stops: u64,
}

//! Collection pipeline metrics helpers.

use std::sync::atomic::Ordering;

use super::EngineMetrics;

/// Record a tick started by the collection loop
pub fn record_tick_scheduled(metrics: &EngineMetrics) {
    metrics.ticks_scheduled.fetch_add(1, Ordering::Relaxed);
}

/// Record a tick assembled by the join stage
pub fn record_tick_joined(metrics: &EngineMetrics) {
    metrics.ticks_joined.fetch_add(1, Ordering::Relaxed);
}

/// Record a frame handed to the hub
pub fn record_published(metrics: &EngineMetrics) {
    metrics.frames_published.fetch_add(1, Ordering::Relaxed);
}

/// Record an item rejected by a full source buffer
pub fn record_source_drop(metrics: &EngineMetrics) {
    metrics.source_drops.fetch_add(1, Ordering::Relaxed);
}

/// Record an item discarded by the join stage
pub fn record_stale(metrics: &EngineMetrics) {
    metrics.stale_items_discarded.fetch_add(1, Ordering::Relaxed);
}

/// Record a collector error, panic, or timeout
pub fn record_collector_failure(metrics: &EngineMetrics) {
    metrics.collector_failures.fetch_add(1, Ordering::Relaxed);
}

/// Record a tick that ran past the interval
pub fn record_overrun(metrics: &EngineMetrics) {
    metrics.collection_overruns.fetch_add(1, Ordering::Relaxed);
}

/// Record a tick dropped at encode time
pub fn record_encode_failure(metrics: &EngineMetrics) {
    metrics.encode_failures.fetch_add(1, Ordering::Relaxed);
}

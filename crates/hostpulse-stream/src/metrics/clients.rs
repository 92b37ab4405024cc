//! Client and lifecycle metrics helpers.

use std::sync::atomic::Ordering;

use super::EngineMetrics;

/// Record a new client registration
pub fn record_connect(metrics: &EngineMetrics) {
    metrics.clients_total.fetch_add(1, Ordering::Relaxed);
    metrics.clients_active.fetch_add(1, Ordering::Relaxed);
}

/// Record a client removal
pub fn record_disconnect(metrics: &EngineMetrics) {
    metrics.clients_active.fetch_sub(1, Ordering::Relaxed);
}

/// Record a frame dropped for one client
pub fn record_sink_drop(metrics: &EngineMetrics) {
    metrics.sink_drops.fetch_add(1, Ordering::Relaxed);
}

/// Record a frame written to a client transport
pub fn record_delivered(metrics: &EngineMetrics) {
    metrics.frames_delivered.fetch_add(1, Ordering::Relaxed);
}

/// Record an engine start
pub fn record_engine_start(metrics: &EngineMetrics) {
    metrics.engine_starts.fetch_add(1, Ordering::Relaxed);
}

/// Record an engine stop
pub fn record_engine_stop(metrics: &EngineMetrics) {
    metrics.engine_stops.fetch_add(1, Ordering::Relaxed);
}

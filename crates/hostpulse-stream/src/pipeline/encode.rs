//! Encode stage: tick to immutable frame.

use std::time::Duration;

use chrono::{DateTime, Utc};

use hostpulse_core::AppResult;
use hostpulse_core::types::{MetricSnapshot, MetricValue};

use super::join::Tick;
use crate::frame::Frame;

/// Serialize a tick into a frame, computing derived aggregates.
pub fn encode_tick(tick: &Tick, timestamp: DateTime<Utc>, collection: Duration) -> AppResult<Frame> {
    let snapshot = build_snapshot(tick, timestamp, collection);
    let payload = snapshot.to_msgpack()?;
    Ok(Frame::new(tick.sequence, timestamp, collection, payload))
}

/// Flatten a tick into the wire snapshot.
pub fn build_snapshot(tick: &Tick, timestamp: DateTime<Utc>, collection: Duration) -> MetricSnapshot {
    let mut snapshot = MetricSnapshot {
        sequence: tick.sequence,
        timestamp_ms: timestamp.timestamp_millis(),
        collection_ms: collection.as_secs_f64() * 1000.0,
        ..Default::default()
    };

    for (category, value) in &tick.values {
        let Some(value) = value else {
            snapshot.missing.push(category.as_str().to_string());
            continue;
        };
        match value {
            MetricValue::Cpu(cpu) => {
                snapshot.cpu_total = average(cpu.loads.iter().copied());
                snapshot.cpu_loads = cpu.loads.clone();
            }
            MetricValue::Ram(ram) => {
                let mut ram = *ram;
                ram.used_percent = percent(ram.used_bytes, ram.total_bytes);
                snapshot.ram = ram;
            }
            MetricValue::Gpu(gpus) => {
                snapshot.gpu_total = average(gpus.iter().map(|g| g.load_percent));
                snapshot.gpus = gpus.clone();
            }
            MetricValue::Network(networks) => snapshot.networks = networks.clone(),
            MetricValue::Disk(disks) => snapshot.disks = disks.clone(),
            MetricValue::Temperature(temps) => snapshot.temperatures = temps.clone(),
            MetricValue::Containers(containers) => snapshot.containers = containers.clone(),
        }
    }

    snapshot
}

fn average(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0f32, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f32 }
}

fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 100.0) as f32
    }
}

//! Per-stream rolling windows fed from decoded snapshots.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use hostpulse_core::types::MetricSnapshot;

use crate::window::RollingWindow;

/// Identifies one plotted series.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamKey {
    CpuTotal,
    CpuCore(usize),
    RamUsedPercent,
    GpuTotal,
    NetworkRx(String),
    NetworkTx(String),
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CpuTotal => write!(f, "cpu"),
            Self::CpuCore(core) => write!(f, "cpu{core}"),
            Self::RamUsedPercent => write!(f, "ram%"),
            Self::GpuTotal => write!(f, "gpu"),
            Self::NetworkRx(name) => write!(f, "{name}.rx"),
            Self::NetworkTx(name) => write!(f, "{name}.tx"),
        }
    }
}

/// Min, mean, and max over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowStats {
    pub min: f32,
    pub avg: f32,
    pub max: f32,
}

impl WindowStats {
    /// `None` for an empty window.
    pub fn of(window: &RollingWindow<f32>) -> Option<Self> {
        if window.is_empty() {
            return None;
        }
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0;
        for &value in window {
            min = min.min(value);
            max = max.max(value);
            sum += value;
        }
        Some(Self {
            min,
            avg: sum / window.len() as f32,
            max,
        })
    }
}

/// One window per stream, created on first sight.
#[derive(Debug)]
pub struct MetricStore {
    capacity: usize,
    windows: BTreeMap<StreamKey, RollingWindow<f32>>,
    frames: u64,
}

impl MetricStore {
    /// Every window gets `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            windows: BTreeMap::new(),
            frames: 0,
        }
    }

    /// Append every stream present in `snapshot`.
    ///
    /// Categories listed as missing contribute nothing, so their windows
    /// simply fall behind for that tick.
    pub fn ingest(&mut self, snapshot: &MetricSnapshot) {
        self.frames += 1;
        let missing = |name: &str| snapshot.missing.iter().any(|m| m == name);

        if !missing("cpu") && !snapshot.cpu_loads.is_empty() {
            self.push(StreamKey::CpuTotal, snapshot.cpu_total);
            for (core, load) in snapshot.cpu_loads.iter().enumerate() {
                self.push(StreamKey::CpuCore(core), *load);
            }
        }
        if !missing("ram") && snapshot.ram.total_bytes > 0 {
            self.push(StreamKey::RamUsedPercent, snapshot.ram.used_percent);
        }
        if !missing("gpu") && !snapshot.gpus.is_empty() {
            self.push(StreamKey::GpuTotal, snapshot.gpu_total);
        }
        if !missing("network") {
            for iface in &snapshot.networks {
                self.push(
                    StreamKey::NetworkRx(iface.name.clone()),
                    iface.rx_bytes_per_sec as f32,
                );
                self.push(
                    StreamKey::NetworkTx(iface.name.clone()),
                    iface.tx_bytes_per_sec as f32,
                );
            }
        }
    }

    fn push(&mut self, key: StreamKey, value: f32) {
        let capacity = self.capacity;
        self.windows
            .entry(key)
            .or_insert_with(|| RollingWindow::new(capacity))
            .push(value);
    }

    /// Window for one stream, if it has been seen.
    pub fn window(&self, key: &StreamKey) -> Option<&RollingWindow<f32>> {
        self.windows.get(key)
    }

    /// Summary of one stream.
    pub fn stats(&self, key: &StreamKey) -> Option<WindowStats> {
        self.window(key).and_then(WindowStats::of)
    }

    /// All known streams in key order.
    pub fn streams(&self) -> impl Iterator<Item = (&StreamKey, &RollingWindow<f32>)> {
        self.windows.iter()
    }

    /// Snapshots ingested so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every value but keep the known streams.
    pub fn clear(&mut self) {
        for window in self.windows.values_mut() {
            window.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostpulse_core::types::{GpuSample, NetworkSample, RamSample};

    fn snapshot(sequence: u64, loads: Vec<f32>) -> MetricSnapshot {
        let cpu_total = loads.iter().sum::<f32>() / loads.len() as f32;
        MetricSnapshot {
            sequence,
            cpu_loads: loads,
            cpu_total,
            ram: RamSample {
                total_bytes: 100,
                used_bytes: 40,
                used_percent: 40.0,
                ..Default::default()
            },
            networks: vec![NetworkSample {
                name: "eth0".to_string(),
                rx_bytes_per_sec: 1024.0,
                tx_bytes_per_sec: 512.0,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_ingest_creates_windows_lazily() {
        let mut store = MetricStore::new(3);
        assert!(store.window(&StreamKey::CpuTotal).is_none());

        store.ingest(&snapshot(1, vec![10.0, 30.0]));
        assert_eq!(store.window(&StreamKey::CpuTotal).map(|w| w.latest()), Some(20.0));
        assert_eq!(store.window(&StreamKey::CpuCore(1)).map(|w| w.latest()), Some(30.0));
        assert_eq!(
            store.window(&StreamKey::RamUsedPercent).map(|w| w.latest()),
            Some(40.0)
        );
        assert_eq!(
            store.window(&StreamKey::NetworkTx("eth0".into())).map(|w| w.latest()),
            Some(512.0)
        );
        // No GPU reported, no GPU window.
        assert!(store.window(&StreamKey::GpuTotal).is_none());
        assert_eq!(store.frames(), 1);
    }

    #[test]
    fn test_windows_roll_at_capacity() {
        let mut store = MetricStore::new(2);
        for (seq, load) in [10.0, 20.0, 30.0].into_iter().enumerate() {
            store.ingest(&snapshot(seq as u64, vec![load]));
        }
        let stats = store.stats(&StreamKey::CpuTotal).unwrap();
        assert_eq!(stats.min, 20.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.avg, 25.0);
        assert_eq!(store.window(&StreamKey::CpuTotal).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_category_is_skipped() {
        let mut store = MetricStore::new(4);
        store.ingest(&snapshot(1, vec![50.0]));

        let mut gap = snapshot(2, vec![60.0]);
        gap.ram = RamSample::default();
        gap.missing = vec!["ram".to_string()];
        store.ingest(&gap);

        assert_eq!(store.window(&StreamKey::RamUsedPercent).unwrap().len(), 1);
        assert_eq!(store.window(&StreamKey::CpuTotal).unwrap().len(), 2);
    }

    #[test]
    fn test_gpu_total_tracked_when_present() {
        let mut store = MetricStore::new(4);
        let mut snap = snapshot(1, vec![1.0]);
        snap.gpus = vec![GpuSample {
            name: "gpu0".to_string(),
            load_percent: 70.0,
            ..Default::default()
        }];
        snap.gpu_total = 70.0;
        store.ingest(&snap);
        assert_eq!(store.stats(&StreamKey::GpuTotal).unwrap().max, 70.0);
    }

    #[test]
    fn test_stream_key_labels() {
        assert_eq!(StreamKey::CpuCore(3).to_string(), "cpu3");
        assert_eq!(StreamKey::NetworkRx("wlan0".into()).to_string(), "wlan0.rx");
    }
}

//! Wire snapshot: the payload of every binary frame.
//!
//! Frames are MessagePack maps with PascalCase keys so that any
//! MessagePack client can read e.g. `TimestampMs` and `CpuLoads` by name.

use serde::{Deserialize, Serialize};

use super::sample::{
    ContainerSample, DiskSample, GpuSample, NetworkSample, RamSample, TemperatureSample,
};
use crate::result::AppResult;

/// One time-aligned snapshot of every configured metric category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MetricSnapshot {
    /// Tick sequence number within one engine run.
    pub sequence: u64,
    /// Wall-clock Unix milliseconds at tick start.
    pub timestamp_ms: i64,
    /// Duration of the slowest collector for this tick.
    pub collection_ms: f64,
    /// Per-core CPU load in percent.
    pub cpu_loads: Vec<f32>,
    /// Average of `cpu_loads`.
    pub cpu_total: f32,
    /// Memory usage.
    pub ram: RamSample,
    /// GPU devices.
    pub gpus: Vec<GpuSample>,
    /// Average GPU load.
    pub gpu_total: f32,
    /// Network interfaces.
    pub networks: Vec<NetworkSample>,
    /// Mounted disks.
    pub disks: Vec<DiskSample>,
    /// Temperature sensors.
    pub temperatures: Vec<TemperatureSample>,
    /// Running containers.
    pub containers: Vec<ContainerSample>,
    /// Categories whose collector failed for this tick.
    pub missing: Vec<String>,
}

impl MetricSnapshot {
    /// Serialize as a MessagePack map.
    pub fn to_msgpack(&self) -> AppResult<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Deserialize from a MessagePack frame payload.
    pub fn from_msgpack(bytes: &[u8]) -> AppResult<Self> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msgpack_uses_named_keys() {
        let snapshot = MetricSnapshot {
            timestamp_ms: 1_700_000_000_000,
            cpu_loads: vec![12.5, 50.0],
            ..Default::default()
        };
        let bytes = snapshot.to_msgpack().expect("encode");

        // Decode as a generic map to check the keys a foreign client sees.
        let generic: serde_json::Value = rmp_serde::from_slice(&bytes).expect("generic decode");
        assert_eq!(generic["TimestampMs"], 1_700_000_000_000i64);
        assert_eq!(generic["CpuLoads"][1], 50.0);

        let decoded = MetricSnapshot::from_msgpack(&bytes).expect("decode");
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(MetricSnapshot::from_msgpack(&[0xc1, 0x00]).is_err());
    }
}

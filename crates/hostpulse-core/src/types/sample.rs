//! Values produced by one collector invocation.
//!
//! Field names are serialized in PascalCase because these structs are
//! embedded verbatim in the MessagePack wire snapshot.

use serde::{Deserialize, Serialize};

use super::category::MetricCategory;

/// Per-core CPU load, in percent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuSample {
    /// One entry per logical core.
    pub loads: Vec<f32>,
}

/// Physical memory and swap usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RamSample {
    /// Installed memory.
    pub total_bytes: u64,
    /// Memory in use.
    pub used_bytes: u64,
    /// Configured swap.
    pub swap_total_bytes: u64,
    /// Swap in use.
    pub swap_used_bytes: u64,
    /// Derived at encode time.
    pub used_percent: f32,
}

/// One GPU device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GpuSample {
    /// Device name.
    pub name: String,
    /// Utilization in percent.
    pub load_percent: f32,
    /// VRAM in use.
    pub memory_used_bytes: u64,
    /// Installed VRAM.
    pub memory_total_bytes: u64,
    /// Core temperature, if reported.
    pub temperature_c: Option<f32>,
}

/// One network interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NetworkSample {
    /// Interface name.
    pub name: String,
    /// Receive rate since the previous read.
    pub rx_bytes_per_sec: f64,
    /// Transmit rate since the previous read.
    pub tx_bytes_per_sec: f64,
    /// Bytes received since boot.
    pub rx_total_bytes: u64,
    /// Bytes transmitted since boot.
    pub tx_total_bytes: u64,
}

/// One mounted disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DiskSample {
    /// Device name.
    pub name: String,
    /// Mount point.
    pub mount_point: String,
    /// Capacity.
    pub total_bytes: u64,
    /// Free space available to unprivileged users.
    pub available_bytes: u64,
    /// Read rate since the previous read.
    pub read_bytes_per_sec: f64,
    /// Write rate since the previous read.
    pub write_bytes_per_sec: f64,
}

/// One temperature sensor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TemperatureSample {
    /// Sensor label.
    pub label: String,
    /// Reading in degrees Celsius.
    pub celsius: f32,
}

/// One running container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerSample {
    /// Short container ID.
    pub id: String,
    /// Container name.
    pub name: String,
    /// CPU usage in percent of one core.
    pub cpu_percent: f32,
    /// Memory in use.
    pub memory_used_bytes: u64,
    /// Memory limit.
    pub memory_limit_bytes: u64,
}

/// The value of one category for one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// CPU loads.
    Cpu(CpuSample),
    /// Memory usage.
    Ram(RamSample),
    /// One entry per GPU.
    Gpu(Vec<GpuSample>),
    /// One entry per interface.
    Network(Vec<NetworkSample>),
    /// One entry per disk.
    Disk(Vec<DiskSample>),
    /// One entry per sensor.
    Temperature(Vec<TemperatureSample>),
    /// One entry per container.
    Containers(Vec<ContainerSample>),
}

impl MetricValue {
    /// The category this value belongs to.
    pub fn category(&self) -> MetricCategory {
        match self {
            Self::Cpu(_) => MetricCategory::Cpu,
            Self::Ram(_) => MetricCategory::Ram,
            Self::Gpu(_) => MetricCategory::Gpu,
            Self::Network(_) => MetricCategory::Network,
            Self::Disk(_) => MetricCategory::Disk,
            Self::Temperature(_) => MetricCategory::Temperature,
            Self::Containers(_) => MetricCategory::Containers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_category() {
        assert_eq!(
            MetricValue::Cpu(CpuSample { loads: vec![1.0] }).category(),
            MetricCategory::Cpu
        );
        assert_eq!(
            MetricValue::Containers(Vec::new()).category(),
            MetricCategory::Containers
        );
    }

    #[test]
    fn test_pascal_case_field_names() {
        let json = serde_json::to_value(NetworkSample {
            name: "eth0".into(),
            ..Default::default()
        })
        .expect("serialize");
        assert_eq!(json["Name"], "eth0");
        assert!(json.get("RxBytesPerSec").is_some());
    }
}

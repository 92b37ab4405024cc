//! Metric categories: one source buffer and one collector per category.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A category of host metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    /// Per-core CPU load.
    Cpu,
    /// Physical memory and swap.
    Ram,
    /// GPU load and memory.
    Gpu,
    /// Per-interface network throughput.
    Network,
    /// Per-device disk space and throughput.
    Disk,
    /// Hardware sensor temperatures.
    Temperature,
    /// Container resource usage.
    Containers,
}

impl MetricCategory {
    /// All categories in wire order.
    pub const ALL: [MetricCategory; 7] = [
        Self::Cpu,
        Self::Ram,
        Self::Gpu,
        Self::Network,
        Self::Disk,
        Self::Temperature,
        Self::Containers,
    ];

    /// Stable lowercase name used in logs and the `Missing` wire field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Ram => "ram",
            Self::Gpu => "gpu",
            Self::Network => "network",
            Self::Disk => "disk",
            Self::Temperature => "temperature",
            Self::Containers => "containers",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

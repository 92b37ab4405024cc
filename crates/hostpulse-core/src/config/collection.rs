//! Collection engine configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Smallest accepted collection interval.
pub const MIN_INTERVAL_MS: u64 = 10;

/// GPU sampling backend, selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GpuBackend {
    /// No GPU category is collected.
    #[default]
    None,
    /// NVIDIA GPUs through `nvidia-smi`.
    Nvidia,
    /// AMD GPUs through the amdgpu sysfs interface.
    Amd,
}

impl GpuBackend {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Nvidia => "nvidia",
            Self::Amd => "amd",
        }
    }
}

impl fmt::Display for GpuBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GpuBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "off" => Ok(Self::None),
            "nvidia" | "nvidia-smi" => Ok(Self::Nvidia),
            "amd" | "amdgpu" => Ok(Self::Amd),
            other => Err(AppError::validation(format!(
                "unknown GPU backend '{other}' (expected none, nvidia or amd)"
            ))),
        }
    }
}

impl TryFrom<String> for GpuBackend {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GpuBackend> for String {
    fn from(value: GpuBackend) -> Self {
        value.as_str().to_string()
    }
}

/// Collection engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Period between ticks in milliseconds.
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    /// GPU backend selection.
    #[serde(default)]
    pub gpu: GpuBackend,
    /// Whether per-container stats are collected from the Docker CLI.
    #[serde(default)]
    pub docker: bool,
    /// Capacity of each per-category source buffer.
    #[serde(default = "default_source_buffer")]
    pub source_buffer_capacity: usize,
    /// Upper bound on a single collector invocation in milliseconds.
    #[serde(default = "default_collector_timeout")]
    pub collector_timeout_ms: u64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
            gpu: GpuBackend::None,
            docker: false,
            source_buffer_capacity: default_source_buffer(),
            collector_timeout_ms: default_collector_timeout(),
        }
    }
}

impl CollectionConfig {
    /// Tick period.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Per-collector timeout.
    pub fn collector_timeout(&self) -> Duration {
        Duration::from_millis(self.collector_timeout_ms)
    }
}

fn default_interval() -> u64 {
    1000
}

fn default_source_buffer() -> usize {
    2
}

fn default_collector_timeout() -> u64 {
    5000
}

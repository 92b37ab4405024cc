//! AMD GPUs via the amdgpu sysfs interface.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use hostpulse_core::error::ErrorKind;
use hostpulse_core::traits::Collector;
use hostpulse_core::types::{GpuSample, MetricCategory, MetricValue};
use hostpulse_core::{AppError, AppResult};

const DRM_ROOT: &str = "/sys/class/drm";

/// Reads `card*/device/{gpu_busy_percent,mem_info_vram_*}` under the DRM
/// class directory. Cards without `gpu_busy_percent` are not amdgpu and
/// are skipped.
#[derive(Debug, Clone)]
pub struct AmdGpuCollector {
    root: PathBuf,
}

impl AmdGpuCollector {
    pub fn new() -> Self {
        Self::with_root(DRM_ROOT)
    }

    /// Read cards from a different DRM root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read_card(&self, card: &str) -> Option<GpuSample> {
        let device = self.root.join(card).join("device");
        let load = read_number(&device.join("gpu_busy_percent")).await?;

        Some(GpuSample {
            name: card.to_string(),
            load_percent: load as f32,
            memory_used_bytes: read_number(&device.join("mem_info_vram_used"))
                .await
                .unwrap_or(0),
            memory_total_bytes: read_number(&device.join("mem_info_vram_total"))
                .await
                .unwrap_or(0),
            temperature_c: read_temperature(&device.join("hwmon")).await,
        })
    }
}

impl Default for AmdGpuCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for AmdGpuCollector {
    fn category(&self) -> MetricCategory {
        MetricCategory::Gpu
    }

    fn name(&self) -> &str {
        "amdgpu-sysfs"
    }

    async fn collect(&self) -> AppResult<MetricValue> {
        let mut entries = fs::read_dir(&self.root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Collector,
                format!("cannot list {}", self.root.display()),
                e,
            )
        })?;

        let mut cards = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_card(&name) {
                cards.push(name);
            }
        }
        cards.sort();

        let mut gpus = Vec::with_capacity(cards.len());
        for card in &cards {
            if let Some(sample) = self.read_card(card).await {
                gpus.push(sample);
            }
        }
        Ok(MetricValue::Gpu(gpus))
    }
}

/// `card0` but not connector entries like `card0-DP-1`.
fn is_card(name: &str) -> bool {
    name.strip_prefix("card")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

async fn read_number(path: &Path) -> Option<u64> {
    fs::read_to_string(path).await.ok()?.trim().parse().ok()
}

/// First `hwmon*/temp1_input`, reported in millidegrees.
async fn read_temperature(hwmon: &Path) -> Option<f32> {
    let mut entries = fs::read_dir(hwmon).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if let Some(milli) = read_number(&entry.path().join("temp1_input")).await {
            return Some(milli as f32 / 1000.0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_root(test: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hostpulse-amd-{test}-{}", std::process::id()))
    }

    async fn write(path: PathBuf, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.expect("mkdir");
        }
        fs::write(path, contents).await.expect("write");
    }

    #[test]
    fn test_is_card() {
        assert!(is_card("card0"));
        assert!(is_card("card12"));
        assert!(!is_card("card0-DP-1"));
        assert!(!is_card("card"));
        assert!(!is_card("renderD128"));
    }

    #[tokio::test]
    async fn test_reads_fake_sysfs() {
        let root = scratch_root("reads");
        let _ = fs::remove_dir_all(&root).await;

        let device = root.join("card0").join("device");
        write(device.join("gpu_busy_percent"), "42\n").await;
        write(device.join("mem_info_vram_used"), "1048576\n").await;
        write(device.join("mem_info_vram_total"), "8589934592\n").await;
        write(device.join("hwmon/hwmon3/temp1_input"), "61000\n").await;
        // Connector entry and a non-amdgpu card.
        fs::create_dir_all(root.join("card0-DP-1")).await.expect("mkdir");
        fs::create_dir_all(root.join("card1/device")).await.expect("mkdir");

        let value = AmdGpuCollector::with_root(&root).collect().await.expect("collect");
        let _ = fs::remove_dir_all(&root).await;

        let MetricValue::Gpu(gpus) = value else {
            panic!("expected gpu value");
        };
        assert_eq!(gpus.len(), 1);
        assert_eq!(gpus[0].name, "card0");
        assert_eq!(gpus[0].load_percent, 42.0);
        assert_eq!(gpus[0].memory_used_bytes, 1_048_576);
        assert_eq!(gpus[0].memory_total_bytes, 8_589_934_592);
        assert_eq!(gpus[0].temperature_c, Some(61.0));
    }

    #[tokio::test]
    async fn test_missing_root_is_error() {
        let collector = AmdGpuCollector::with_root(scratch_root("missing"));
        assert!(collector.collect().await.is_err());
    }
}

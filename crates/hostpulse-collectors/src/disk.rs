//! Mounted disks: capacity and I/O rates.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use sysinfo::Disks;

use hostpulse_core::AppResult;
use hostpulse_core::traits::Collector;
use hostpulse_core::types::{DiskSample, MetricCategory, MetricValue};

use crate::network::rate;
use crate::system::read_blocking;

struct DiskState {
    disks: Disks,
    last_refresh: Instant,
}

/// Disk space and read/write rates from sysinfo.
pub struct DiskCollector {
    state: Arc<Mutex<DiskState>>,
}

impl DiskCollector {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DiskState {
                disks: Disks::new_with_refreshed_list(),
                last_refresh: Instant::now(),
            })),
        }
    }
}

impl Default for DiskCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DiskCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskCollector").finish_non_exhaustive()
    }
}

#[async_trait]
impl Collector for DiskCollector {
    fn category(&self) -> MetricCategory {
        MetricCategory::Disk
    }

    fn name(&self) -> &str {
        "sysinfo-disk"
    }

    async fn collect(&self) -> AppResult<MetricValue> {
        let samples = read_blocking(&self.state, "sysinfo-disk", |state| {
            state.disks.refresh(true);
            let now = Instant::now();
            let seconds = now.duration_since(state.last_refresh).as_secs_f64();
            state.last_refresh = now;

            let samples = state
                .disks
                .list()
                .iter()
                .map(|disk| {
                    let usage = disk.usage();
                    DiskSample {
                        name: disk.name().to_string_lossy().into_owned(),
                        mount_point: disk.mount_point().to_string_lossy().into_owned(),
                        total_bytes: disk.total_space(),
                        available_bytes: disk.available_space(),
                        read_bytes_per_sec: rate(usage.read_bytes, seconds),
                        write_bytes_per_sec: rate(usage.written_bytes, seconds),
                    }
                })
                .collect();
            Ok(samples)
        })
        .await?;

        Ok(MetricValue::Disk(samples))
    }
}

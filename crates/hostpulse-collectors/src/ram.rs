//! Memory and swap usage.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use hostpulse_core::AppResult;
use hostpulse_core::traits::Collector;
use hostpulse_core::types::{MetricCategory, MetricValue, RamSample};

use crate::system::read_blocking;

/// Physical memory and swap from sysinfo.
pub struct RamCollector {
    system: Arc<Mutex<System>>,
}

impl RamCollector {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
        );
        Self {
            system: Arc::new(Mutex::new(system)),
        }
    }
}

impl Default for RamCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RamCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RamCollector").finish_non_exhaustive()
    }
}

#[async_trait]
impl Collector for RamCollector {
    fn category(&self) -> MetricCategory {
        MetricCategory::Ram
    }

    fn name(&self) -> &str {
        "sysinfo-ram"
    }

    async fn collect(&self) -> AppResult<MetricValue> {
        let sample = read_blocking(&self.system, "sysinfo-ram", |system| {
            system.refresh_memory();
            Ok(RamSample {
                total_bytes: system.total_memory(),
                used_bytes: system.used_memory(),
                swap_total_bytes: system.total_swap(),
                swap_used_bytes: system.used_swap(),
                // Derived when the tick is encoded.
                used_percent: 0.0,
            })
        })
        .await?;

        Ok(MetricValue::Ram(sample))
    }
}

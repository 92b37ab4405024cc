//! Per-core CPU load.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sysinfo::{CpuRefreshKind, RefreshKind, System};

use hostpulse_core::traits::Collector;
use hostpulse_core::types::{CpuSample, MetricCategory, MetricValue};
use hostpulse_core::{AppError, AppResult};

use crate::system::read_blocking;

/// Per-core usage from sysinfo.
///
/// Usage is measured between consecutive refreshes, so the first tick after
/// construction reports the load since `new()`.
pub struct CpuCollector {
    system: Arc<Mutex<System>>,
}

impl CpuCollector {
    pub fn new() -> Self {
        let mut system = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing().with_cpu_usage()),
        );
        system.refresh_cpu_usage();
        Self {
            system: Arc::new(Mutex::new(system)),
        }
    }
}

impl Default for CpuCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CpuCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuCollector").finish_non_exhaustive()
    }
}

#[async_trait]
impl Collector for CpuCollector {
    fn category(&self) -> MetricCategory {
        MetricCategory::Cpu
    }

    fn name(&self) -> &str {
        "sysinfo-cpu"
    }

    async fn collect(&self) -> AppResult<MetricValue> {
        let loads = read_blocking(&self.system, "sysinfo-cpu", |system| {
            system.refresh_cpu_usage();
            let loads: Vec<f32> = system.cpus().iter().map(|cpu| cpu.cpu_usage()).collect();
            if loads.is_empty() {
                return Err(AppError::collector("no CPU information available"));
            }
            Ok(loads)
        })
        .await?;

        Ok(MetricValue::Cpu(CpuSample { loads }))
    }
}

//! Startup-time collector set.

use std::sync::Arc;

use tracing::info;

use hostpulse_core::config::CollectionConfig;
use hostpulse_core::traits::Collector;

use crate::gpu::gpu_collector;
use crate::{
    CpuCollector, DiskCollector, DockerCollector, NetworkCollector, RamCollector,
    TemperatureCollector,
};

/// Build one collector per configured category.
pub fn build_collectors(config: &CollectionConfig) -> Vec<Arc<dyn Collector>> {
    let mut collectors: Vec<Arc<dyn Collector>> = vec![
        Arc::new(CpuCollector::new()),
        Arc::new(RamCollector::new()),
        Arc::new(NetworkCollector::new()),
        Arc::new(DiskCollector::new()),
        Arc::new(TemperatureCollector::new()),
    ];

    if let Some(gpu) = gpu_collector(config.gpu) {
        collectors.push(gpu);
    }
    if config.docker {
        collectors.push(Arc::new(DockerCollector::new()));
    }

    let names: Vec<&str> = collectors.iter().map(|c| c.name()).collect();
    info!(gpu = %config.gpu, docker = config.docker, collectors = ?names, "Collectors configured");

    collectors
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostpulse_core::config::GpuBackend;
    use hostpulse_core::types::MetricCategory;

    fn categories(collectors: &[Arc<dyn Collector>]) -> Vec<MetricCategory> {
        collectors.iter().map(|c| c.category()).collect()
    }

    #[test]
    fn test_default_set() {
        let collectors = build_collectors(&CollectionConfig::default());
        assert_eq!(
            categories(&collectors),
            vec![
                MetricCategory::Cpu,
                MetricCategory::Ram,
                MetricCategory::Network,
                MetricCategory::Disk,
                MetricCategory::Temperature,
            ]
        );
    }

    #[test]
    fn test_gpu_and_docker() {
        let config = CollectionConfig {
            gpu: GpuBackend::Amd,
            docker: true,
            ..Default::default()
        };
        let collectors = build_collectors(&config);
        let categories = categories(&collectors);
        assert!(categories.contains(&MetricCategory::Gpu));
        assert!(categories.contains(&MetricCategory::Containers));
        assert_eq!(collectors.len(), 7);
    }
}

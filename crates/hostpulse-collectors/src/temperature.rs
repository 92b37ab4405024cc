//! Hardware temperature sensors.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sysinfo::Components;

use hostpulse_core::AppResult;
use hostpulse_core::traits::Collector;
use hostpulse_core::types::{MetricCategory, MetricValue, TemperatureSample};

use crate::system::read_blocking;

/// Sensor readings from sysinfo components. Sensors without a current
/// reading are skipped.
pub struct TemperatureCollector {
    components: Arc<Mutex<Components>>,
}

impl TemperatureCollector {
    pub fn new() -> Self {
        Self {
            components: Arc::new(Mutex::new(Components::new_with_refreshed_list())),
        }
    }
}

impl Default for TemperatureCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemperatureCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemperatureCollector").finish_non_exhaustive()
    }
}

#[async_trait]
impl Collector for TemperatureCollector {
    fn category(&self) -> MetricCategory {
        MetricCategory::Temperature
    }

    fn name(&self) -> &str {
        "sysinfo-temperature"
    }

    async fn collect(&self) -> AppResult<MetricValue> {
        let samples = read_blocking(&self.components, "sysinfo-temperature", |components| {
            components.refresh(true);
            let samples = components
                .list()
                .iter()
                .filter_map(|component| {
                    let celsius = component.temperature()?;
                    celsius.is_finite().then(|| TemperatureSample {
                        label: component.label().to_string(),
                        celsius,
                    })
                })
                .collect();
            Ok(samples)
        })
        .await?;

        Ok(MetricValue::Temperature(samples))
    }
}

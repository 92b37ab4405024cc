//! Per-interface throughput.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use sysinfo::Networks;

use hostpulse_core::AppResult;
use hostpulse_core::traits::Collector;
use hostpulse_core::types::{MetricCategory, MetricValue, NetworkSample};

use crate::system::read_blocking;

struct NetworkState {
    networks: Networks,
    last_refresh: Instant,
}

/// Interface rates derived from byte deltas between reads.
pub struct NetworkCollector {
    state: Arc<Mutex<NetworkState>>,
}

impl NetworkCollector {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(NetworkState {
                networks: Networks::new_with_refreshed_list(),
                last_refresh: Instant::now(),
            })),
        }
    }
}

impl Default for NetworkCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NetworkCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkCollector").finish_non_exhaustive()
    }
}

/// Bytes per second over `seconds`; zero for an empty interval.
pub(crate) fn rate(bytes: u64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        bytes as f64 / seconds
    } else {
        0.0
    }
}

#[async_trait]
impl Collector for NetworkCollector {
    fn category(&self) -> MetricCategory {
        MetricCategory::Network
    }

    fn name(&self) -> &str {
        "sysinfo-network"
    }

    async fn collect(&self) -> AppResult<MetricValue> {
        let samples = read_blocking(&self.state, "sysinfo-network", |state| {
            state.networks.refresh(true);
            let now = Instant::now();
            let seconds = now.duration_since(state.last_refresh).as_secs_f64();
            state.last_refresh = now;

            let mut samples: Vec<NetworkSample> = state
                .networks
                .list()
                .iter()
                .map(|(name, data)| NetworkSample {
                    name: name.clone(),
                    rx_bytes_per_sec: rate(data.received(), seconds),
                    tx_bytes_per_sec: rate(data.transmitted(), seconds),
                    rx_total_bytes: data.total_received(),
                    tx_total_bytes: data.total_transmitted(),
                })
                .collect();
            samples.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(samples)
        })
        .await?;

        Ok(MetricValue::Network(samples))
    }
}

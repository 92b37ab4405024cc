//! Join stage: assembles one complete tick from every source buffer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::trace;

use hostpulse_core::types::{MetricCategory, MetricValue};

use crate::metrics::{EngineMetrics, pipeline};
use crate::source::{SourceItem, SourceReceivers};

/// One assembled tick: exactly one entry per configured category.
#[derive(Debug, Clone)]
pub struct Tick {
    /// Tick sequence number.
    pub sequence: u64,
    /// Wall-clock start of the tick.
    pub started_at: DateTime<Utc>,
    /// Slowest collector for the tick.
    pub collection: Duration,
    /// Values in category order; `None` marks a failed collector.
    pub values: Vec<(MetricCategory, Option<MetricValue>)>,
}

impl Tick {
    /// Categories whose collector failed for this tick.
    pub fn missing(&self) -> Vec<MetricCategory> {
        self.values
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(category, _)| *category)
            .collect()
    }
}

#[derive(Debug)]
struct Lane {
    category: MetricCategory,
    rx: mpsc::Receiver<SourceItem>,
    head: Option<SourceItem>,
}

/// Rendezvous over all source buffers.
///
/// Each lane keeps at most one pending head item. A tick is emitted only when
/// every head carries the same tick number; heads behind the newest observed
/// tick can never complete and are discarded. Emitted ticks are strictly
/// increasing.
///
/// [`JoinStage::next_tick`] is cancel-safe: pending heads live in the stage,
/// not in the future.
#[derive(Debug)]
pub struct JoinStage {
    lanes: Vec<Lane>,
    last_emitted: Option<u64>,
    metrics: Arc<EngineMetrics>,
}

impl JoinStage {
    /// Build a join over the given receivers.
    pub fn new(receivers: SourceReceivers, metrics: Arc<EngineMetrics>) -> Self {
        let lanes = receivers
            .receivers
            .into_iter()
            .map(|(category, rx)| Lane {
                category,
                rx,
                head: None,
            })
            .collect();
        Self {
            lanes,
            last_emitted: None,
            metrics,
        }
    }

    /// Wait for the next complete tick.
    ///
    /// Returns `None` once any source buffer is closed, or immediately when
    /// no category is configured.
    pub async fn next_tick(&mut self) -> Option<Tick> {
        if self.lanes.is_empty() {
            return None;
        }

        loop {
            for lane in self.lanes.iter_mut() {
                while lane.head.is_none() {
                    let item = lane.rx.recv().await?;
                    if self.last_emitted.is_some_and(|last| item.tick <= last) {
                        pipeline::record_stale(&self.metrics);
                        trace!(category = %lane.category, tick = item.tick, "Discarding item for emitted tick");
                        continue;
                    }
                    lane.head = Some(item);
                }
            }

            let target = self
                .lanes
                .iter()
                .filter_map(|lane| lane.head.as_ref().map(|item| item.tick))
                .max()?;

            let mut aligned = true;
            for lane in self.lanes.iter_mut() {
                let behind = lane.head.as_ref().is_some_and(|item| item.tick < target);
                if behind {
                    if let Some(stale) = lane.head.take() {
                        pipeline::record_stale(&self.metrics);
                        trace!(category = %lane.category, tick = stale.tick, target, "Discarding stale item");
                    }
                    aligned = false;
                }
            }
            if !aligned {
                continue;
            }

            return Some(self.take_heads(target));
        }
    }

    fn take_heads(&mut self, sequence: u64) -> Tick {
        let mut started_at = None;
        let mut collection = Duration::ZERO;
        let mut values = Vec::with_capacity(self.lanes.len());

        for lane in self.lanes.iter_mut() {
            if let Some(item) = lane.head.take() {
                started_at.get_or_insert(item.started_at);
                collection = collection.max(item.elapsed);
                values.push((lane.category, item.value));
            }
        }

        self.last_emitted = Some(sequence);
        pipeline::record_tick_joined(&self.metrics);

        Tick {
            sequence,
            started_at: started_at.unwrap_or_else(Utc::now),
            collection,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceBuffers, source_buffers};
    use hostpulse_core::types::{CpuSample, RamSample};

    fn cpu(tick: u64) -> SourceItem {
        SourceItem {
            category: MetricCategory::Cpu,
            tick,
            started_at: Utc::now(),
            elapsed: Duration::from_millis(tick),
            value: Some(MetricValue::Cpu(CpuSample {
                loads: vec![tick as f32],
            })),
        }
    }

    fn ram(tick: u64, value: Option<RamSample>) -> SourceItem {
        SourceItem {
            category: MetricCategory::Ram,
            tick,
            started_at: Utc::now(),
            elapsed: Duration::from_millis(1),
            value: value.map(MetricValue::Ram),
        }
    }

    fn setup() -> (SourceBuffers, JoinStage, Arc<EngineMetrics>) {
        let metrics = Arc::new(EngineMetrics::new());
        let (buffers, receivers) = source_buffers(
            &[MetricCategory::Cpu, MetricCategory::Ram],
            2,
            metrics.clone(),
        );
        (buffers, JoinStage::new(receivers, metrics.clone()), metrics)
    }

    #[tokio::test]
    async fn test_emits_only_complete_ticks() {
        let (buffers, mut join, _) = setup();
        buffers.post(cpu(1));

        let pending =
            tokio::time::timeout(Duration::from_millis(20), join.next_tick()).await;
        assert!(pending.is_err(), "tick must wait for every category");

        buffers.post(ram(1, Some(RamSample::default())));
        let tick = join.next_tick().await.expect("tick");
        assert_eq!(tick.sequence, 1);
        assert_eq!(tick.values.len(), 2);
        assert!(tick.missing().is_empty());
    }

    #[tokio::test]
    async fn test_failed_source_still_completes_tick() {
        let (buffers, mut join, _) = setup();
        buffers.post(cpu(1));
        buffers.post(ram(1, None));

        let tick = join.next_tick().await.expect("tick");
        assert_eq!(tick.missing(), vec![MetricCategory::Ram]);
    }

    #[tokio::test]
    async fn test_dropped_item_discards_partial_tick() {
        let (buffers, mut join, metrics) = setup();
        // Ram lost its tick 1 item to backpressure.
        buffers.post(cpu(1));
        buffers.post(cpu(2));
        buffers.post(ram(2, Some(RamSample::default())));

        let tick = join.next_tick().await.expect("tick");
        assert_eq!(tick.sequence, 2);
        assert_eq!(metrics.snapshot().stale_items_discarded, 1);
    }

    #[tokio::test]
    async fn test_late_item_for_emitted_tick_is_discarded() {
        let (buffers, mut join, metrics) = setup();
        buffers.post(cpu(2));
        buffers.post(ram(2, Some(RamSample::default())));
        assert_eq!(join.next_tick().await.map(|t| t.sequence), Some(2));

        buffers.post(cpu(1));
        buffers.post(cpu(3));
        buffers.post(ram(3, Some(RamSample::default())));
        assert_eq!(join.next_tick().await.map(|t| t.sequence), Some(3));
        assert_eq!(metrics.snapshot().stale_items_discarded, 1);
    }

    #[tokio::test]
    async fn test_collection_is_slowest_item() {
        let (buffers, mut join, _) = setup();
        buffers.post(cpu(9));
        buffers.post(ram(9, Some(RamSample::default())));
        let tick = join.next_tick().await.expect("tick");
        assert_eq!(tick.collection, Duration::from_millis(9));
    }

    #[tokio::test]
    async fn test_returns_none_when_producers_gone() {
        let (buffers, mut join, _) = setup();
        drop(buffers);
        assert!(join.next_tick().await.is_none());
    }
}

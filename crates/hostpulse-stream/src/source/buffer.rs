//! Bounded, never-blocking source buffers.
//!
//! Each configured [`MetricCategory`] gets one bounded channel. Producers
//! only ever `try_send`: a full buffer rejects the item and the value for
//! that tick is lost.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use hostpulse_core::types::{MetricCategory, MetricValue};

use crate::metrics::{EngineMetrics, pipeline};

/// One collector result tagged with the tick it belongs to.
#[derive(Debug, Clone)]
pub struct SourceItem {
    /// Category of the collector that produced it.
    pub category: MetricCategory,
    /// Tick sequence number.
    pub tick: u64,
    /// Wall-clock start of the tick.
    pub started_at: DateTime<Utc>,
    /// How long the collector took.
    pub elapsed: Duration,
    /// `None` when the collector failed for this tick.
    pub value: Option<MetricValue>,
}

/// Producer side of all source buffers.
#[derive(Debug, Clone)]
pub struct SourceBuffers {
    senders: Arc<HashMap<MetricCategory, mpsc::Sender<SourceItem>>>,
    metrics: Arc<EngineMetrics>,
}

/// Consumer side of all source buffers, in category order.
#[derive(Debug)]
pub struct SourceReceivers {
    pub(crate) receivers: Vec<(MetricCategory, mpsc::Receiver<SourceItem>)>,
}

/// Create one buffer of `capacity` items per category.
///
/// Duplicate categories are collapsed; the receivers come back sorted so the
/// join stage always assembles ticks in the same category order.
pub fn source_buffers(
    categories: &[MetricCategory],
    capacity: usize,
    metrics: Arc<EngineMetrics>,
) -> (SourceBuffers, SourceReceivers) {
    let mut categories = categories.to_vec();
    categories.sort();
    categories.dedup();

    let mut senders = HashMap::with_capacity(categories.len());
    let mut receivers = Vec::with_capacity(categories.len());
    for category in categories {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        senders.insert(category, tx);
        receivers.push((category, rx));
    }

    (
        SourceBuffers {
            senders: Arc::new(senders),
            metrics,
        },
        SourceReceivers { receivers },
    )
}

impl SourceBuffers {
    /// Attempt a non-blocking enqueue.
    ///
    /// Returns `false` when the item was dropped: the buffer is full, the
    /// join stage is gone, or the category is not configured.
    pub fn post(&self, item: SourceItem) -> bool {
        let Some(sender) = self.senders.get(&item.category) else {
            warn!(category = %item.category, "Post to unconfigured category, dropping");
            return false;
        };

        let category = item.category;
        let tick = item.tick;
        match sender.try_send(item) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                pipeline::record_source_drop(&self.metrics);
                debug!(category = %category, tick, "Source buffer full, dropping item");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Configured categories.
    pub fn categories(&self) -> Vec<MetricCategory> {
        let mut categories: Vec<_> = self.senders.keys().copied().collect();
        categories.sort();
        categories
    }
}

impl SourceReceivers {
    /// Number of buffers.
    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    /// Whether no category is configured.
    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }
}

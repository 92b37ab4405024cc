//! Join and encode stages, driven by one pipeline task per engine run.

pub mod encode;
pub mod join;

pub use encode::encode_tick;
pub use join::{JoinStage, Tick};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::hub::BroadcastHub;
use crate::metrics::{EngineMetrics, pipeline};

/// Join, encode, and publish until cancelled or the sources close.
pub async fn run_pipeline(
    mut join: JoinStage,
    hub: Arc<BroadcastHub>,
    metrics: Arc<EngineMetrics>,
    cancel: CancellationToken,
) {
    debug!("Pipeline started");

    loop {
        let tick = tokio::select! {
            _ = cancel.cancelled() => break,
            tick = join.next_tick() => match tick {
                Some(tick) => tick,
                None => break,
            },
        };

        let frame = match encode_tick(&tick, tick.started_at, tick.collection) {
            Ok(frame) => frame,
            Err(e) => {
                pipeline::record_encode_failure(&metrics);
                error!(tick = tick.sequence, error = %e, "Failed to encode tick, dropping");
                continue;
            }
        };

        let report = hub.publish(frame);
        pipeline::record_published(&metrics);
        trace!(
            tick = tick.sequence,
            queued = report.queued,
            dropped = report.dropped,
            "Frame published"
        );
    }

    debug!("Pipeline stopped");
}

//! Periodic collection loop.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use hostpulse_core::AppError;
use hostpulse_core::traits::Collector;
use hostpulse_core::types::MetricValue;

use crate::metrics::{EngineMetrics, pipeline};
use crate::source::{SourceBuffers, SourceItem};

/// Timing knobs for one engine run.
#[derive(Debug, Clone, Copy)]
pub struct TickSettings {
    /// Tick period.
    pub interval: Duration,
    /// Upper bound on a single collector invocation.
    pub collector_timeout: Duration,
}

/// Start a tick every `interval` until cancelled.
///
/// Each tick runs in its own task so a slow tick never delays the next one;
/// missed periods are skipped rather than replayed. Dropping out of the loop
/// aborts every in-flight tick.
pub async fn run_tick_loop(
    collectors: Arc<[Arc<dyn Collector>]>,
    buffers: SourceBuffers,
    settings: TickSettings,
    metrics: Arc<EngineMetrics>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight = JoinSet::new();
    let mut sequence: u64 = 0;

    debug!(interval_ms = settings.interval.as_millis() as u64, "Collection loop started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        error!(error = %e, "Tick task panicked");
                    }
                }
            }
            _ = ticker.tick() => {
                sequence += 1;
                pipeline::record_tick_scheduled(&metrics);
                in_flight.spawn(run_tick(
                    sequence,
                    collectors.clone(),
                    buffers.clone(),
                    settings,
                    metrics.clone(),
                ));
            }
        }
    }

    in_flight.abort_all();
    debug!(ticks = sequence, "Collection loop stopped");
}

/// Invoke every collector concurrently and post each result as it lands.
pub async fn run_tick(
    sequence: u64,
    collectors: Arc<[Arc<dyn Collector>]>,
    buffers: SourceBuffers,
    settings: TickSettings,
    metrics: Arc<EngineMetrics>,
) {
    let started_at = Utc::now();
    let tick_start = Instant::now();

    let mut set = JoinSet::new();
    for collector in collectors.iter().cloned() {
        let timeout = settings.collector_timeout;
        set.spawn(async move {
            let begin = Instant::now();
            let value = invoke(collector.as_ref(), timeout).await;
            (collector, begin.elapsed(), value)
        });
    }

    let mut timings = Vec::with_capacity(collectors.len());
    while let Some(joined) = set.join_next().await {
        let Ok((collector, elapsed, result)) = joined else {
            continue;
        };

        let value = match result {
            Ok(value) => Some(value),
            Err(e) => {
                pipeline::record_collector_failure(&metrics);
                warn!(
                    tick = sequence,
                    collector = collector.name(),
                    category = %collector.category(),
                    error = %e,
                    "Collector failed"
                );
                None
            }
        };

        buffers.post(SourceItem {
            category: collector.category(),
            tick: sequence,
            started_at,
            elapsed,
            value,
        });
        timings.push(format!("{}={}ms", collector.name(), elapsed.as_millis()));
    }

    let total = tick_start.elapsed();
    if total > settings.interval {
        pipeline::record_overrun(&metrics);
        warn!(
            tick = sequence,
            elapsed_ms = total.as_millis() as u64,
            interval_ms = settings.interval.as_millis() as u64,
            timings = %timings.join(", "),
            "Collection exceeded interval"
        );
    }
}

/// Run one collector, converting errors, panics, and timeouts into `AppError`.
async fn invoke(collector: &dyn Collector, timeout: Duration) -> Result<MetricValue, AppError> {
    let attempt = AssertUnwindSafe(collector.collect()).catch_unwind();
    let value = match tokio::time::timeout(timeout, attempt).await {
        Err(_) => {
            return Err(AppError::collector(format!(
                "timed out after {}ms",
                timeout.as_millis()
            )));
        }
        Ok(Err(_)) => return Err(AppError::collector("collector panicked")),
        Ok(Ok(result)) => result?,
    };

    if value.category() != collector.category() {
        return Err(AppError::collector(format!(
            "returned {} value for {} collector",
            value.category(),
            collector.category()
        )));
    }
    Ok(value)
}

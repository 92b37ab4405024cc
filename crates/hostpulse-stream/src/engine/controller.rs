//! Engine controller: owns the collection loop and its start/stop state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use hostpulse_core::config::CollectionConfig;
use hostpulse_core::traits::Collector;
use hostpulse_core::types::MetricCategory;

use super::tick::{TickSettings, run_tick_loop};
use crate::hub::BroadcastHub;
use crate::metrics::{EngineMetrics, clients};
use crate::pipeline::{JoinStage, run_pipeline};
use crate::source::source_buffers;

/// Engine lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    /// No collector is invoked.
    Stopped,
    /// Ticks are being collected and published.
    Running,
}

impl EngineState {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
        }
    }
}

#[derive(Debug)]
struct EngineRun {
    id: u64,
    cancel: CancellationToken,
    started_at: DateTime<Utc>,
}

/// Starts and stops the collection loop.
///
/// Every run gets fresh source buffers, so nothing from a stopped run can
/// reach the join stage of the next one.
pub struct EngineController {
    collectors: Arc<[Arc<dyn Collector>]>,
    hub: Arc<BroadcastHub>,
    metrics: Arc<EngineMetrics>,
    config: CollectionConfig,
    run: Arc<Mutex<Option<EngineRun>>>,
    next_run: AtomicU64,
    faults: watch::Sender<Option<String>>,
}

impl std::fmt::Debug for EngineController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineController")
            .field("collectors", &self.collectors.len())
            .field("state", &self.state())
            .finish()
    }
}

impl EngineController {
    /// Creates a stopped controller.
    pub fn new(
        collectors: Vec<Arc<dyn Collector>>,
        hub: Arc<BroadcastHub>,
        config: CollectionConfig,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        let (faults, _) = watch::channel(None);
        Self {
            collectors: Arc::from(collectors),
            hub,
            metrics,
            config,
            run: Arc::new(Mutex::new(None)),
            next_run: AtomicU64::new(1),
            faults,
        }
    }

    /// Transition Stopped → Running. Returns `false` if already running or
    /// if there is nothing to collect.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        if self.collectors.is_empty() {
            warn!("No collectors configured, engine stays stopped");
            return false;
        }

        let mut run = self.lock_run();
        if run.is_some() {
            return false;
        }

        let cancel = CancellationToken::new();
        let categories: Vec<MetricCategory> =
            self.collectors.iter().map(|c| c.category()).collect();
        let (buffers, receivers) = source_buffers(
            &categories,
            self.config.source_buffer_capacity,
            self.metrics.clone(),
        );
        let join = JoinStage::new(receivers, self.metrics.clone());

        let pipeline = tokio::spawn(run_pipeline(
            join,
            self.hub.clone(),
            self.metrics.clone(),
            cancel.clone(),
        ));
        let ticks = tokio::spawn(run_tick_loop(
            self.collectors.clone(),
            buffers,
            TickSettings {
                interval: self.config.interval(),
                collector_timeout: self.config.collector_timeout(),
            },
            self.metrics.clone(),
            cancel.clone(),
        ));
        let id = self.next_run.fetch_add(1, Ordering::Relaxed);
        tokio::spawn(supervise(
            ticks,
            pipeline,
            Supervision {
                run_id: id,
                cancel: cancel.clone(),
                slot: self.run.clone(),
                faults: self.faults.clone(),
                metrics: self.metrics.clone(),
            },
        ));

        *run = Some(EngineRun {
            id,
            cancel,
            started_at: Utc::now(),
        });
        clients::record_engine_start(&self.metrics);
        info!(
            collectors = self.collectors.len(),
            interval_ms = self.config.interval_ms,
            "Engine started"
        );
        true
    }

    /// Transition Running → Stopped. Returns `false` if already stopped.
    pub fn stop(&self) -> bool {
        let Some(run) = self.lock_run().take() else {
            return false;
        };
        run.cancel.cancel();
        clients::record_engine_stop(&self.metrics);

        let uptime = Utc::now() - run.started_at;
        info!(uptime_ms = uptime.num_milliseconds(), "Engine stopped");
        true
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        if self.lock_run().is_some() {
            EngineState::Running
        } else {
            EngineState::Stopped
        }
    }

    /// Terminal faults of the engine tasks, for the hosting layer.
    pub fn faults(&self) -> watch::Receiver<Option<String>> {
        self.faults.subscribe()
    }

    /// Configured collectors.
    pub fn collectors(&self) -> &[Arc<dyn Collector>] {
        &self.collectors
    }

    fn lock_run(&self) -> MutexGuard<'_, Option<EngineRun>> {
        lock_slot(&self.run)
    }
}

fn lock_slot(slot: &Mutex<Option<EngineRun>>) -> MutexGuard<'_, Option<EngineRun>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

/// What the supervisor of one run needs to wind it down.
struct Supervision {
    run_id: u64,
    cancel: CancellationToken,
    slot: Arc<Mutex<Option<EngineRun>>>,
    faults: watch::Sender<Option<String>>,
    metrics: Arc<EngineMetrics>,
}

impl Supervision {
    /// The run ended without `stop()`: clear it so the state reads Stopped,
    /// and raise a fault unless one is already set.
    fn abandon(&self) {
        let abandoned = {
            let mut slot = lock_slot(&self.slot);
            if slot.as_ref().is_some_and(|run| run.id == self.run_id) {
                slot.take()
            } else {
                None
            }
        };
        if abandoned.is_none() {
            return;
        }

        clients::record_engine_stop(&self.metrics);
        error!(run = self.run_id, "Engine tasks exited without a stop request");
        self.faults.send_if_modified(|fault| {
            if fault.is_some() {
                return false;
            }
            *fault = Some("engine tasks exited unexpectedly".to_string());
            true
        });
    }
}

/// Wait on both engine tasks.
///
/// A panic in either is a terminal fault, and so is either task ending
/// before the run was asked to stop.
async fn supervise(mut ticks: JoinHandle<()>, mut pipeline: JoinHandle<()>, run: Supervision) {
    let requested = tokio::select! {
        result = &mut ticks => {
            let requested = run.cancel.is_cancelled();
            report("collection loop", result, &run.faults);
            run.cancel.cancel();
            report("pipeline", pipeline.await, &run.faults);
            requested
        }
        result = &mut pipeline => {
            let requested = run.cancel.is_cancelled();
            report("pipeline", result, &run.faults);
            run.cancel.cancel();
            report("collection loop", ticks.await, &run.faults);
            requested
        }
    };

    if !requested {
        run.abandon();
    }
}

fn report(task: &str, result: Result<(), JoinError>, faults: &watch::Sender<Option<String>>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!(task, error = %e, "Engine task panicked");
            faults.send_replace(Some(format!("{task} panicked: {e}")));
        }
    }
}

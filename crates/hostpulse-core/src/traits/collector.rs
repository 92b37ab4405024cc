//! Collector contract for pluggable metric sources.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::category::MetricCategory;
use crate::types::sample::MetricValue;

/// A metric source that can be asked for its current value(s).
///
/// One implementation exists per [`MetricCategory`]; GPU has several
/// backends of which exactly one is selected at startup. The engine never
/// calls `collect` concurrently with itself for the same tick, but a slow
/// collector may still be running when the next tick invokes it again, so
/// implementations must tolerate overlapping calls (failing fast is fine).
#[async_trait]
pub trait Collector: Send + Sync + std::fmt::Debug + 'static {
    /// The category this collector feeds.
    fn category(&self) -> MetricCategory;

    /// Short name used in logs and diagnostics (e.g. `"sysinfo-cpu"`).
    fn name(&self) -> &str;

    /// Read the current value(s). An error means the category contributes
    /// nothing to this tick.
    async fn collect(&self) -> AppResult<MetricValue>;
}

//! GPU backends. Exactly one is selected from `collection.gpu` at startup.

pub mod amd;
pub mod nvidia;

use std::sync::Arc;

use hostpulse_core::config::GpuBackend;
use hostpulse_core::traits::Collector;

pub use amd::AmdGpuCollector;
pub use nvidia::NvidiaGpuCollector;

/// Resolve the configured backend; `None` means no GPU category at all.
pub fn gpu_collector(backend: GpuBackend) -> Option<Arc<dyn Collector>> {
    match backend {
        GpuBackend::None => None,
        GpuBackend::Nvidia => Some(Arc::new(NvidiaGpuCollector::new())),
        GpuBackend::Amd => Some(Arc::new(AmdGpuCollector::new())),
    }
}

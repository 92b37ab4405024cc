//! Core type definitions used across the HostPulse workspace.

pub mod category;
pub mod id;
pub mod sample;
pub mod snapshot;

pub use category::MetricCategory;
pub use id::ClientId;
pub use sample::*;
pub use snapshot::MetricSnapshot;

//! # hostpulse-stream
//!
//! Metrics multiplexing engine for HostPulse. Provides:
//!
//! - Bounded per-category source buffers that never block collectors
//! - A join stage assembling time-aligned ticks from every source
//! - An encode stage producing immutable MessagePack frames
//! - A broadcast hub with one bounded sink and delivery task per client
//! - An engine controller gated by client presence

pub mod engine;
pub mod frame;
pub mod hub;
pub mod metrics;
pub mod pipeline;
pub mod server;
pub mod source;

pub use engine::{EngineController, EngineState};
pub use frame::Frame;
pub use hub::{BroadcastHub, ClientHandle, FrameTransport, LifecycleEvent, LifecycleListener};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use server::StreamEngine;

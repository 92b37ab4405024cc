//! # hostpulse-viewer
//!
//! Consumer side of HostPulse: a fixed-capacity [`RollingWindow`] per
//! metric stream, a [`MetricStore`] that feeds them from decoded
//! snapshots, and the WebSocket client used by the `hostpulse-viewer` CLI.

pub mod client;
pub mod output;
pub mod store;
pub mod window;

pub use client::ViewerClient;
pub use store::{MetricStore, StreamKey, WindowStats};
pub use window::RollingWindow;

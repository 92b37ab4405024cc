//! Client delivery and rolling window configuration.

use serde::{Deserialize, Serialize};

/// Per-client delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Frames buffered per client before new frames are dropped for it.
    #[serde(default = "default_sink_buffer")]
    pub sink_buffer_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sink_buffer_capacity: default_sink_buffer(),
        }
    }
}

/// Rolling window configuration for viewers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Samples retained per metric stream.
    #[serde(default = "default_window_capacity")]
    pub capacity: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            capacity: default_window_capacity(),
        }
    }
}

fn default_sink_buffer() -> usize {
    2
}

fn default_window_capacity() -> usize {
    60
}

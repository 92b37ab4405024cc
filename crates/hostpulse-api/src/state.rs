//! Application state shared across all handlers.

use std::sync::Arc;

use hostpulse_core::config::AppConfig;
use hostpulse_stream::StreamEngine;

/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Streaming engine
    pub engine: StreamEngine,
}

impl AppState {
    pub fn new(config: AppConfig, engine: StreamEngine) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }
}

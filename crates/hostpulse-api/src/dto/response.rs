//! Response DTOs.

use serde::{Deserialize, Serialize};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// GET /api/health body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers.
    pub status: String,
    /// `"running"` or `"stopped"`.
    pub engine: String,
    /// Connected viewers.
    pub clients: usize,
    /// Collection period.
    pub interval_ms: u64,
    /// Rolling window size viewers should use.
    pub window_capacity: usize,
}

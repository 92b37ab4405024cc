//! Health check handler.

use axum::Json;
use axum::extract::State;

use hostpulse_core::AppError;

use crate::dto::response::HealthResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/health
///
/// Answers 503 once an engine task has faulted.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let fault = state.engine.controller.faults().borrow().clone();
    if let Some(fault) = fault {
        return Err(AppError::service_unavailable(fault).into());
    }

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        engine: state.engine.state().as_str().to_string(),
        clients: state.engine.hub.client_count(),
        interval_ms: state.config.collection.interval_ms,
        window_capacity: state.config.window.capacity,
    }))
}

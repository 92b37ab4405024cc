//! Engine statistics handlers.

use axum::Json;
use axum::extract::State;

use hostpulse_stream::MetricsSnapshot;
use hostpulse_stream::hub::ClientInfo;

use crate::state::AppState;

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.engine.stats())
}

/// GET /api/clients
pub async fn clients(State(state): State<AppState>) -> Json<Vec<ClientInfo>> {
    Json(state.engine.hub.clients())
}

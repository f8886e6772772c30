use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::warn;

use crate::models::HealthResponse;
use crate::AppState;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service status and database reachability", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (status, database) = match state.db.ping().await {
        Ok(()) => ("ok", "connected"),
        Err(e) => {
            warn!("Health check database ping failed: {}", e);
            ("degraded", "unreachable")
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    })
}

use axum::{extract::State, http::StatusCode, Json};
use crate::models::{ErrorResponse, HealthResponse, ReadyResponse};
use crate::state::AppState;
use tracing::{debug, warn};

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}

/// Readiness check endpoint: ready once the shared session document is readable
pub async fn ready_check(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ReadyResponse>), (StatusCode, Json<ErrorResponse>)> {
    debug!("Readiness check requested");
    if let Err(e) = state.sync.current() {
        warn!("Not ready: {}", e);
        return Err(ErrorResponse::reply(StatusCode::SERVICE_UNAVAILABLE, e.to_string()));
    }
    Ok((StatusCode::OK, Json(ReadyResponse {
        status: "ok".to_string(),
        message: "Service is ready".to_string(),
        session_available: true,
    })))
}

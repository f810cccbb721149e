use crate::{models::ErrorResponse, state::AppState, sync::{SessionStatePatch, SharedSessionState}};
use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info};

/// Current shared presentation state
pub async fn get_session_state(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SharedSessionState>), (StatusCode, Json<ErrorResponse>)> {
    match state.sync.current() {
        Ok(snapshot) => Ok((StatusCode::OK, Json(snapshot))),
        Err(e) => {
            error!("Unable to get shared session state: {}", e);
            Err(ErrorResponse::reply(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

/// Merge a partial update into the shared presentation state
pub async fn patch_session_state(
    State(state): State<AppState>,
    Json(patch): Json<SessionStatePatch>,
) -> Result<(StatusCode, Json<SharedSessionState>), (StatusCode, Json<ErrorResponse>)> {

    // Write only the fields present in the request
    if let Err(e) = state.sync.publish(patch).await {
        return Err(ErrorResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
    }
    info!("Session state updated");

    // Answer with the merged result
    get_session_state(State(state)).await
}

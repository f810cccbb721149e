use crate::{handlers::*, state::AppState};
use axum::{routing::{get, post}, Router};

/// Create API routes
pub fn create_api_routes(state: AppState) -> Router {
    Router::<AppState>::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/v1/diagnostics", get(diagnostics))
        .route("/v1/session/state", get(get_session_state).patch(patch_session_state))
        .route("/v1/session/ws", get(session_ws))
        .route("/v1/deck", post(load_deck))
        .route("/v1/cursor", get(get_cursor).put(set_cursor))
        .route("/v1/cursor/:action", post(move_cursor))
        .route("/v1/presence", get(get_users))
        .route("/v1/presence/rooms/:group", get(get_room_members))
        .with_state(state)
}

use crate::{
    models::{ErrorResponse, PresenceResponse},
    presence::registry::{room_collection, USERS_COLLECTION},
    state::AppState,
};
use axum::{extract::{Path, State}, http::StatusCode, Json};

/// Everyone connected to the hub
pub async fn get_users(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<PresenceResponse>), (StatusCode, Json<ErrorResponse>)> {
    let members = state.realtime.watch(USERS_COLLECTION).borrow().clone();
    Ok((StatusCode::OK, Json(PresenceResponse {
        collection: USERS_COLLECTION.to_string(),
        members,
    })))
}

/// Members of one group's media room
pub async fn get_room_members(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<(StatusCode, Json<PresenceResponse>), (StatusCode, Json<ErrorResponse>)> {
    let collection = room_collection(&group);
    let members = state.realtime.watch(&collection).borrow().clone();
    Ok((StatusCode::OK, Json(PresenceResponse { collection, members })))
}

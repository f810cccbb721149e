use utoipa::OpenApi;
use crate::models::*;
use crate::sync::{LiveMode, SessionStatePatch, SharedSessionState, SlideMode, SlideStyle, SlideStylePatch};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Shared session state is readable", body = ReadyResponse),
        (status = 503, description = "Shared session state is unavailable", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Process and session counters
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Diagnostics", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Current shared presentation state
#[utoipa::path(
    get,
    path = "/api/v1/session/state",
    responses(
        (status = 200, description = "Latest merged snapshot", body = SharedSessionState),
        (status = 503, description = "Shared session state is unavailable", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn get_session_state_doc() {}

/// Merge a partial update into the shared presentation state
#[utoipa::path(
    patch,
    path = "/api/v1/session/state",
    request_body = SessionStatePatch,
    responses(
        (status = 200, description = "Merged snapshot after the update", body = SharedSessionState),
        (status = 500, description = "Document store failure", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn patch_session_state_doc() {}

/// Session websocket pushing every snapshot as JSON
#[utoipa::path(
    get,
    path = "/api/v1/session/ws",
    params(
        ("peerId" = Option<String>, Query, description = "Registers the peer in the roster while connected"),
        ("name" = Option<String>, Query, description = "Display name, defaults to the peer id")
    ),
    responses(
        (status = 101, description = "Switching to the websocket protocol")
    )
)]
#[allow(dead_code)]
pub async fn session_ws_doc() {}

/// Resolve a presentation and install it as the current deck
#[utoipa::path(
    post,
    path = "/api/v1/deck",
    request_body = LoadDeckRequest,
    responses(
        (status = 200, description = "Deck installed", body = DeckResponse),
        (status = 502, description = "Unable to load the slides", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn load_deck_doc() {}

/// Current cursor position
#[utoipa::path(
    get,
    path = "/api/v1/cursor",
    responses(
        (status = 200, description = "Cursor position", body = CursorResponse)
    )
)]
#[allow(dead_code)]
pub async fn get_cursor_doc() {}

/// Jump to a slide
#[utoipa::path(
    put,
    path = "/api/v1/cursor",
    request_body = SetCursorRequest,
    responses(
        (status = 200, description = "Cursor moved", body = CursorResponse),
        (status = 422, description = "Slide outside the deck", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn set_cursor_doc() {}

/// Relative navigation
#[utoipa::path(
    post,
    path = "/api/v1/cursor/{action}",
    params(
        ("action" = String, Path, description = "next, back, head or tail")
    ),
    responses(
        (status = 200, description = "Cursor after the move", body = CursorResponse),
        (status = 400, description = "Unknown action", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn move_cursor_doc() {}

/// Everyone connected to the hub
#[utoipa::path(
    get,
    path = "/api/v1/presence",
    responses(
        (status = 200, description = "Users roster", body = PresenceResponse)
    )
)]
#[allow(dead_code)]
pub async fn get_users_doc() {}

/// Members of one group's media room
#[utoipa::path(
    get,
    path = "/api/v1/presence/rooms/{group}",
    params(
        ("group" = String, Path, description = "Session group")
    ),
    responses(
        (status = 200, description = "Room members", body = PresenceResponse)
    )
)]
#[allow(dead_code)]
pub async fn get_room_members_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        get_session_state_doc,
        patch_session_state_doc,
        session_ws_doc,
        load_deck_doc,
        get_cursor_doc,
        set_cursor_doc,
        move_cursor_doc,
        get_users_doc,
        get_room_members_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            DiagnosticsResponse,
            ErrorResponse,
            SharedSessionState,
            SessionStatePatch,
            SlideStyle,
            SlideStylePatch,
            SlideMode,
            LiveMode,
            LoadDeckRequest,
            DeckResponse,
            SetCursorRequest,
            CursorResponse,
            PresenceResponse,
        )
    ),
    tags(
        (name = "api", description = "Session hub endpoints")
    )
)]
pub struct ApiDoc;

use crate::{
    models::{CursorResponse, ErrorResponse, SetCursorRequest},
    slides::SlideController,
    state::AppState,
};
use axum::{extract::{Path, State}, http::StatusCode, Json};
use tracing::{debug, warn};

fn cursor_response(slides: &SlideController) -> CursorResponse {
    CursorResponse {
        index: slides.index(),
        deck_len: slides.cursor().deck_len(),
        title: slides.title().to_string(),
    }
}

/// Current cursor position
pub async fn get_cursor(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CursorResponse>), (StatusCode, Json<ErrorResponse>)> {
    let slides = state.slides.lock().await;
    Ok((StatusCode::OK, Json(cursor_response(&slides))))
}

/// Jump to a slide
pub async fn set_cursor(
    State(state): State<AppState>,
    Json(request): Json<SetCursorRequest>,
) -> Result<(StatusCode, Json<CursorResponse>), (StatusCode, Json<ErrorResponse>)> {
    let mut slides = state.slides.lock().await;
    if !slides.set_index(request.index) {
        let deck_len = slides.cursor().deck_len();
        warn!("Slide {} is outside the deck of {}", request.index, deck_len);
        return Err(ErrorResponse::reply(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Slide {} is outside the deck of {} slides", request.index, deck_len),
        ));
    }
    Ok((StatusCode::OK, Json(cursor_response(&slides))))
}

/// Relative navigation: `next`, `back`, `head` or `tail`
pub async fn move_cursor(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> Result<(StatusCode, Json<CursorResponse>), (StatusCode, Json<ErrorResponse>)> {
    let mut slides = state.slides.lock().await;
    match action.as_str() {
        "next" => slides.next(),
        "back" => slides.back(),
        "head" => slides.head(),
        "tail" => slides.tail(),
        other => {
            return Err(ErrorResponse::reply(
                StatusCode::BAD_REQUEST,
                format!("Invalid cursor action '{}'. Use 'next', 'back', 'head' or 'tail'.", other),
            ));
        }
    }
    debug!("Cursor {} -> {:?}", action, slides.index());
    Ok((StatusCode::OK, Json(cursor_response(&slides))))
}

use crate::{
    models::{DeckResponse, ErrorResponse, LoadDeckRequest},
    slides::DECK_LOAD_FAILED_NOTICE,
    state::AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

/// Resolve a presentation and install it as the current deck
pub async fn load_deck(
    State(state): State<AppState>,
    Json(request): Json<LoadDeckRequest>,
) -> Result<(StatusCode, Json<DeckResponse>), (StatusCode, Json<ErrorResponse>)> {

    let presentation_id = request.presentation_id.trim();
    if presentation_id.is_empty() {
        return Err(ErrorResponse::reply(StatusCode::BAD_REQUEST, "presentationId is required"));
    }

    // The console is only held to start and to install the load
    let load = state.slides.lock().await.begin_load();
    let resolved = load.resolve(presentation_id).await;
    let installed = state.slides.lock().await.finish_load(load, resolved);
    let deck = match installed {
        Ok(deck) => deck,
        Err(e) => {
            return Err(ErrorResponse::reply(
                StatusCode::BAD_GATEWAY,
                format!("{}: {}", DECK_LOAD_FAILED_NOTICE, e),
            ));
        }
    };
    info!("Deck {} loaded", deck.presentation_id);

    Ok((StatusCode::OK, Json(DeckResponse {
        presentation_id: deck.presentation_id.clone(),
        title: deck.title.clone(),
        slide_count: deck.len(),
    })))
}

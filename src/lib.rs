//! Live classroom session hub: shared presentation state, slide navigation with
//! thumbnail prefetch, realtime presence and media room sessions.

pub mod clients;
pub mod config;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod media;
pub mod models;
pub mod presence;
pub mod routes;
pub mod slides;
pub mod state;
pub mod sync;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use state::AppState;

use axum::Router;
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};
use axum::http::HeaderValue;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// The complete HTTP application: API, Swagger UI, tracing and CORS.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let app = Router::new()
        // Mount API routes
        .nest("/api", routes::create_api_routes(state))
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        // Add tracing layer
        .layer(TraceLayer::new_for_http());

    let origins: Vec<HeaderValue> = config
        .cors_origin_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return app;
    }
    app.layer(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

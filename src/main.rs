use ripple_live::{build_router, clients::SlideServiceClient, AppState, Config};
use std::panic;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "ripple_live=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting session hub...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });
    if config.is_development() {
        info!("Running in {} mode", config.environment);
    }

    // Slide lookup client
    let lookup = match SlideServiceClient::new(config.slide_service_url.clone(), config.lookup_timeout()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create slide service client: {}", e);
            std::process::exit(1);
        }
    };
    info!("🖼️  Slide service at {}", lookup.base_url());

    // Shared session document, presence store and slide console
    let (state, pipeline) = match AppState::build(&config, lookup) {
        Ok(built) => built,
        Err(e) => {
            error!("Failed to create the session document: {}", e);
            std::process::exit(1);
        }
    };

    let app_routes = build_router(state, &config);

    // Start the HTTP/API server
    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("🚀 Server running on http://{}", config.server_address());
    info!("📡 Session WebSocket available at ws://{}/api/v1/session/ws", config.server_address());
    info!("📚 Swagger UI available at http://{}/swagger", config.server_address());

    if let Err(e) = axum::serve(listener, app_routes).await {
        error!("Server error: {}", e);
    }
    pipeline.abort();
}

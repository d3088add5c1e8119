//! Router setup with all routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, the upload size limit and
//! every endpoint handler.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use parley_core::ParleyError;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS: the page is served by this process, so only its own origins.
    let port = state.config.server.port;
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let vision_routes = Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/chat", post(handlers::chat));

    let session_routes = Router::new()
        .route("/api/models", get(handlers::list_models))
        .route("/api/sessions", post(handlers::create_session))
        .route(
            "/api/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/sessions/{id}/messages", post(handlers::send_message))
        .route("/api/sessions/{id}/mode", put(handlers::set_mode))
        .route("/api/sessions/{id}/history", delete(handlers::clear_history));

    let page_routes = Router::new()
        .route("/", get(handlers::index))
        .route("/static/app.js", get(handlers::app_js))
        .route("/health", get(handlers::health));

    page_routes
        .merge(vision_routes)
        .merge(session_routes)
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind the configured address and serve until the process stops.
pub async fn start_server(state: AppState) -> Result<(), ParleyError> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParleyError::Server(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(address = %addr, "Starting HTTP server");

    axum::serve(listener, router)
        .await
        .map_err(|e| ParleyError::Server(format!("Server error: {}", e)))?;

    Ok(())
}

//! Route definitions for the PhyloPlot HTTP API.
//!
//! All routes are mounted under `/api`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the router with all routes, the upload limit, and request logging.
pub fn build_router(state: AppState) -> Router {
    let max_upload = usize::try_from(state.config.server.max_upload_bytes).unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .merge(render_routes())
        .merge(metadata_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Rendering
fn render_routes() -> Router<AppState> {
    Router::new().route("/render", post(handlers::render::render))
}

/// Metadata inspection
fn metadata_routes() -> Router<AppState> {
    Router::new().route("/metadata/inspect", post(handlers::metadata::inspect))
}

/// Health checks
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}

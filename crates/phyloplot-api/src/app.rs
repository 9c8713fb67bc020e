//! Application builder: wires router, middleware, and state into an Axum
//! app, and runs the server.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use phyloplot_core::config::AppConfig;
use phyloplot_core::error::AppError;
use phyloplot_render::RenderPipeline;
use tower_http::trace::TraceLayer;

use crate::middleware::compression::build_compression_layer;
use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(build_compression_layer())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Runs the PhyloPlot server until Ctrl-C.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting PhyloPlot server...");

    // ── Step 1: Render pipeline ─────────────────────────────────
    let pipeline = Arc::new(RenderPipeline::new(&config.renderer, &config.workspace)?);

    // ── Step 2: Leftovers from earlier runs ─────────────────────
    let stale_after = Duration::from_secs(config.workspace.stale_after_seconds);
    let swept = pipeline.sweep_stale(stale_after).await;
    tracing::info!(swept, "Startup session sweep finished");

    // ── Step 3: Periodic sweeper ────────────────────────────────
    let sweeper = spawn_sweeper(
        Arc::clone(&pipeline),
        config.workspace.sweep_interval_seconds,
        stale_after,
    );

    // ── Step 4: HTTP server ─────────────────────────────────────
    let addr = config.server.bind_address();
    let app = build_app(AppState::new(config, pipeline));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("PhyloPlot server listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")));

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("PhyloPlot server stopped");
    served
}

fn spawn_sweeper(
    pipeline: Arc<RenderPipeline>,
    interval_seconds: u64,
    stale_after: Duration,
) -> Option<tokio::task::JoinHandle<()>> {
    if interval_seconds == 0 {
        tracing::info!("Periodic session sweep disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
        // The first tick completes immediately; startup already swept.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            pipeline.sweep_stale(stale_after).await;
        }
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

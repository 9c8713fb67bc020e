//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    }))
}

/// GET /api/health/detailed
pub async fn health_detailed(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let pipeline = &state.pipeline;
    let metrics = pipeline.metrics_snapshot();
    let renderer = pipeline.renderer_config();

    // A renderer that never started successfully while failing to spawn
    // points at a deployment problem.
    let status = if metrics.renderer_unavailable > 0 && metrics.renders_succeeded == 0 {
        "degraded"
    } else {
        "ok"
    };

    Json(ApiResponse::ok(DetailedHealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        checked_at: chrono::Utc::now(),
        renderer: renderer.command_summary(),
        renderer_timeout_seconds: renderer.timeout_seconds,
        render_slots_total: pipeline.max_slots(),
        render_slots_available: pipeline.available_slots(),
        workspace_root: pipeline.workspace().root().display().to_string(),
        metrics,
    }))
}

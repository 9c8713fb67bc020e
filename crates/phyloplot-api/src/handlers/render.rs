//! Render handler.

use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::Response;
use phyloplot_core::error::AppError;

use crate::error::ApiError;
use crate::extractors::{HttpFrontend, RenderForm};
use crate::state::AppState;

/// POST /api/render
///
/// Multipart form in, rendered tree out as an attachment named
/// `phylogenetic_tree.<ext>`.
pub async fn render(
    State(state): State<AppState>,
    form: RenderForm,
) -> Result<Response, ApiError> {
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);
    let mut frontend = HttpFrontend::new(form);

    tokio::time::timeout(timeout, state.pipeline.serve(&mut frontend))
        .await
        .map_err(|_| {
            AppError::timeout(format!(
                "request exceeded {}s",
                state.config.server.request_timeout_seconds
            ))
        })??;

    let artifact = frontend.into_result()?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, artifact.mime_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.filename),
        )
        .header(header::CONTENT_LENGTH, artifact.size())
        .body(Body::from(artifact.data))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}

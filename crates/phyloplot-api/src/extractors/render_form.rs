//! Multipart render form extractor and the HTTP front-end adapter.

use async_trait::async_trait;
use axum::extract::multipart::Field;
use axum::extract::{FromRequest, Multipart, Request};
use phyloplot_core::error::AppError;
use phyloplot_render::{RenderError, RenderFrontend, RenderParams, RenderedArtifact, UploadedFile};
use tracing::debug;

use crate::error::ApiError;

/// The render form of `POST /api/render`, read into a raw parameter bag.
///
/// Only multipart decoding problems are rejected here; everything about
/// the values themselves is left to the pipeline's validation.
#[derive(Debug, Default)]
pub struct RenderForm(pub RenderParams);

impl<S> FromRequest<S> for RenderForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(format!("Expected a multipart form: {e}")))?;

        let mut params = RenderParams::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "metadata_file" => params.metadata_file = Some(read_file(field).await?),
                "tree_file" => params.tree_file = Some(read_file(field).await?),
                "marker_column" => params.marker_column = Some(read_text(field).await?),
                "highlight_column" => params.highlight_column = Some(read_text(field).await?),
                "highlight_values" | "highlight_values[]" => {
                    let value = read_text(field).await?;
                    if !value.is_empty() {
                        params.highlight_values.push(value);
                    }
                }
                "label_column" => params.label_column = Some(read_text(field).await?),
                "label_size" => params.label_size = Some(read_text(field).await?),
                "tip_size" => params.tip_size = Some(read_text(field).await?),
                "output_format" => params.output_format = Some(read_text(field).await?),
                other => debug!(field = other, "Ignoring unknown form field"),
            }
        }

        Ok(Self(params))
    }
}

/// Read a file field; the declared file name falls back to the field name.
pub async fn read_file(field: Field<'_>) -> Result<UploadedFile, AppError> {
    let name = field
        .file_name()
        .or(field.name())
        .unwrap_or_default()
        .to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::validation(format!("Read error: {e}")))?;
    Ok(UploadedFile::new(name, data))
}

/// Read a text field.
pub async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::validation(format!("Read error: {e}")))
}

/// Adapts one HTTP request to the pipeline's front-end trait: the form is
/// collected once, and the presented result is kept for the response.
#[derive(Debug)]
pub struct HttpFrontend {
    params: Option<RenderParams>,
    result: Option<Result<RenderedArtifact, RenderError>>,
}

impl HttpFrontend {
    /// Wrap a decoded form.
    pub fn new(form: RenderForm) -> Self {
        Self {
            params: Some(form.0),
            result: None,
        }
    }

    /// The presented result.
    pub fn into_result(self) -> Result<RenderedArtifact, AppError> {
        match self.result {
            Some(result) => result.map_err(AppError::from),
            None => Err(AppError::internal("render finished without a result")),
        }
    }
}

#[async_trait]
impl RenderFrontend for HttpFrontend {
    async fn collect(&mut self) -> Result<RenderParams, RenderError> {
        self.params
            .take()
            .ok_or_else(|| RenderError::validation("render form already consumed"))
    }

    async fn present(
        &mut self,
        result: Result<RenderedArtifact, RenderError>,
    ) -> Result<(), RenderError> {
        self.result = Some(result);
        Ok(())
    }
}

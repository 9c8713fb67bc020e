//! Metadata inspection handler.

use axum::Json;
use axum::extract::Multipart;
use phyloplot_core::error::AppError;
use phyloplot_render::MetadataTable;

use crate::dto::response::{ApiResponse, InspectResponse};
use crate::error::ApiError;
use crate::extractors::render_form::{read_file, read_text};

/// POST /api/metadata/inspect
///
/// Returns the columns of an uploaded metadata table and, when `column` is
/// given, that column's distinct non-missing values. Front-ends use this
/// to offer column and highlight-value choices before rendering.
pub async fn inspect(
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<InspectResponse>>, ApiError> {
    let mut file = None;
    let mut column: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "metadata_file" => file = Some(read_file(field).await?),
            "column" => {
                let text = read_text(field).await?;
                let text = text.trim();
                if !text.is_empty() {
                    column = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::validation("metadata_file is required"))?;
    let table = MetadataTable::parse(&file.data)?;

    let values = match &column {
        Some(column) => Some(
            table
                .distinct_values(column)
                .ok_or_else(|| {
                    AppError::validation(format!(
                        "column '{column}' is not a metadata column (available: {})",
                        table.columns().join(", ")
                    ))
                })?
                .into_iter()
                .map(str::to_string)
                .collect(),
        ),
        None => None,
    };

    Ok(Json(ApiResponse::ok(InspectResponse {
        columns: table.columns().into_iter().map(str::to_string).collect(),
        row_count: table.row_count(),
        column,
        values,
    })))
}

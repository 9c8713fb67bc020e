//! Input validation: raw parameter bag in, [`RenderRequest`] out.
//!
//! Pure function of its input. Checks run in a fixed order and the first
//! violation is reported, so the user always sees the earliest problem.

use std::ops::RangeInclusive;

use phyloplot_core::types::OutputFormat;

use crate::error::RenderError;
use crate::metadata::MetadataTable;
use crate::models::{Highlight, NO_HIGHLIGHT, RenderParams, RenderRequest, UploadedFile};
use crate::newick;

/// Valid range for `label_size`.
pub const LABEL_SIZE_RANGE: RangeInclusive<u8> = 1..=20;
/// Valid range for `tip_size`.
pub const TIP_SIZE_RANGE: RangeInclusive<u8> = 1..=10;
/// Size used when a front-end leaves a size unset.
pub const DEFAULT_SIZE: u8 = 5;

/// Validate a raw parameter bag.
pub fn validate(params: RenderParams) -> Result<RenderRequest, RenderError> {
    // 1. files
    let metadata_file = require_file(params.metadata_file, "metadata_file")?;
    let tree_file = require_file(params.tree_file, "tree_file")?;

    // 2. metadata table, then tree syntax
    let table = MetadataTable::parse(&metadata_file.data)?;
    newick::check(&tree_file.data)?;

    // 3. column choices
    let marker_column = require_column(&table, params.marker_column, "marker_column")?;
    let label_column = require_column(&table, params.label_column, "label_column")?;

    // 4. highlighting
    let highlight = resolve_highlight(&table, params.highlight_column, params.highlight_values)?;

    // 5. sizes
    let label_size = parse_size(params.label_size.as_deref(), "label_size", LABEL_SIZE_RANGE)?;
    let tip_size = parse_size(params.tip_size.as_deref(), "tip_size", TIP_SIZE_RANGE)?;

    // 6. format
    let output_format = match non_blank(params.output_format) {
        Some(raw) => raw
            .parse::<OutputFormat>()
            .map_err(|e| RenderError::validation(format!("output_format: {e}")))?,
        None => OutputFormat::default(),
    };

    Ok(RenderRequest {
        metadata_file,
        tree_file,
        marker_column,
        highlight,
        label_column,
        label_size,
        tip_size,
        output_format,
    })
}

/// Whether a highlight column value means "highlighting disabled".
pub fn is_no_highlight(column: &str) -> bool {
    let column = column.trim();
    column.is_empty() || column.eq_ignore_ascii_case(NO_HIGHLIGHT)
}

fn require_file(file: Option<UploadedFile>, field: &str) -> Result<UploadedFile, RenderError> {
    match file {
        Some(file) if !file.is_empty() => Ok(file),
        Some(file) => Err(RenderError::validation(format!(
            "{field} '{}' is empty",
            file.name
        ))),
        None => Err(RenderError::validation(format!("{field} is required"))),
    }
}

fn require_column(
    table: &MetadataTable,
    column: Option<String>,
    field: &str,
) -> Result<String, RenderError> {
    let column = non_blank(column)
        .ok_or_else(|| RenderError::validation(format!("{field} is required")))?;

    if !table.has_column(&column) {
        return Err(RenderError::validation(format!(
            "{field} '{column}' is not a metadata column (available: {})",
            table.columns().join(", ")
        )));
    }
    Ok(column)
}

fn resolve_highlight(
    table: &MetadataTable,
    column: Option<String>,
    values: Vec<String>,
) -> Result<Highlight, RenderError> {
    let column = match column {
        Some(column) if !is_no_highlight(&column) => column.trim().to_string(),
        // Disabled highlighting ignores any values that came along.
        _ => return Ok(Highlight::Disabled),
    };

    let observed = table.distinct_values(&column).ok_or_else(|| {
        RenderError::validation(format!(
            "highlight_column '{column}' is not a metadata column (available: {})",
            table.columns().join(", ")
        ))
    })?;

    let mut selected: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        // Cells are compared trimmed, so requested values are too.
        let value = value.trim().to_string();
        if !observed.contains(&value.as_str()) {
            return Err(RenderError::validation(format!(
                "highlight value '{value}' does not occur in column '{column}'"
            )));
        }
        if !selected.contains(&value) {
            selected.push(value);
        }
    }

    Ok(Highlight::Column {
        column,
        values: selected,
    })
}

fn parse_size(
    raw: Option<&str>,
    field: &str,
    range: RangeInclusive<u8>,
) -> Result<u8, RenderError> {
    let out_of_range = || {
        RenderError::validation(format!(
            "{field} must be an integer between {} and {}",
            range.start(),
            range.end()
        ))
    };

    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(DEFAULT_SIZE),
    };

    let value: i64 = raw.parse().map_err(|_| out_of_range())?;
    u8::try_from(value)
        .ok()
        .filter(|v| range.contains(v))
        .ok_or_else(out_of_range)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

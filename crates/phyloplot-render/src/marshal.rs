//! Argument marshaling for the external renderer.
//!
//! The renderer takes nine positional arguments:
//!
//! ```text
//! metadata  tree  marker  highlight_col|NA  highlight_values_csv|NA  label  label_size  tip_size  output
//! ```
//!
//! Arguments are passed to the child as a vector, never through a shell,
//! but values that a shell-style consumer would read ambiguously are still
//! refused here.

use std::path::{Path, PathBuf};

use crate::error::RenderError;
use crate::models::{Highlight, RenderRequest};

/// Placeholder for "not set" in the renderer's argument vector.
pub const NA: &str = "NA";

/// Number of positional arguments the renderer expects.
pub const ARG_COUNT: usize = 9;

/// Characters refused in any column name or value.
const FORBIDDEN: &[char] = &['`', '$', ';', '|', '&', '<', '>', '"', '\'', '\\'];

/// Staged file locations inside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedInputs {
    /// Staged metadata table.
    pub metadata_path: PathBuf,
    /// Staged Newick tree.
    pub tree_path: PathBuf,
    /// Where the renderer must write the artifact.
    pub output_path: PathBuf,
}

/// Build the renderer's positional argument vector.
pub fn marshal(request: &RenderRequest, staged: &StagedInputs) -> Result<Vec<String>, RenderError> {
    let expected_ext = request.output_format.extension();
    if staged.output_path.extension().and_then(|e| e.to_str()) != Some(expected_ext) {
        return Err(RenderError::validation(format!(
            "output path '{}' does not end in .{expected_ext}",
            staged.output_path.display()
        )));
    }

    check_safe("marker_column", &request.marker_column)?;
    check_safe("label_column", &request.label_column)?;

    let (highlight_column, highlight_values) = match &request.highlight {
        Highlight::Disabled => (NA.to_string(), NA.to_string()),
        Highlight::Column { column, values } => {
            check_safe("highlight_column", column)?;
            if column == NA {
                return Err(RenderError::validation(
                    "highlight_column named 'NA' cannot be told apart from no highlighting",
                ));
            }
            for value in values {
                check_safe("highlight value", value)?;
                if value.contains(',') {
                    return Err(RenderError::validation(format!(
                        "highlight value '{value}' contains ',' which separates values"
                    )));
                }
            }
            let joined = if values.is_empty() {
                NA.to_string()
            } else {
                values.join(",")
            };
            (column.clone(), joined)
        }
    };

    Ok(vec![
        path_arg(&staged.metadata_path)?,
        path_arg(&staged.tree_path)?,
        request.marker_column.clone(),
        highlight_column,
        highlight_values,
        request.label_column.clone(),
        request.label_size.to_string(),
        request.tip_size.to_string(),
        path_arg(&staged.output_path)?,
    ])
}

fn check_safe(field: &str, value: &str) -> Result<(), RenderError> {
    if let Some(bad) = value
        .chars()
        .find(|c| c.is_control() || FORBIDDEN.contains(c))
    {
        return Err(RenderError::validation(format!(
            "{field} '{}' contains the disallowed character {bad:?}",
            value.escape_debug()
        )));
    }
    Ok(())
}

fn path_arg(path: &Path) -> Result<String, RenderError> {
    path.to_str().map(str::to_string).ok_or_else(|| {
        RenderError::validation(format!("path '{}' is not valid UTF-8", path.display()))
    })
}

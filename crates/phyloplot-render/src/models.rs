//! Domain models: the raw parameter bag, the validated request, the
//! renderer outcome, and the delivered artifact.

use std::path::PathBuf;

use bytes::Bytes;
use phyloplot_core::types::{OutputFormat, SessionId};
use serde::{Deserialize, Serialize};

/// Highlight column value meaning "no highlighting".
pub const NO_HIGHLIGHT: &str = "none";

/// Suggested download name stem for every artifact.
pub const ARTIFACT_STEM: &str = "phylogenetic_tree";

/// An uploaded file: declared name plus content.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    /// Name the client declared for the file.
    pub name: String,
    /// Raw file bytes.
    pub data: Bytes,
}

impl UploadedFile {
    /// Create an uploaded file from a name and its bytes.
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Whether the file carries no content.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Raw parameter bag as collected by a front-end.
///
/// Everything is optional text here; [`crate::validator::validate`] turns it
/// into a [`RenderRequest`] or explains what is wrong.
#[derive(Debug, Clone, Default)]
pub struct RenderParams {
    /// Tab-separated metadata table.
    pub metadata_file: Option<UploadedFile>,
    /// Newick tree.
    pub tree_file: Option<UploadedFile>,
    /// Column driving tip marker color.
    pub marker_column: Option<String>,
    /// Column used for highlighting, or `"none"`.
    pub highlight_column: Option<String>,
    /// Values of the highlight column to emphasize.
    pub highlight_values: Vec<String>,
    /// Column used for tip labels.
    pub label_column: Option<String>,
    /// Label size, 1..=20.
    pub label_size: Option<String>,
    /// Tip size, 1..=10.
    pub tip_size: Option<String>,
    /// png, pdf, svg or tiff.
    pub output_format: Option<String>,
}

/// Highlighting choice of a validated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Highlight {
    /// No tips are highlighted.
    Disabled,
    /// Tips whose `column` value is one of `values` are highlighted.
    Column {
        /// Header name of the highlight column.
        column: String,
        /// Selected values, in the order the user gave them.
        values: Vec<String>,
    },
}

/// A validated render request. Immutable once built.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Metadata table upload.
    pub metadata_file: UploadedFile,
    /// Newick tree upload.
    pub tree_file: UploadedFile,
    /// Column driving tip marker color.
    pub marker_column: String,
    /// Highlighting choice.
    pub highlight: Highlight,
    /// Column used for tip labels.
    pub label_column: String,
    /// Label size, 1..=20.
    pub label_size: u8,
    /// Tip size, 1..=10.
    pub tip_size: u8,
    /// Requested artifact format.
    pub output_format: OutputFormat,
}

/// Classification of a failed render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The renderer exited non-zero.
    Rendering,
    /// The renderer exited zero without writing the artifact.
    NoOutput,
    /// The renderer could not be started.
    Unavailable,
    /// The renderer was killed after exceeding its time budget.
    TimedOut,
}

/// What a render attempt produced. Exactly one of success or failure.
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    /// The renderer exited cleanly and the artifact is on disk.
    Success {
        /// Artifact location inside the session directory.
        artifact_path: PathBuf,
        /// Artifact format.
        format: OutputFormat,
    },
    /// The render did not produce a usable artifact.
    Failure {
        /// Failure classification.
        kind: FailureKind,
        /// Short human-readable reason.
        reason: String,
        /// Renderer stderr or other diagnostic detail (may be empty).
        diagnostic_output: String,
        /// Exit code, when the renderer ran to completion.
        exit_code: Option<i32>,
    },
}

impl RenderOutcome {
    /// Build a failure outcome without an exit code.
    pub fn failure(
        kind: FailureKind,
        reason: impl Into<String>,
        diagnostic_output: impl Into<String>,
    ) -> Self {
        Self::Failure {
            kind,
            reason: reason.into(),
            diagnostic_output: diagnostic_output.into(),
            exit_code: None,
        }
    }

    /// Whether this is a success outcome.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A delivered artifact, ready to hand to the caller.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    /// Session the artifact was produced in (already destroyed).
    pub session_id: SessionId,
    /// Artifact bytes.
    pub data: Bytes,
    /// Suggested download file name, e.g. `phylogenetic_tree.png`.
    pub filename: String,
    /// MIME type matching the format.
    pub mime_type: &'static str,
    /// Artifact format.
    pub format: OutputFormat,
}

impl RenderedArtifact {
    /// Artifact size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Suggested download file name for a format.
pub fn artifact_filename(format: OutputFormat) -> String {
    format!("{ARTIFACT_STEM}.{}", format.extension())
}

//! Unified error type for the render pipeline.
//!
//! Every stage reports failures through `RenderError`, which maps cleanly
//! to `phyloplot_core::error::AppError` at the front-end boundary.

use phyloplot_core::error::AppError;
use thiserror::Error;

/// Unified error type for all render pipeline operations.
#[derive(Debug, Error)]
pub enum RenderError {
    // --- Input errors ---
    /// The parameter bag is missing something or holds an out-of-range value.
    /// The message is shown to the user verbatim.
    #[error("{0}")]
    Validation(String),

    // --- Workspace errors ---
    /// A session directory or staged file could not be created or written.
    #[error("Session storage error: {message}")]
    Storage {
        /// What was being attempted.
        message: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    // --- Renderer errors ---
    /// The renderer exited with a non-zero status.
    #[error("Renderer failed{}: {stderr}", exit_suffix(.code))]
    RendererFailed {
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured (truncated) stderr output.
        stderr: String,
    },

    /// The renderer exited successfully but left no usable artifact.
    #[error("Renderer reported success but produced no output ({detail})")]
    OutputMissing {
        /// What was found at the expected artifact path.
        detail: String,
    },

    /// The renderer could not be started (missing binary, permissions).
    #[error("Renderer unavailable: could not start '{program}': {reason}")]
    RendererUnavailable {
        /// Program that failed to spawn.
        program: String,
        /// Spawn error description.
        reason: String,
    },

    /// The renderer exceeded its wall-clock budget and was killed.
    #[error("Renderer timed out after {timeout_seconds}s")]
    Timeout {
        /// The timeout that was exceeded.
        timeout_seconds: u64,
    },

    // --- Generic errors ---
    /// IO error outside of session staging (reading the artifact).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The render slot semaphore was closed.
    #[error("Render slots are no longer available")]
    SlotsClosed,
}

fn exit_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" with exit code {c}"))
        .unwrap_or_default()
}

impl RenderError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a storage failure with its I/O cause.
    pub fn storage(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            message: message.into(),
            source,
        }
    }

    /// Whether the user can fix this by changing their input.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::RendererFailed { .. } | Self::OutputMissing { .. }
        )
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        match &err {
            RenderError::Validation(_) => AppError::validation(err.to_string()),
            RenderError::Storage { .. } | RenderError::Io(_) => AppError::storage(err.to_string()),
            RenderError::RendererFailed { .. } | RenderError::OutputMissing { .. } => {
                AppError::rendering(err.to_string())
            }
            RenderError::RendererUnavailable { .. } | RenderError::SlotsClosed => {
                AppError::renderer_unavailable(err.to_string())
            }
            RenderError::Timeout { .. } => AppError::timeout(err.to_string()),
        }
    }
}

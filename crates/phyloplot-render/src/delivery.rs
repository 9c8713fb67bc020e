//! Result delivery: outcome in, artifact or typed error out.
//!
//! Whatever happens, the session directory is destroyed before returning.

use phyloplot_core::config::RendererConfig;
use tracing::{debug, warn};

use crate::error::RenderError;
use crate::models::{FailureKind, RenderOutcome, RenderedArtifact, artifact_filename};
use crate::workspace::{Session, SessionWorkspace};

/// Turns a [`RenderOutcome`] into something a front-end can present.
#[derive(Debug, Clone)]
pub struct ResultDelivery {
    workspace: SessionWorkspace,
    program: String,
    timeout_seconds: u64,
}

impl ResultDelivery {
    /// Create a delivery stage for sessions of `workspace`.
    pub fn new(workspace: SessionWorkspace, renderer: &RendererConfig) -> Self {
        Self {
            workspace,
            program: renderer.program.clone(),
            timeout_seconds: renderer.timeout_seconds,
        }
    }

    /// Deliver the outcome of a render and destroy the session.
    ///
    /// On success the artifact bytes are read into memory before the session
    /// is removed. Failures are converted without touching the filesystem.
    pub async fn deliver(
        &self,
        session: Session,
        outcome: RenderOutcome,
    ) -> Result<RenderedArtifact, RenderError> {
        let result = match outcome {
            RenderOutcome::Success {
                artifact_path,
                format,
            } => {
                if artifact_path.parent() != Some(session.dir()) {
                    Err(RenderError::validation(format!(
                        "artifact '{}' is outside its session",
                        artifact_path.display()
                    )))
                } else {
                    tokio::fs::read(&artifact_path)
                        .await
                        .map(|data| RenderedArtifact {
                            session_id: session.id(),
                            data: data.into(),
                            filename: artifact_filename(format),
                            mime_type: format.mime_type(),
                            format,
                        })
                        .map_err(|e| RenderError::storage("cannot read rendered artifact", e))
                }
            }
            RenderOutcome::Failure {
                kind,
                reason,
                diagnostic_output,
                exit_code,
            } => Err(self.failure_error(kind, reason, diagnostic_output, exit_code)),
        };

        self.workspace.destroy(&session).await;

        match &result {
            Ok(artifact) => debug!(
                session_id = %session.id(),
                bytes = artifact.size(),
                mime = artifact.mime_type,
                "Artifact delivered"
            ),
            Err(e) => warn!(session_id = %session.id(), error = %e, "Render not delivered"),
        }
        result
    }

    /// Destroy a session whose run failed before the renderer was invoked,
    /// passing the error through.
    pub async fn abandon(&self, session: Session, err: RenderError) -> RenderError {
        warn!(session_id = %session.id(), error = %err, "Abandoning session");
        self.workspace.destroy(&session).await;
        err
    }

    fn failure_error(
        &self,
        kind: FailureKind,
        reason: String,
        diagnostic_output: String,
        exit_code: Option<i32>,
    ) -> RenderError {
        match kind {
            FailureKind::Rendering => RenderError::RendererFailed {
                code: exit_code,
                stderr: if diagnostic_output.is_empty() {
                    reason
                } else {
                    diagnostic_output
                },
            },
            FailureKind::NoOutput => RenderError::OutputMissing {
                detail: diagnostic_output,
            },
            FailureKind::Unavailable => RenderError::RendererUnavailable {
                program: self.program.clone(),
                reason: diagnostic_output,
            },
            FailureKind::TimedOut => RenderError::Timeout {
                timeout_seconds: self.timeout_seconds,
            },
        }
    }
}

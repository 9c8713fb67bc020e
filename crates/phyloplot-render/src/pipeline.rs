//! Pipeline orchestration.
//!
//! One run is: validate → create session → stage inputs → marshal →
//! invoke → deliver. Validation happens before any session exists, so
//! rejected requests leave nothing behind. Every run that created a
//! session leaves through [`ResultDelivery`], which destroys it; a run
//! dropped before that point removes it through its
//! [`SessionGuard`](crate::workspace::SessionGuard).

use std::sync::Arc;
use std::time::{Duration, Instant};

use phyloplot_core::config::{RendererConfig, WorkspaceConfig};
use tokio::sync::Semaphore;
use tracing::{info, instrument};

use crate::delivery::ResultDelivery;
use crate::error::RenderError;
use crate::frontend::RenderFrontend;
use crate::invoker::RenderInvoker;
use crate::marshal::{StagedInputs, marshal};
use crate::metrics::{MetricsSnapshot, RenderMetrics};
use crate::models::{RenderOutcome, RenderParams, RenderRequest, RenderedArtifact};
use crate::validator::validate;
use crate::workspace::{Session, SessionWorkspace};

/// Staged metadata file name inside a session.
pub const METADATA_FILE: &str = "metadata.tsv";
/// Staged tree file name inside a session.
pub const TREE_FILE: &str = "tree.nwk";
/// Artifact file stem inside a session.
pub const OUTPUT_STEM: &str = "tree";

/// Drives render runs. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct RenderPipeline {
    workspace: SessionWorkspace,
    invoker: RenderInvoker,
    delivery: ResultDelivery,
    /// Bounds simultaneous renderer processes.
    limiter: Arc<Semaphore>,
    max_slots: usize,
    metrics: RenderMetrics,
    renderer: RendererConfig,
}

impl RenderPipeline {
    /// Build a pipeline, creating the workspace root if needed.
    pub fn new(
        renderer: &RendererConfig,
        workspace: &WorkspaceConfig,
    ) -> Result<Self, RenderError> {
        let ws = SessionWorkspace::new(workspace.effective_root())?;
        Ok(Self::with_workspace(renderer, ws))
    }

    /// Build a pipeline over an existing workspace.
    pub fn with_workspace(renderer: &RendererConfig, workspace: SessionWorkspace) -> Self {
        info!(
            renderer = %renderer.command_summary(),
            root = %workspace.root().display(),
            max_concurrent = renderer.max_concurrent_renders,
            "Render pipeline ready"
        );
        Self {
            invoker: RenderInvoker::new(renderer),
            delivery: ResultDelivery::new(workspace.clone(), renderer),
            workspace,
            limiter: Arc::new(Semaphore::new(renderer.max_concurrent_renders)),
            max_slots: renderer.max_concurrent_renders,
            metrics: RenderMetrics::new(),
            renderer: renderer.clone(),
        }
    }

    /// Run one render from a raw parameter bag.
    pub async fn render(&self, params: RenderParams) -> Result<RenderedArtifact, RenderError> {
        let request = validate(params).inspect_err(|e| {
            self.metrics.record_rejected();
            info!(reason = %e, "Render request rejected");
        })?;
        self.render_request(request).await
    }

    /// Run one render from an already validated request.
    #[instrument(skip_all, fields(format = %request.output_format))]
    pub async fn render_request(
        &self,
        request: RenderRequest,
    ) -> Result<RenderedArtifact, RenderError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| RenderError::SlotsClosed)?;

        let session = self.workspace.create().await?;
        let guard = self.workspace.guard(&session);
        let start = Instant::now();
        self.metrics.record_started();

        let outcome = match self.prepare_and_invoke(&session, &request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.metrics.record_aborted();
                let err = self.delivery.abandon(session, e).await;
                guard.disarm();
                return Err(err);
            }
        };

        let rendered = match &outcome {
            RenderOutcome::Failure { kind, .. } => {
                self.metrics.record_failure(*kind);
                false
            }
            RenderOutcome::Success { .. } => true,
        };

        let delivered = self.delivery.deliver(session, outcome).await;
        guard.disarm();
        let artifact = delivered.inspect_err(|_| {
            if rendered {
                self.metrics.record_aborted();
            }
        })?;
        let elapsed = start.elapsed();
        self.metrics
            .record_success(elapsed, artifact.size() as u64);
        info!(
            session_id = %artifact.session_id,
            elapsed_ms = elapsed.as_millis() as u64,
            bytes = artifact.size(),
            "Render delivered"
        );
        Ok(artifact)
    }

    async fn prepare_and_invoke(
        &self,
        session: &Session,
        request: &RenderRequest,
    ) -> Result<RenderOutcome, RenderError> {
        let staged = StagedInputs {
            metadata_path: self
                .workspace
                .stage(session, METADATA_FILE, &request.metadata_file.data)
                .await?,
            tree_path: self
                .workspace
                .stage(session, TREE_FILE, &request.tree_file.data)
                .await?,
            output_path: self.workspace.path(
                session,
                &format!("{OUTPUT_STEM}.{}", request.output_format.extension()),
            )?,
        };

        let args = marshal(request, &staged)?;
        Ok(self
            .invoker
            .invoke(
                &args,
                session.dir(),
                &staged.output_path,
                request.output_format,
            )
            .await)
    }

    /// Collect a parameter bag from `frontend`, render it, and present the
    /// result back.
    pub async fn serve(&self, frontend: &mut dyn RenderFrontend) -> Result<(), RenderError> {
        let result = match frontend.collect().await {
            Ok(params) => self.render(params).await,
            Err(e) => Err(e),
        };
        frontend.present(result).await
    }

    /// Remove session directories left behind by earlier processes.
    pub async fn sweep_stale(&self, max_age: Duration) -> usize {
        self.workspace.sweep_stale(max_age).await
    }

    /// The session workspace.
    pub fn workspace(&self) -> &SessionWorkspace {
        &self.workspace
    }

    /// Renderer settings in use.
    pub fn renderer_config(&self) -> &RendererConfig {
        &self.renderer
    }

    /// Render slots not currently taken.
    pub fn available_slots(&self) -> usize {
        self.limiter.available_permits()
    }

    /// Total render slots.
    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    /// Current metrics.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

//! The seam between the pipeline and the surfaces that drive it.

use async_trait::async_trait;

use crate::error::RenderError;
use crate::models::{RenderParams, RenderedArtifact};

/// A user-facing surface (HTTP form, command line, ...) that gathers a
/// parameter bag and shows the result of rendering it.
///
/// The pipeline only talks to front-ends through this trait.
#[async_trait]
pub trait RenderFrontend: Send {
    /// Gather a raw parameter bag from the user.
    async fn collect(&mut self) -> Result<RenderParams, RenderError>;

    /// Show the artifact or the error to the user.
    async fn present(
        &mut self,
        result: Result<RenderedArtifact, RenderError>,
    ) -> Result<(), RenderError>;
}

//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use phyloplot_core::config::AppConfig;
use phyloplot_render::RenderPipeline;

/// Shared application state, cloned into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// The render pipeline.
    pub pipeline: Arc<RenderPipeline>,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Build state around an existing pipeline.
    pub fn new(config: AppConfig, pipeline: Arc<RenderPipeline>) -> Self {
        Self {
            config: Arc::new(config),
            pipeline,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

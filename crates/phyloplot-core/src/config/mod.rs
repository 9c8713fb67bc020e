//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every section has defaults so an empty file is a valid config.

pub mod app;
pub mod logging;
pub mod renderer;
pub mod workspace;

use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::app::{CorsConfig, ServerConfig};
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::renderer::RendererConfig;
pub use self::workspace::WorkspaceConfig;

use crate::error::AppError;

/// Prefix for environment variable overrides, e.g.
/// `PHYLOPLOT__RENDERER__PROGRAM=/usr/bin/Rscript`.
pub const ENV_PREFIX: &str = "PHYLOPLOT";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    /// External renderer settings.
    #[serde(default)]
    #[validate(nested)]
    pub renderer: RendererConfig,
    /// Session workspace settings.
    #[serde(default)]
    #[validate(nested)]
    pub workspace: WorkspaceConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `config_path`, then an optional `<env>.toml` overlay next to it,
    /// then environment variables prefixed with `PHYLOPLOT__`. Missing files
    /// are not an error. The merged result is range-checked.
    pub fn load(config_path: &str, env: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false));

        if let Some(env) = env {
            let overlay = Path::new(config_path).with_file_name(env);
            builder = builder.add_source(
                config::File::with_name(&overlay.to_string_lossy()).required(false),
            );
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app_config.check()?;
        Ok(app_config)
    }

    /// Range-check every section.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;

        if self.server.request_timeout_seconds <= self.renderer.timeout_seconds {
            tracing::warn!(
                request_timeout_s = self.server.request_timeout_seconds,
                renderer_timeout_s = self.renderer.timeout_seconds,
                "HTTP request timeout does not exceed the renderer timeout; slow renders will be cut off by the server first"
            );
        }

        Ok(())
    }
}

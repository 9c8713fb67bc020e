//! PhyloPlot server: phylogenetic tree rendering over HTTP.
//!
//! Main entry point that loads configuration, sets up logging, and starts
//! the API server.

use tracing_subscriber::{EnvFilter, fmt};

use phyloplot_core::config::{AppConfig, LogFormat};
use phyloplot_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    tracing::info!("Starting PhyloPlot v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = phyloplot_api::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file, optional environment overlay, and
/// `PHYLOPLOT__*` variables.
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("PHYLOPLOT_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    let env = std::env::var("PHYLOPLOT_ENV").ok();

    AppConfig::load(&config_path, env.as_deref())
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

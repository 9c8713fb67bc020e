//! CLI command definitions and dispatch.

pub mod config;
pub mod inspect;
pub mod render;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use phyloplot_core::config::AppConfig;
use phyloplot_core::AppResult;

/// PhyloPlot: render annotated phylogenetic trees
#[derive(Debug, Parser)]
#[command(name = "phyloplot", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded next to the configuration file
    #[arg(short, long, env = "PHYLOPLOT_ENV")]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render a tree with the external renderer
    Render(render::RenderArgs),
    /// List the columns of a metadata table, or one column's values
    Inspect(inspect::InspectArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> AppResult<()> {
        match &self.command {
            Commands::Render(args) => render::execute(args, &self.settings()?, self.format).await,
            Commands::Inspect(args) => inspect::execute(args, self.format).await,
            Commands::Config(args) => {
                config::execute(args, &self.config, self.env.as_deref(), self.format).await
            }
        }
    }

    fn settings(&self) -> AppResult<AppConfig> {
        load_config(&self.config, self.env.as_deref())
    }
}

/// Helper: load configuration from file, overlay, and environment
pub fn load_config(config_path: &str, env: Option<&str>) -> AppResult<AppConfig> {
    AppConfig::load(config_path, env)
}

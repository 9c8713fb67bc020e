//! `phyloplot render`: run the pipeline from the command line.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use clap::Args;
use phyloplot_core::config::AppConfig;
use phyloplot_core::error::AppError;
use phyloplot_core::types::OutputFormat as ImageFormat;
use phyloplot_render::{
    RenderError, RenderFrontend, RenderParams, RenderPipeline, RenderedArtifact, UploadedFile,
};
use serde::Serialize;

use crate::output::{self, OutputFormat};

/// Arguments for the render command
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Tab-separated metadata table
    #[arg(short, long)]
    pub metadata: PathBuf,

    /// Newick tree file
    #[arg(short, long)]
    pub tree: PathBuf,

    /// Column driving tip marker color
    #[arg(long)]
    pub marker_column: String,

    /// Column used for tip labels
    #[arg(long)]
    pub label_column: String,

    /// Column used for highlighting ("none" to disable)
    #[arg(long)]
    pub highlight_column: Option<String>,

    /// Highlighted value of the highlight column (repeatable)
    #[arg(long = "highlight-value")]
    pub highlight_values: Vec<String>,

    /// Tip label size, 1-20
    #[arg(long)]
    pub label_size: Option<String>,

    /// Tip marker size, 1-10
    #[arg(long)]
    pub tip_size: Option<String>,

    /// Image format: png, pdf, svg, or tiff
    #[arg(long = "format", alias = "output-format")]
    pub image_format: Option<String>,

    /// Where to write the image (default: phylogenetic_tree.<ext>)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Render summary for JSON output
#[derive(Debug, Serialize)]
struct RenderSummary {
    file: String,
    bytes: usize,
    mime_type: &'static str,
    format: ImageFormat,
}

/// Reads the inputs from disk and writes the artifact back to disk.
struct CliFrontend {
    args: RenderArgs,
    format: OutputFormat,
}

impl CliFrontend {
    fn target(&self, artifact: &RenderedArtifact) -> PathBuf {
        self.args
            .out
            .clone()
            .unwrap_or_else(|| PathBuf::from(&artifact.filename))
    }
}

async fn read_upload(path: &Path, what: &str) -> Result<UploadedFile, RenderError> {
    let data = tokio::fs::read(path).await.map_err(|e| {
        RenderError::validation(format!("cannot read {what} '{}': {e}", path.display()))
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(UploadedFile::new(name, data))
}

#[async_trait]
impl RenderFrontend for CliFrontend {
    async fn collect(&mut self) -> Result<RenderParams, RenderError> {
        Ok(RenderParams {
            metadata_file: Some(read_upload(&self.args.metadata, "metadata file").await?),
            tree_file: Some(read_upload(&self.args.tree, "tree file").await?),
            marker_column: Some(self.args.marker_column.clone()),
            highlight_column: self.args.highlight_column.clone(),
            highlight_values: self.args.highlight_values.clone(),
            label_column: Some(self.args.label_column.clone()),
            label_size: self.args.label_size.clone(),
            tip_size: self.args.tip_size.clone(),
            output_format: self.args.image_format.clone(),
        })
    }

    async fn present(
        &mut self,
        result: Result<RenderedArtifact, RenderError>,
    ) -> Result<(), RenderError> {
        let artifact = result?;
        let target = self.target(&artifact);

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RenderError::storage(format!("cannot create '{}'", parent.display()), e)
            })?;
        }
        tokio::fs::write(&target, &artifact.data)
            .await
            .map_err(|e| RenderError::storage(format!("cannot write '{}'", target.display()), e))?;

        match self.format {
            OutputFormat::Table => {
                output::print_success(&format!("Tree written to '{}'", target.display()));
                output::print_kv("Format", artifact.format.extension());
                output::print_kv("Size", &format!("{} bytes", artifact.size()));
            }
            OutputFormat::Json => output::print_item(
                &RenderSummary {
                    file: target.display().to_string(),
                    bytes: artifact.size(),
                    mime_type: artifact.mime_type,
                    format: artifact.format,
                },
                self.format,
            ),
        }
        Ok(())
    }
}

/// Execute the render command
pub async fn execute(
    args: &RenderArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pipeline = RenderPipeline::new(&config.renderer, &config.workspace)?;
    let mut frontend = CliFrontend {
        args: args.clone(),
        format,
    };
    pipeline.serve(&mut frontend).await?;
    Ok(())
}

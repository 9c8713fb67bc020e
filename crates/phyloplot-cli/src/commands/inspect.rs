//! `phyloplot inspect`: show what a metadata table offers.

use std::path::PathBuf;

use clap::Args;
use phyloplot_core::error::AppError;
use phyloplot_render::MetadataTable;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};

/// Arguments for the inspect command
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Tab-separated metadata table
    pub file: PathBuf,

    /// List the distinct values of this column instead of the columns
    #[arg(long)]
    pub column: Option<String>,
}

/// Column display row
#[derive(Debug, Serialize, Tabled)]
struct ColumnRow {
    /// Position in the header
    #[tabled(rename = "#")]
    index: usize,
    /// Column name
    name: String,
    /// Number of distinct non-missing values
    #[tabled(rename = "distinct values")]
    distinct: usize,
}

/// Value display row
#[derive(Debug, Serialize, Tabled)]
struct ValueRow {
    /// Distinct value
    value: String,
}

/// Execute the inspect command
pub async fn execute(args: &InspectArgs, format: OutputFormat) -> Result<(), AppError> {
    let data = tokio::fs::read(&args.file).await.map_err(|e| {
        AppError::validation(format!("cannot read '{}': {e}", args.file.display()))
    })?;
    let table = MetadataTable::parse(&data)?;

    match &args.column {
        None => {
            let rows: Vec<ColumnRow> = table
                .columns()
                .into_iter()
                .enumerate()
                .map(|(i, name)| ColumnRow {
                    index: i + 1,
                    name: name.to_string(),
                    distinct: table.distinct_values(name).map_or(0, |v| v.len()),
                })
                .collect();
            output::print_list(&rows, format);
            if format == OutputFormat::Table {
                output::print_kv("Rows", &table.row_count().to_string());
            }
        }
        Some(column) => {
            let values = table.distinct_values(column).ok_or_else(|| {
                AppError::validation(format!(
                    "column '{column}' is not a metadata column (available: {})",
                    table.columns().join(", ")
                ))
            })?;
            if values.is_empty() && format == OutputFormat::Table {
                output::print_warning(&format!("Column '{column}' has only missing values"));
                return Ok(());
            }
            let rows: Vec<ValueRow> = values
                .into_iter()
                .map(|v| ValueRow {
                    value: v.to_string(),
                })
                .collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}

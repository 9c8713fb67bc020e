//! External renderer configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// How to launch the external tree renderer.
///
/// The renderer is started as `program [leading_args...] <positional args>`.
/// With the defaults this is `Rscript ggtree_trial.R <...>`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RendererConfig {
    /// Executable to launch. Resolved through `PATH` when not absolute.
    #[serde(default = "default_program")]
    #[validate(length(min = 1))]
    pub program: String,

    /// Arguments placed before the positional render arguments.
    #[serde(default = "default_leading_args")]
    pub leading_args: Vec<String>,

    /// Wall-clock limit for one renderer process.
    #[serde(default = "default_timeout_seconds")]
    #[validate(range(min = 1, max = 3600))]
    pub timeout_seconds: u64,

    /// Maximum number of renderer processes running at the same time.
    #[serde(default = "default_max_concurrent_renders")]
    #[validate(range(min = 1, max = 64))]
    pub max_concurrent_renders: usize,

    /// Renderer stderr is truncated to this many characters in diagnostics.
    #[serde(default = "default_max_diagnostic_chars")]
    #[validate(range(min = 80))]
    pub max_diagnostic_chars: usize,

    /// Minimum artifact size (bytes) for a render to count as successful.
    #[serde(default = "default_min_output_bytes")]
    #[validate(range(min = 1))]
    pub min_output_bytes: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            leading_args: default_leading_args(),
            timeout_seconds: default_timeout_seconds(),
            max_concurrent_renders: default_max_concurrent_renders(),
            max_diagnostic_chars: default_max_diagnostic_chars(),
            min_output_bytes: default_min_output_bytes(),
        }
    }
}

impl RendererConfig {
    /// Human-readable command prefix, for logs and health output.
    pub fn command_summary(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.leading_args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn default_program() -> String {
    "Rscript".to_string()
}

fn default_leading_args() -> Vec<String> {
    vec!["ggtree_trial.R".to_string()]
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_max_concurrent_renders() -> usize {
    4
}

fn default_max_diagnostic_chars() -> usize {
    4000
}

fn default_min_output_bytes() -> u64 {
    1
}

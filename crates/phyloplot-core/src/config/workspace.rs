//! Session workspace configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Where per-run session directories live and how leftovers are swept.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WorkspaceConfig {
    /// Root directory for session directories. Defaults to `<tmp>/phyloplot`.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Session directories older than this are removed by the sweeper.
    #[serde(default = "default_stale_after")]
    #[validate(range(min = 60))]
    pub stale_after_seconds: u64,
    /// Interval between background sweeps (0 disables the periodic sweep).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: None,
            stale_after_seconds: default_stale_after(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl WorkspaceConfig {
    /// Resolve the effective workspace root directory.
    pub fn effective_root(&self) -> PathBuf {
        self.root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("phyloplot"))
    }
}

fn default_stale_after() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    600
}

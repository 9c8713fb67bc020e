//! Stub renderers and fixtures shared by the pipeline tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use phyloplot_core::config::RendererConfig;
use phyloplot_render::{RenderParams, RenderPipeline, SessionWorkspace, UploadedFile};
use tempfile::TempDir;

pub const METADATA: &str = "id\tcountry\tclade\n\
    s1\tKenya\tA\n\
    s2\tUganda\tA\n\
    s3\tKenya\tB\n\
    s4\tTanzania\tB\n\
    s5\tNA\tC\n";

pub const TREE: &str = "((s1:0.1,s2:0.2):0.3,(s3:0.1,s4:0.2):0.3,s5:0.5);";

/// A renderer that records its arguments (one per line) in `capture`, then
/// writes a fake artifact to the ninth argument.
pub fn capture_args_script(capture: &Path) -> String {
    format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\nprintf 'FAKE-IMAGE' > \"$9\"\n",
        capture.display()
    )
}

/// Writes the artifact after a short pause.
pub const SLOW_WRITE: &str = "#!/bin/sh\nsleep 0.3\nprintf 'FAKE-IMAGE' > \"$9\"\n";

/// Fails with a diagnostic.
pub const FAIL: &str = "#!/bin/sh\necho 'Error in read.tree(tree_file): bad tree' >&2\nexit 3\n";

/// Succeeds without writing anything.
pub const SILENT: &str = "#!/bin/sh\nexit 0\n";

/// Never finishes on its own.
pub const HANG: &str = "#!/bin/sh\nsleep 30\n";

/// Writes the artifact and exits, leaving a background process holding
/// its stdout and stderr.
pub const LINGER: &str = "#!/bin/sh\nsleep 5 &\nprintf 'FAKE-IMAGE' > \"$9\"\n";

/// A temporary directory holding a stub renderer and a session root.
pub struct Harness {
    pub dir: TempDir,
    pub pipeline: Arc<RenderPipeline>,
}

impl Harness {
    /// Build a pipeline whose renderer is `script`.
    pub fn new(script: &str) -> Self {
        Self::with_config(script, |_| {})
    }

    /// Build a pipeline whose renderer records its arguments; returns the
    /// file they are recorded in.
    pub fn capturing() -> (Self, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let capture = dir.path().join("captured-args.txt");
        let script = capture_args_script(&capture);
        (Self::in_dir(dir, &script, |_| {}), capture)
    }

    /// Build a pipeline whose renderer is `script`, adjusting the config.
    pub fn with_config(script: &str, adjust: impl FnOnce(&mut RendererConfig)) -> Self {
        Self::in_dir(tempfile::tempdir().expect("tempdir"), script, adjust)
    }

    fn in_dir(dir: TempDir, script: &str, adjust: impl FnOnce(&mut RendererConfig)) -> Self {
        let script_path = write_script(dir.path(), "renderer.sh", script);

        // Run via `sh`: exec'ing a just-written file can fail with ETXTBSY.
        let mut config = RendererConfig {
            program: "sh".to_string(),
            leading_args: vec![script_path.to_string_lossy().into_owned()],
            timeout_seconds: 10,
            ..RendererConfig::default()
        };
        adjust(&mut config);

        let workspace = SessionWorkspace::new(dir.path().join("sessions")).expect("workspace");
        let pipeline = Arc::new(RenderPipeline::with_workspace(&config, workspace));
        Self { dir, pipeline }
    }

    /// Session root of the pipeline.
    pub fn sessions(&self) -> PathBuf {
        self.pipeline.workspace().root().to_path_buf()
    }

    /// Number of entries left in the session root.
    pub fn leftover_sessions(&self) -> usize {
        std::fs::read_dir(self.sessions())
            .expect("read sessions")
            .count()
    }
}

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write script");
    path
}

/// The reference request: marker clade, highlight country = Kenya, label id.
pub fn params() -> RenderParams {
    RenderParams {
        metadata_file: Some(UploadedFile::new("metadata.tsv", METADATA)),
        tree_file: Some(UploadedFile::new("tree.nwk", TREE)),
        marker_column: Some("clade".to_string()),
        highlight_column: Some("country".to_string()),
        highlight_values: vec!["Kenya".to_string()],
        label_column: Some("id".to_string()),
        label_size: Some("5".to_string()),
        tip_size: Some("5".to_string()),
        output_format: Some("png".to_string()),
    }
}

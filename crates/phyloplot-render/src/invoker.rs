//! Renderer process execution.
//!
//! Spawns the configured renderer with the marshaled arguments, waits for it
//! under a wall-clock timeout, and classifies what happened into a
//! [`RenderOutcome`]. Never retries: a renderer that fails once will fail
//! the same way again for the same inputs.

use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use phyloplot_core::config::RendererConfig;
use phyloplot_core::types::OutputFormat;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::models::{FailureKind, RenderOutcome};

/// Runs the external renderer.
#[derive(Debug, Clone)]
pub struct RenderInvoker {
    program: String,
    leading_args: Vec<String>,
    timeout: Duration,
    min_output_bytes: u64,
    max_diagnostic_chars: usize,
}

impl RenderInvoker {
    /// Create an invoker from renderer settings.
    ///
    /// The child runs inside its session directory, so a relative program
    /// path (`./bin/render`) or a relative script argument that exists now
    /// (`ggtree_trial.R`) is made absolute against the current directory.
    pub fn new(config: &RendererConfig) -> Self {
        let program = if config.program.contains(std::path::MAIN_SEPARATOR) {
            absolutize(&config.program)
        } else {
            config.program.clone()
        };
        let leading_args = config
            .leading_args
            .iter()
            .map(|arg| {
                if arg.starts_with('-') || !Path::new(arg).exists() {
                    arg.clone()
                } else {
                    absolutize(arg)
                }
            })
            .collect();

        Self {
            program,
            leading_args,
            timeout: Duration::from_secs(config.timeout_seconds),
            min_output_bytes: config.min_output_bytes,
            max_diagnostic_chars: config.max_diagnostic_chars,
        }
    }

    /// Override the wall-clock timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments placed before the marshaled ones.
    pub fn leading_args(&self) -> &[String] {
        &self.leading_args
    }

    /// Program being launched.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Wall-clock limit for one process.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the renderer once.
    ///
    /// `workdir` becomes the child's working directory and `output` is where
    /// the artifact is expected. The artifact is only inspected after the
    /// process has exited. The timeout covers both the process and draining
    /// its pipes: a background process left holding them does not extend
    /// the run.
    pub async fn invoke(
        &self,
        args: &[String],
        workdir: &Path,
        output: &Path,
        format: OutputFormat,
    ) -> RenderOutcome {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            program = %self.program,
            args = ?args,
            workdir = %workdir.display(),
            timeout_s = self.timeout.as_secs(),
            "Spawning renderer"
        );

        let start = Instant::now();
        let deadline = tokio::time::Instant::now() + self.timeout;
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(program = %self.program, error = %e, "Renderer could not be started");
                return RenderOutcome::failure(
                    FailureKind::Unavailable,
                    "renderer unavailable",
                    e.to_string(),
                );
            }
        };

        // Drain both pipes concurrently so a chatty renderer cannot block on
        // a full pipe while we wait for it to exit.
        let stdout = PipeDrain::spawn(child.stdout.take());
        let stderr = PipeDrain::spawn(child.stderr.take());

        let status = tokio::select! {
            status = child.wait() => status,
            _ = tokio::time::sleep_until(deadline) => {
                error!(
                    program = %self.program,
                    timeout_s = self.timeout.as_secs(),
                    "Renderer timed out, killing"
                );
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill timed-out renderer");
                }
                stdout.abort();
                stderr.abort();
                return RenderOutcome::failure(
                    FailureKind::TimedOut,
                    format!("renderer timed out after {}s", self.timeout.as_secs()),
                    String::new(),
                );
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        let stdout = stdout.finish(deadline).await;
        let stderr = stderr.finish(deadline).await;

        if !stdout.is_empty() {
            debug!(stdout = %truncate(&stdout, self.max_diagnostic_chars), "Renderer stdout");
        }

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                error!(program = %self.program, error = %e, "Failed waiting for renderer");
                return RenderOutcome::failure(
                    FailureKind::Unavailable,
                    "renderer unavailable",
                    e.to_string(),
                );
            }
        };

        if !status.success() {
            let diagnostic = truncate(&stderr, self.max_diagnostic_chars);
            error!(
                program = %self.program,
                exit_code = ?status.code(),
                elapsed_ms,
                stderr = %truncate(&stderr, 500),
                "Renderer failed"
            );
            return RenderOutcome::Failure {
                kind: FailureKind::Rendering,
                reason: "renderer exited with an error".to_string(),
                diagnostic_output: diagnostic,
                exit_code: status.code(),
            };
        }

        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.is_file() && meta.len() >= self.min_output_bytes => {
                info!(
                    program = %self.program,
                    elapsed_ms,
                    bytes = meta.len(),
                    "Renderer completed"
                );
                RenderOutcome::Success {
                    artifact_path: output.to_path_buf(),
                    format,
                }
            }
            found => {
                let detail = match found {
                    Ok(meta) if !meta.is_file() => format!("{} is not a file", file_name(output)),
                    Ok(meta) => format!(
                        "{} is {} bytes, expected at least {}",
                        file_name(output),
                        meta.len(),
                        self.min_output_bytes
                    ),
                    Err(_) => format!("{} was not written", file_name(output)),
                };
                warn!(
                    program = %self.program,
                    output = %output.display(),
                    elapsed_ms,
                    detail = %detail,
                    "Renderer exited cleanly without an artifact"
                );
                RenderOutcome::Failure {
                    kind: FailureKind::NoOutput,
                    reason: "renderer reported success but produced no output".to_string(),
                    diagnostic_output: detail,
                    exit_code: Some(0),
                }
            }
        }
    }
}

/// Background reader of one child pipe. Bytes land in a shared buffer so
/// whatever was read survives an abort.
struct PipeDrain {
    task: JoinHandle<()>,
    buf: Arc<Mutex<Vec<u8>>>,
}

impl PipeDrain {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let task = tokio::spawn(async move {
            let Some(mut pipe) = pipe else {
                return;
            };
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend_from_slice(&chunk[..n]);
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, "Renderer pipe closed early");
                        break;
                    }
                }
            }
        });
        Self { task, buf }
    }

    fn abort(&self) {
        self.task.abort();
    }

    /// Wait for EOF until `deadline`, then return what was read.
    async fn finish(mut self, deadline: tokio::time::Instant) -> String {
        if tokio::time::timeout_at(deadline, &mut self.task).await.is_err() {
            warn!("Renderer pipe still open at the deadline, keeping partial output");
            self.task.abort();
        }
        let buf = self.buf.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn absolutize(path: &str) -> String {
    match std::path::absolute(path) {
        Ok(abs) => abs.to_string_lossy().into_owned(),
        Err(e) => {
            warn!(path, error = %e, "Cannot resolve renderer path");
            path.to_string()
        }
    }
}

/// Keep the tail of `text`, where R puts the actual error, within `max` chars.
fn truncate(text: &str, max: usize) -> String {
    let text = text.trim_end();
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - max).collect();
    format!("...{tail}")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_tail() {
        assert_eq!(truncate("short\n", 10), "short");
        assert_eq!(truncate("0123456789abc", 3), "...abc");
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = RendererConfig {
            program: "phyloplot-no-such-renderer".to_string(),
            leading_args: vec![],
            ..RendererConfig::default()
        };
        let invoker = RenderInvoker::new(&config);
        let outcome = invoker
            .invoke(&[], dir.path(), &dir.path().join("tree.png"), OutputFormat::Png)
            .await;

        match outcome {
            RenderOutcome::Failure { kind, reason, .. } => {
                assert_eq!(kind, FailureKind::Unavailable);
                assert_eq!(reason, "renderer unavailable");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_rendering_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = RendererConfig {
            program: "sh".to_string(),
            leading_args: vec!["-c".to_string(), "echo 'bad tree' >&2; exit 3".to_string()],
            ..RendererConfig::default()
        };
        let outcome = RenderInvoker::new(&config)
            .invoke(&[], dir.path(), &dir.path().join("tree.png"), OutputFormat::Png)
            .await;

        match outcome {
            RenderOutcome::Failure {
                kind,
                diagnostic_output,
                exit_code,
                ..
            } => {
                assert_eq!(kind, FailureKind::Rendering);
                assert_eq!(diagnostic_output, "bad tree");
                assert_eq!(exit_code, Some(3));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_clean_exit_without_file_is_no_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = RendererConfig {
            program: "true".to_string(),
            leading_args: vec![],
            ..RendererConfig::default()
        };
        let outcome = RenderInvoker::new(&config)
            .invoke(&[], dir.path(), &dir.path().join("tree.png"), OutputFormat::Png)
            .await;

        match outcome {
            RenderOutcome::Failure { kind, reason, .. } => {
                assert_eq!(kind, FailureKind::NoOutput);
                assert_eq!(reason, "renderer reported success but produced no output");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_renderer_times_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = RendererConfig {
            program: "sleep".to_string(),
            leading_args: vec!["30".to_string()],
            ..RendererConfig::default()
        };
        let invoker = RenderInvoker::new(&config).with_timeout(Duration::from_millis(200));
        let start = Instant::now();
        let outcome = invoker
            .invoke(&[], dir.path(), &dir.path().join("tree.png"), OutputFormat::Png)
            .await;

        assert!(start.elapsed() < Duration::from_secs(10));
        match outcome {
            RenderOutcome::Failure { kind, .. } => assert_eq!(kind, FailureKind::TimedOut),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_background_process_holding_pipes_does_not_extend_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = RendererConfig {
            program: "sh".to_string(),
            leading_args: vec![
                "-c".to_string(),
                "echo started; sleep 5 & printf PNG > \"$1\"".to_string(),
                "stub".to_string(),
            ],
            ..RendererConfig::default()
        };
        let invoker = RenderInvoker::new(&config).with_timeout(Duration::from_secs(1));
        let start = Instant::now();
        let outcome = invoker
            .invoke(
                &["tree.png".to_string()],
                dir.path(),
                &dir.path().join("tree.png"),
                OutputFormat::Png,
            )
            .await;

        assert!(start.elapsed() < Duration::from_secs(3), "took {:?}", start.elapsed());
        assert!(matches!(outcome, RenderOutcome::Success { .. }), "{outcome:?}");
    }

    #[test]
    fn test_relative_script_made_absolute() {
        let here = tempfile::Builder::new()
            .prefix("renderer-")
            .tempdir_in(".")
            .expect("tempdir in cwd");
        let name = here.path().file_name().expect("name").to_string_lossy().into_owned();
        let script = format!("{name}/render.R");
        std::fs::write(&script, "# stub").expect("write script");

        let config = RendererConfig {
            program: "Rscript".to_string(),
            leading_args: vec![
                "--vanilla".to_string(),
                script.clone(),
                "not-a-file.R".to_string(),
            ],
            ..RendererConfig::default()
        };
        let invoker = RenderInvoker::new(&config);

        assert_eq!(invoker.program(), "Rscript");
        assert_eq!(invoker.leading_args()[0], "--vanilla");
        let resolved = Path::new(&invoker.leading_args()[1]);
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with(&script));
        assert_eq!(invoker.leading_args()[2], "not-a-file.R");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_workdir_and_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = RendererConfig {
            program: "sh".to_string(),
            leading_args: vec!["-c".to_string(), "printf PNG > \"$1\"".to_string(), "stub".to_string()],
            ..RendererConfig::default()
        };
        let outcome = RenderInvoker::new(&config)
            .invoke(
                &["tree.png".to_string()],
                dir.path(),
                &dir.path().join("tree.png"),
                OutputFormat::Png,
            )
            .await;

        match outcome {
            RenderOutcome::Success {
                artifact_path,
                format,
            } => {
                assert_eq!(artifact_path, dir.path().join("tree.png"));
                assert_eq!(format, OutputFormat::Png);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}

//! Per-run session directories.
//!
//! Every pipeline run gets its own directory under the workspace root,
//! named after a freshly generated [`SessionId`]. Identifiers handed out by
//! this process are remembered so none is ever issued twice, and the
//! directory itself is created non-recursively so an existing one is never
//! adopted.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use dashmap::DashSet;
use phyloplot_core::types::SessionId;
use tracing::{debug, info, warn};

use crate::error::RenderError;

/// Attempts at finding an unused identifier before giving up.
const MAX_CREATE_ATTEMPTS: usize = 8;

/// An isolated storage scope for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    dir: PathBuf,
}

impl Session {
    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Session directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Removes a session directory when dropped unless disarmed.
///
/// Held by a pipeline run for as long as its session exists, so a run whose
/// future is dropped (request timeout, client gone) still cleans up.
#[derive(Debug)]
#[must_use = "dropping the guard removes the session directory"]
pub struct SessionGuard {
    id: SessionId,
    dir: Option<PathBuf>,
}

impl SessionGuard {
    /// The session was cleaned up the normal way.
    pub fn disarm(mut self) {
        self.dir = None;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => warn!(session_id = %self.id, "Run cancelled, session removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                session_id = %self.id,
                dir = %dir.display(),
                error = %e,
                "Failed to remove session of cancelled run"
            ),
        }
    }
}

/// Allocates, scopes, and destroys session directories.
#[derive(Debug, Clone)]
pub struct SessionWorkspace {
    /// Root directory holding all session directories.
    root: PathBuf,
    /// Every identifier this process has issued.
    issued: Arc<DashSet<SessionId>>,
}

impl SessionWorkspace {
    /// Create a workspace rooted at `root`, creating the root if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            RenderError::storage(
                format!("cannot create workspace root '{}'", root.display()),
                e,
            )
        })?;

        Ok(Self {
            root,
            issued: Arc::new(DashSet::new()),
        })
    }

    /// Workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a new session and create its directory.
    pub async fn create(&self) -> Result<Session, RenderError> {
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let id = SessionId::new();
            if !self.issued.insert(id) {
                continue;
            }

            let dir = self.root.join(id.simple());
            match tokio::fs::create_dir(&dir).await {
                Ok(()) => {
                    debug!(session_id = %id, dir = %dir.display(), "Session created");
                    return Ok(Session { id, dir });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    warn!(session_id = %id, "Session directory already exists, drawing a new id");
                }
                Err(e) => {
                    return Err(RenderError::storage(
                        format!("cannot create session directory '{}'", dir.display()),
                        e,
                    ));
                }
            }
        }

        Err(RenderError::storage(
            "could not allocate an unused session directory",
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{MAX_CREATE_ATTEMPTS} attempts collided"),
            ),
        ))
    }

    /// Guard that removes `session` if the run is abandoned mid-flight.
    pub fn guard(&self, session: &Session) -> SessionGuard {
        SessionGuard {
            id: session.id,
            dir: Some(session.dir.clone()),
        }
    }

    /// Path of `name` inside the session directory.
    ///
    /// `name` must be a single plain file name; anything that could resolve
    /// outside the session directory is rejected.
    pub fn path(&self, session: &Session, name: &str) -> Result<PathBuf, RenderError> {
        let reject = || RenderError::validation(format!("invalid session file name '{name}'"));

        if name.is_empty() || name.contains(['/', '\\', '\0']) {
            return Err(reject());
        }

        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(session.dir.join(name)),
            _ => Err(reject()),
        }
    }

    /// Write `data` to `name` inside the session directory.
    pub async fn stage(
        &self,
        session: &Session,
        name: &str,
        data: &[u8],
    ) -> Result<PathBuf, RenderError> {
        let path = self.path(session, name)?;
        tokio::fs::write(&path, data).await.map_err(|e| {
            RenderError::storage(format!("cannot write '{}'", path.display()), e)
        })?;
        debug!(session_id = %session.id, file = name, bytes = data.len(), "Staged input");
        Ok(path)
    }

    /// Remove the session directory. Idempotent; failures are logged only.
    pub async fn destroy(&self, session: &Session) {
        match tokio::fs::remove_dir_all(&session.dir).await {
            Ok(()) => debug!(session_id = %session.id, "Session destroyed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                session_id = %session.id,
                dir = %session.dir.display(),
                error = %e,
                "Failed to clean up session directory"
            ),
        }
    }

    /// Remove session directories last modified more than `max_age` ago.
    ///
    /// These are leftovers from runs that never reached cleanup (crash,
    /// kill). Returns how many directories were removed.
    pub async fn sweep_stale(&self, max_age: Duration) -> usize {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "Cannot read workspace root");
                return 0;
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !is_session_dir_name(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(_) => continue,
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age < max_age {
                continue;
            }

            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(dir = %path.display(), error = %e, "Failed to sweep stale session"),
            }
        }

        if removed > 0 {
            info!(removed, root = %self.root.display(), "Swept stale sessions");
        }
        removed
    }
}

/// Session directories are named by a 32-digit hex identifier.
fn is_session_dir_name(name: &str) -> bool {
    name.len() == 32 && name.chars().all(|c| c.is_ascii_hexdigit())
}

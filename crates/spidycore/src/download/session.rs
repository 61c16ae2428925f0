//! Per-request workspaces
//!
//! Every inbound request gets its own directory `<root>/<id>` where all
//! downloaded and transcoded files live. The directory is removed when the
//! request ends: explicitly through [`Session::close`], or by `Drop` if the
//! request errored out, panicked or was cancelled before reaching it.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::error::{AppError, AppResult};

/// How many fresh ids to draw before giving up on a collision
const MAX_ID_ATTEMPTS: usize = 8;

const SESSION_ID_LEN: usize = 8;

/// Short random opaque session identifier (8 hex chars)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn random() -> Self {
        let mut hex = uuid::Uuid::new_v4().simple().to_string();
        hex.truncate(SESSION_ID_LEN);
        Self(hex)
    }

    /// Whether `name` has the shape of a generated id (8 lowercase hex chars)
    pub fn is_well_formed(name: &str) -> bool {
        name.len() == SESSION_ID_LEN && name.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Allocates workspaces under a common root directory
#[derive(Debug, Clone)]
pub struct SessionManager {
    root: PathBuf,
}

impl SessionManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates a fresh, empty workspace keyed by a random id.
    pub async fn open_session(&self, chat_id: i64) -> AppResult<Session> {
        let mut last_err = None;
        for _ in 0..MAX_ID_ATTEMPTS {
            match self.open_session_with_id(SessionId::random(), chat_id).await {
                Ok(session) => return Ok(session),
                Err(AppError::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => {
                    log::warn!("Session id collision under {}, drawing a new id", self.root.display());
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::Io(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AlreadyExists, "no free session id")
        })))
    }

    /// Creates the workspace for a specific id; fails with `AlreadyExists` if it is taken.
    pub async fn open_session_with_id(&self, id: SessionId, chat_id: i64) -> AppResult<Session> {
        fs_err::tokio::create_dir_all(&self.root).await?;

        let workspace = self.root.join(id.as_str());
        // create_dir (not _all) so an existing workspace is reported as a collision
        fs_err::tokio::create_dir(&workspace).await?;
        restrict_to_owner(&workspace, 0o700).await?;

        log::debug!("[{}] Opened workspace {}", id, workspace.display());
        Ok(Session {
            id,
            chat_id,
            workspace,
            closed: false,
        })
    }

    /// Removes leftover workspaces from a previous run (crash, kill -9).
    ///
    /// Only directories named like a session id are touched. Call once at bot
    /// startup, before any session is open.
    pub async fn purge_stale(&self) -> AppResult<usize> {
        if !tokio::fs::try_exists(&self.root).await? {
            return Ok(0);
        }

        let mut purged = 0;
        let mut entries = fs_err::tokio::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_workspace = entry.file_name().to_str().is_some_and(SessionId::is_well_formed);
            if is_workspace && entry.file_type().await?.is_dir() {
                match fs_err::tokio::remove_dir_all(&path).await {
                    Ok(()) => purged += 1,
                    Err(e) => log::warn!("Failed to purge stale workspace {}: {}", path.display(), e),
                }
            }
        }

        if purged > 0 {
            log::info!("Purged {} stale workspace(s) under {}", purged, self.root.display());
        }
        Ok(purged)
    }
}

/// One in-flight request and its isolated workspace
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    chat_id: i64,
    workspace: PathBuf,
    closed: bool,
}

impl Session {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Recursively removes the workspace. Consumes the session, so it runs once.
    pub async fn close(mut self) {
        self.closed = true;
        match fs_err::tokio::remove_dir_all(&self.workspace).await {
            Ok(()) => log::info!("[{}] Cleaned up temporary directory: {}", self.id, self.workspace.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::error!("[{}] Failed to clean up {}: {}", self.id, self.workspace.display(), e),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Reached on early return, panic or cancellation of the request future.
        match std::fs::remove_dir_all(&self.workspace) {
            Ok(()) => log::warn!(
                "[{}] Workspace {} removed on drop (request did not finish normally)",
                self.id,
                self.workspace.display()
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::error!("[{}] Failed to remove {} on drop: {}", self.id, self.workspace.display(), e),
        }
    }
}

#[cfg(unix)]
pub(crate) async fn restrict_to_owner(path: &Path, mode: u32) -> AppResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs_err::tokio::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) async fn restrict_to_owner(_path: &Path, _mode: u32) -> AppResult<()> {
    Ok(())
}

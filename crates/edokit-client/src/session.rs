//! Session-scoped credential storage.
//!
//! Standalone success paths save the resolved credentials to a JSON file
//! so the next run of the same tool skips straight to them. Best-effort
//! on both ends: unreadable files count as absent, failed writes are
//! logged and swallowed.

use std::path::{Path, PathBuf};

use crate::readiness::Credentials;

const SESSION_FILE: &str = "session.json";

/// File-backed session store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The default location under the user cache directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join("edokit").join(SESSION_FILE))
    }

    /// The session file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read saved credentials, if any.
    pub fn load(&self) -> Option<Credentials> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unparseable session file");
                None
            }
        }
    }

    /// Save credentials, best-effort.
    pub fn save(&self, credentials: &Credentials) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }

        match serde_json::to_string_pretty(credentials) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    tracing::warn!(path = %self.path.display(), error = %e, "Could not write session file");
                } else {
                    tracing::debug!(path = %self.path.display(), "Session saved");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not serialize session credentials");
            }
        }
    }

    /// Remove the session file.
    pub fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Could not remove session file");
            }
        }
    }
}

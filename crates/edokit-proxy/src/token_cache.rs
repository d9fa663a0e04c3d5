//! Cached bearer token persistence.
//!
//! The proxy holds at most one token at a time. It lives in memory and in
//! a JSON file next to the server, so a restart inside the token's
//! lifetime does not force a fresh sign-in.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Seconds of remaining lifetime a record must have to count as valid.
pub const VALID_MARGIN_SECS: u64 = 60;

/// Assumed lifetime when the token endpoint omits `expires_in`.
pub const DEFAULT_LIFETIME_SECS: u64 = 3600;

/// Current time as epoch seconds.
pub(crate) fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// The persisted token record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The bearer token itself.
    pub access_token: String,
    /// Absolute expiry, epoch seconds.
    pub expires_on: u64,
}

impl TokenRecord {
    /// Build a record expiring `lifetime_secs` from now.
    ///
    /// The lifetime comes straight from the token endpoint's reply, so an
    /// absurd value saturates rather than wrapping past the epoch.
    pub fn expiring_in(access_token: impl Into<String>, lifetime_secs: u64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_on: epoch_secs().saturating_add(lifetime_secs),
        }
    }

    /// A record is valid only while more than [`VALID_MARGIN_SECS`] of
    /// lifetime remain. Exactly the margin counts as expired.
    pub fn is_valid(&self) -> bool {
        self.expires_on > epoch_secs() + VALID_MARGIN_SECS
    }

    /// Remaining lifetime for display, e.g. "1h 59m".
    pub fn expires_in_display(&self) -> String {
        let now = epoch_secs();
        if self.expires_on <= now {
            return "expired".to_string();
        }
        let secs = self.expires_on - now;
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        format!("{}h {}m", hours, minutes)
    }
}

/// File-backed cache for the single token record.
#[derive(Debug)]
pub struct TokenCache {
    path: PathBuf,
    current: RwLock<Option<TokenRecord>>,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(None),
        }
    }

    /// The cache file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record from disk into memory, returning it only if still
    /// valid. Missing or unreadable files mean "no cache".
    pub async fn load(&self) -> Option<TokenRecord> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Could not read token cache");
                return None;
            }
        };

        let record: TokenRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unparseable token cache");
                return None;
            }
        };

        let mut current = self.current.write().await;
        *current = Some(record.clone());

        if record.is_valid() {
            tracing::info!(expires = %record.expires_in_display(), "Loaded cached token");
            Some(record)
        } else {
            None
        }
    }

    /// Store the record in memory and, best-effort, on disk. A failed
    /// write only costs a fresh sign-in on the next start, so it is
    /// logged and swallowed.
    pub async fn persist(&self, record: TokenRecord) {
        {
            let mut current = self.current.write().await;
            *current = Some(record.clone());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }

        match serde_json::to_string_pretty(&record) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    tracing::warn!(path = %self.path.display(), error = %e, "Could not write token cache");
                } else {
                    tracing::info!(path = %self.path.display(), "Token cached");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not serialize token record");
            }
        }
    }

    /// The in-memory record, if it is currently valid.
    pub async fn current_valid(&self) -> Option<TokenRecord> {
        let current = self.current.read().await;
        current.as_ref().filter(|r| r.is_valid()).cloned()
    }

    /// Drop the in-memory record and remove the cache file.
    pub async fn clear(&self) {
        {
            let mut current = self.current.write().await;
            *current = None;
        }

        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Could not remove token cache");
            }
        }
    }
}

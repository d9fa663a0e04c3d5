//! In-flight PKCE authorization attempts, keyed by state.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::oauth::{self, PkceChallenge};

/// Entries older than this are dropped when a new flow begins.
pub const SESSION_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug)]
struct PendingAuth {
    verifier: String,
    started: Instant,
}

/// One flow start: the state to correlate the callback on and the
/// challenge to embed in the authorization URL.
#[derive(Debug, Clone)]
pub struct AuthStart {
    pub state: String,
    pub challenge: String,
}

/// Ephemeral state-to-verifier map for in-flight authorization attempts.
///
/// Abandoned attempts (the user closed the sign-in window) would pile up
/// otherwise, so stale entries are swept whenever a new flow begins.
#[derive(Debug, Default)]
pub struct PkceSessionStore {
    entries: Mutex<HashMap<String, PendingAuth>>,
}

impl PkceSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a flow: generate a state and verifier/challenge pair and
    /// remember the verifier under the state.
    pub fn begin(&self) -> AuthStart {
        let pkce = PkceChallenge::generate();
        let state = oauth::generate_state();

        let mut entries = self.entries.lock();
        entries.retain(|_, pending| pending.started.elapsed() < SESSION_TTL);
        entries.insert(
            state.clone(),
            PendingAuth {
                verifier: pkce.verifier,
                started: Instant::now(),
            },
        );

        AuthStart {
            state,
            challenge: pkce.challenge,
        }
    }

    /// Consume the verifier for a state.
    ///
    /// Returns `None` for unknown or already-used states; callers treat
    /// that as a hard failure, never a retry.
    pub fn complete(&self, state: &str) -> Option<String> {
        self.entries.lock().remove(state).map(|p| p.verifier)
    }

    /// Number of in-flight attempts.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    #[cfg(test)]
    fn backdate(&self, state: &str, age: Duration) {
        if let Some(pending) = self.entries.lock().get_mut(state) {
            pending.started = Instant::now() - age;
        }
    }
}

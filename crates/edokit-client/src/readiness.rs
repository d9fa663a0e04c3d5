//! Single-resolution readiness signal carrying the resolved credentials.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{Error, Result};

/// The resolved token and the proxy base address to spend it against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credentials {
    pub token: String,
    #[serde(rename = "proxyBaseUrl")]
    pub proxy_base_url: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, proxy_base_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            proxy_base_url: proxy_base_url.into(),
        }
    }
}

/// Completion signal that exactly one success path may fire.
///
/// Every auth path races toward [`resolve`](Self::resolve); the first
/// caller wins and later calls are no-ops. Data calls park in
/// [`wait`](Self::wait) until then. Once fired the signal never unfires.
#[derive(Debug, Clone)]
pub struct Readiness {
    tx: Arc<watch::Sender<Option<Credentials>>>,
}

impl Readiness {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Try to resolve. Returns whether this call won the race.
    pub fn resolve(&self, credentials: Credentials) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(credentials);
                true
            } else {
                false
            }
        })
    }

    /// The resolved credentials, if any, without waiting.
    pub fn peek(&self) -> Option<Credentials> {
        self.tx.borrow().clone()
    }

    /// Whether the signal has fired.
    pub fn is_resolved(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Suspend until the signal fires, then return the credentials.
    pub async fn wait(&self) -> Result<Credentials> {
        let mut rx = self.tx.subscribe();
        let guard = rx
            .wait_for(|current| current.is_some())
            .await
            .map_err(|_| Error::Auth("readiness signal dropped".to_string()))?;

        match guard.as_ref() {
            Some(credentials) => Ok(credentials.clone()),
            None => Err(Error::Auth("readiness signal empty".to_string())),
        }
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

//! The EDO data client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::{AuthStrategy, InteractiveAuth, POLL_INTERVAL, run_handshake};
use crate::error::{Error, Result};
use crate::message::HostChannel;
use crate::params::Query;
use crate::readiness::{Credentials, Readiness};
use crate::session::SessionStore;

/// Default proxy base for standalone mode.
pub const DEFAULT_PROXY_BASE: &str = "http://localhost:3001";

/// Prefix the proxy forwards to the upstream API.
const DATA_PREFIX: &str = "api/edo";

/// Error bodies are clipped to this many characters in messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Outcome of [`EdoClient::authenticate`].
#[derive(Debug)]
pub enum AuthOutcome {
    /// Credentials resolved without user involvement.
    Ready(Credentials),
    /// User action required; drive the handle to completion.
    Interactive(InteractiveAuth),
}

/// EDO data client.
///
/// Cheap to clone; clones share the HTTP pool, the readiness signal, and
/// the session store.
///
/// ```no_run
/// use edokit_client::{AuthOutcome, EdoClient};
///
/// # async fn example() -> edokit_client::Result<()> {
/// let client = EdoClient::builder().build()?;
///
/// if let AuthOutcome::Interactive(flow) = client.authenticate().await? {
///     println!("open {}", flow.authorize_url());
///     flow.poll_until_ready().await?;
/// }
///
/// let points: serde_json::Value = client.get("point/building/7/point").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EdoClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    readiness: Readiness,
    session: SessionStore,
    proxy_base_url: String,
    provisioned: Option<Credentials>,
    embedded: bool,
    host: Mutex<Option<HostChannel>>,
    poll_interval: Duration,
}

impl EdoClient {
    /// Create a builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The readiness signal data calls wait on.
    pub fn readiness(&self) -> &Readiness {
        &self.inner.readiness
    }

    /// The proxy base configured for standalone mode.
    pub fn proxy_base_url(&self) -> &str {
        &self.inner.proxy_base_url
    }

    /// Resolve credentials by the mode fixed at construction.
    ///
    /// Embedded: announce readiness on the host channel and wait for the
    /// token message. Standalone: provisioned credentials, then the
    /// session file, then one status probe against the proxy; if all of
    /// those come up empty the interactive flow is handed back instead of
    /// run, since only the caller knows how to reach the user.
    ///
    /// Safe to call again after resolution; it short-circuits. An
    /// embedded client whose handshake failed keeps returning
    /// [`Error::ChannelClosed`]; it never switches to the standalone
    /// chain.
    pub async fn authenticate(&self) -> Result<AuthOutcome> {
        if let Some(credentials) = self.inner.readiness.peek() {
            return Ok(AuthOutcome::Ready(credentials));
        }

        let host = self.inner.host.lock().take();

        // The mode was fixed at construction; a missing channel here
        // means a previous handshake consumed it and failed.
        if self.inner.embedded && host.is_none() {
            return Err(Error::ChannelClosed);
        }

        let strategy = AuthStrategy::select(
            &self.inner.http,
            &self.inner.readiness,
            &self.inner.session,
            &self.inner.proxy_base_url,
            self.inner.poll_interval,
            host,
            self.inner.provisioned.clone(),
        )
        .await;

        match strategy {
            AuthStrategy::Embedded(channel) => {
                let credentials = run_handshake(channel).await?;
                // Embedded credentials stay out of the session store; the
                // host re-sends them on every load.
                self.inner.readiness.resolve(credentials.clone());
                Ok(AuthOutcome::Ready(credentials))
            }
            AuthStrategy::Provisioned(credentials)
            | AuthStrategy::SessionResume(credentials)
            | AuthStrategy::CachedProxy(credentials) => {
                Ok(AuthOutcome::Ready(self.adopt(credentials)))
            }
            AuthStrategy::Interactive(interactive) => Ok(AuthOutcome::Interactive(interactive)),
        }
    }

    /// Resolve the readiness signal and persist the session on a win.
    fn adopt(&self, credentials: Credentials) -> Credentials {
        if self.inner.readiness.resolve(credentials.clone()) {
            self.inner.session.save(&credentials);
            credentials
        } else {
            self.inner.readiness.peek().unwrap_or(credentials)
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Data calls
    // ─────────────────────────────────────────────────────────────────────

    /// Authenticated GET without query parameters.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_with_query(path, &Query::new()).await
    }

    /// Authenticated GET with query parameters.
    ///
    /// Suspends until the readiness signal fires, then sends through the
    /// resolved proxy base with the resolved bearer token. Non-2xx
    /// replies become [`Error::Api`] carrying the status, the path, and a
    /// truncated body.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
    ) -> Result<T> {
        let credentials = self.inner.readiness.wait().await?;

        let mut url = data_url(&credentials.proxy_base_url, path)?;
        query.apply(&mut url);

        tracing::debug!(url = %url, "GET");

        let response = self
            .inner
            .http
            .get(url)
            .bearer_auth(&credentials.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                path: path.to_string(),
                body: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        Ok(response.json().await?)
    }
}

/// Join the proxy base, the data prefix, and a relative path.
fn data_url(proxy_base_url: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(proxy_base_url)?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    let url = base.join(&format!("{}/{}", DATA_PREFIX, path.trim_start_matches('/')))?;
    Ok(url)
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(limit).collect();
        format!("{}…", clipped)
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────

/// Builder for an [`EdoClient`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    proxy_base_url: Option<String>,
    host: Option<HostChannel>,
    provisioned: Option<Credentials>,
    session_path: Option<PathBuf>,
    poll_interval: Option<Duration>,
    user_agent: Option<String>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Proxy base for standalone mode (default [`DEFAULT_PROXY_BASE`]).
    pub fn proxy_base_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_base_url = Some(url.into());
        self
    }

    /// Attach a host channel, fixing the client in embedded mode. Takes
    /// precedence over every standalone source.
    pub fn host_channel(mut self, channel: HostChannel) -> Self {
        self.host = Some(channel);
        self
    }

    /// Pre-provisioned credentials, adopted without any network call.
    pub fn provisioned(mut self, credentials: Credentials) -> Self {
        self.provisioned = Some(credentials);
        self
    }

    /// Session file location (default: the user cache directory).
    pub fn session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = Some(path.into());
        self
    }

    /// Override the interactive poll cadence.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<EdoClient> {
        let proxy_base_url = self
            .proxy_base_url
            .unwrap_or_else(|| DEFAULT_PROXY_BASE.to_string());

        // Reject junk early rather than on the first data call.
        Url::parse(&proxy_base_url)?;

        let session_path = match self.session_path {
            Some(path) => path,
            None => SessionStore::default_path().ok_or_else(|| {
                Error::Config("no cache directory for the session store".to_string())
            })?,
        };

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("edokit-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder().user_agent(user_agent).build()?;
        let embedded = self.host.is_some();

        Ok(EdoClient {
            inner: Arc::new(ClientInner {
                http,
                readiness: Readiness::new(),
                session: SessionStore::new(session_path),
                proxy_base_url,
                provisioned: self.provisioned,
                embedded,
                host: Mutex::new(self.host),
                poll_interval: self.poll_interval.unwrap_or(POLL_INTERVAL),
            }),
        })
    }
}

//! Authentication strategies and the interactive flow.
//!
//! Mode is fixed when the client is built: a host channel means embedded,
//! otherwise the standalone chain runs in priority order. Whichever path
//! succeeds resolves the shared [`Readiness`] signal exactly once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::error::{Error, Result};
use crate::message::{HostChannel, HostMessage};
use crate::readiness::{Credentials, Readiness};
use crate::session::SessionStore;

/// Cadence of the status poll during the interactive flow.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// The proxy's status endpoint.
pub(crate) const STATUS_PATH: &str = "/api/dev-auth/status";

/// The proxy route that starts a PKCE flow.
pub(crate) const START_PATH: &str = "/oauth/start";

#[derive(Debug, serde::Deserialize)]
struct StatusReply {
    ready: bool,
    #[serde(default)]
    token: Option<String>,
}

/// How the client will come by its credentials, decided once per client.
#[derive(Debug)]
pub enum AuthStrategy {
    /// A host pushes the token over the message channel.
    Embedded(HostChannel),
    /// Credentials were provided before startup.
    Provisioned(Credentials),
    /// Credentials recovered from the session store.
    SessionResume(Credentials),
    /// The proxy already held a valid cached token.
    CachedProxy(Credentials),
    /// User action required.
    Interactive(InteractiveAuth),
}

impl AuthStrategy {
    /// Pick the strategy. A host channel short-circuits everything; the
    /// standalone chain is provisioned credentials, then the session
    /// file, then one status probe, then interactive.
    pub(crate) async fn select(
        http: &reqwest::Client,
        readiness: &Readiness,
        session: &SessionStore,
        proxy_base_url: &str,
        poll_interval: Duration,
        host: Option<HostChannel>,
        provisioned: Option<Credentials>,
    ) -> AuthStrategy {
        if let Some(channel) = host {
            return AuthStrategy::Embedded(channel);
        }

        if let Some(credentials) = provisioned {
            tracing::debug!("Using provisioned credentials");
            return AuthStrategy::Provisioned(credentials);
        }

        if let Some(credentials) = session.load() {
            tracing::debug!("Resuming saved session credentials");
            return AuthStrategy::SessionResume(credentials);
        }

        match probe_status(http, proxy_base_url).await {
            Ok(Some(token)) => {
                tracing::debug!("Adopting the proxy's cached token");
                return AuthStrategy::CachedProxy(Credentials::new(token, proxy_base_url));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Status probe failed, continuing to interactive");
            }
        }

        AuthStrategy::Interactive(InteractiveAuth::new(
            http.clone(),
            readiness.clone(),
            session.clone(),
            proxy_base_url.to_string(),
            poll_interval,
        ))
    }
}

/// One status query. `Ok(Some(token))` when the proxy reports ready.
pub(crate) async fn probe_status(
    http: &reqwest::Client,
    proxy_base_url: &str,
) -> Result<Option<String>> {
    let url = format!("{}{}", proxy_base_url.trim_end_matches('/'), STATUS_PATH);
    let reply: StatusReply = http.get(&url).send().await?.json().await?;

    if reply.ready { Ok(reply.token) } else { Ok(None) }
}

/// Drive the embedded handshake: announce readiness, then wait for a
/// token message, ignoring everything else on the channel.
///
/// There is no timeout. A host that never answers leaves the dashboard
/// parked, exactly like a dashboard waiting on a host that never loads
/// it; a closed channel is the only failure.
pub(crate) async fn run_handshake(mut channel: HostChannel) -> Result<Credentials> {
    let ready = serde_json::to_value(HostMessage::Ready)?;
    channel
        .outgoing
        .send(ready)
        .await
        .map_err(|_| Error::ChannelClosed)?;

    tracing::debug!("Announced readiness to the host");

    loop {
        let value = channel.incoming.recv().await.ok_or(Error::ChannelClosed)?;
        match HostMessage::parse(&value) {
            Some(HostMessage::Token { token, proxy_base_url }) => {
                tracing::debug!("Token received from the host");
                return Ok(Credentials::new(token, proxy_base_url));
            }
            _ => {
                tracing::trace!("Ignoring foreign host message");
            }
        }
    }
}

/// Handle for the user-driven flow: open the authorize URL and poll the
/// proxy, or paste a token manually. Whichever finishes first resolves
/// the shared readiness signal; the other becomes a no-op.
#[derive(Debug, Clone)]
pub struct InteractiveAuth {
    http: reqwest::Client,
    readiness: Readiness,
    session: SessionStore,
    proxy_base_url: String,
    poll_interval: Duration,
    wake: Arc<Notify>,
}

impl InteractiveAuth {
    pub(crate) fn new(
        http: reqwest::Client,
        readiness: Readiness,
        session: SessionStore,
        proxy_base_url: String,
        poll_interval: Duration,
    ) -> Self {
        Self {
            http,
            readiness,
            session,
            proxy_base_url,
            poll_interval,
            wake: Arc::new(Notify::new()),
        }
    }

    /// URL to open in a browser to start the PKCE flow on the proxy.
    pub fn authorize_url(&self) -> String {
        format!("{}{}", self.proxy_base_url.trim_end_matches('/'), START_PATH)
    }

    /// Short-circuit the next poll delay into an immediate check. Called
    /// when an out-of-band signal suggests the flow just finished.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    /// Poll the status endpoint until the proxy reports ready.
    ///
    /// A check that fails outright (proxy unreachable, non-JSON reply)
    /// ends the loop with an error; a not-ready reply just waits out the
    /// next interval. There is no attempt cutoff, so wrap this in
    /// `tokio::time::timeout` for a bounded wait.
    pub async fn poll_until_ready(&self) -> Result<Credentials> {
        loop {
            if let Some(credentials) = self.readiness.peek() {
                return Ok(credentials);
            }

            match probe_status(&self.http, &self.proxy_base_url).await {
                Ok(Some(token)) => {
                    let credentials = Credentials::new(token, self.proxy_base_url.clone());
                    return Ok(self.finish(credentials));
                }
                Ok(None) => {
                    tracing::trace!("Proxy not ready yet");
                }
                Err(e) => {
                    return Err(Error::Auth(format!("status polling stopped: {}", e)));
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = self.wake.notified() => {
                    tracing::debug!("Woken for an immediate status check");
                }
            }
        }
    }

    /// Adopt a manually pasted token.
    ///
    /// Strips an optional case-insensitive `Bearer ` prefix and
    /// surrounding whitespace; an empty remainder is rejected and leaves
    /// the signal unresolved.
    pub fn submit_token(&self, raw: &str) -> Result<Credentials> {
        let input = raw.trim_start();
        let token = match input.get(..7) {
            Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => &input[7..],
            _ => input,
        };
        let token = token.trim();

        if token.is_empty() {
            return Err(Error::Auth("empty token".to_string()));
        }

        Ok(self.finish(Credentials::new(token, self.proxy_base_url.clone())))
    }

    /// Resolve the readiness signal (first writer wins) and persist the
    /// session on a win.
    fn finish(&self, credentials: Credentials) -> Credentials {
        if self.readiness.resolve(credentials.clone()) {
            self.session.save(&credentials);
            credentials
        } else {
            self.readiness.peek().unwrap_or(credentials)
        }
    }
}

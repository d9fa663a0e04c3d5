//! Proxy configuration.
//!
//! The OAuth client registration is compiled in; runtime knobs (port,
//! upstream base, site directory) come from flags or `.env.local`.

use std::net::SocketAddr;
use std::path::PathBuf;

/// OAuth client id registered for local dashboard development.
pub const EDO_CLIENT_ID: &str = "8f29c3f4-5a1e-4b0c-9d6a-7e2b41c08d53";

/// Directory (tenant) the EDO portal signs users in through.
pub const EDO_TENANT_ID: &str = "3b7a2f90-14d6-4c21-a0be-68d92f5c1e47";

/// Scopes requested during authorization.
pub const EDO_SCOPES: &str = "api://edo-energy/Data.Read openid profile";

/// Default listen port for the development proxy.
pub const DEFAULT_PORT: u16 = 3001;

/// Default upstream EDO API base URL.
pub const DEFAULT_UPSTREAM: &str = "https://api.edoenergy.com";

/// Environment file consulted by [`ProxyConfig::from_env`].
pub const ENV_FILE: &str = ".env.local";

/// Token cache file written next to the server.
pub const CACHE_FILE: &str = ".edo-token-cache.json";

/// OAuth endpoints and client registration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID.
    pub client_id: String,
    /// Authorization endpoint URL.
    pub authorize_url: String,
    /// Token exchange endpoint URL.
    pub token_url: String,
    /// Redirect URI registered for the client.
    pub redirect_uri: String,
    /// Scopes to request.
    pub scope: String,
}

impl OAuthConfig {
    /// Endpoints for the EDO portal tenant, with the callback landing on
    /// the local proxy root.
    pub fn edo(port: u16) -> Self {
        Self {
            client_id: EDO_CLIENT_ID.to_string(),
            authorize_url: format!(
                "https://login.microsoftonline.com/{}/oauth2/v2.0/authorize",
                EDO_TENANT_ID
            ),
            token_url: format!(
                "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
                EDO_TENANT_ID
            ),
            redirect_uri: format!("http://localhost:{}/", port),
            scope: EDO_SCOPES.to_string(),
        }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self::edo(DEFAULT_PORT)
    }
}

/// Configuration for the proxy server.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// OAuth endpoints and client registration.
    pub oauth: OAuthConfig,
    /// Upstream EDO API base URL.
    pub upstream_base_url: String,
    /// Directory served by the static fallback.
    pub site_dir: PathBuf,
    /// Token cache file location.
    pub cache_path: PathBuf,
    /// Attach a permissive CORS layer.
    pub enable_cors: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            oauth: OAuthConfig::default(),
            upstream_base_url: DEFAULT_UPSTREAM.to_string(),
            site_dir: PathBuf::from("site"),
            cache_path: PathBuf::from(CACHE_FILE),
            enable_cors: true,
        }
    }
}

impl ProxyConfig {
    /// Build a config from `.env.local` and the process environment.
    ///
    /// `PORT` overrides the listen port and `EDO_API_BASE_URL` the
    /// upstream base. Unparseable values fall back to the defaults with a
    /// warning.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(ENV_FILE);

        let mut config = Self::default();

        if let Ok(raw) = std::env::var("PORT") {
            match raw.parse::<u16>() {
                Ok(port) => config = config.with_port(port),
                Err(_) => tracing::warn!(value = %raw, "Ignoring unparseable PORT"),
            }
        }

        if let Ok(base) = std::env::var("EDO_API_BASE_URL") {
            if !base.is_empty() {
                config.upstream_base_url = base;
            }
        }

        config
    }

    /// Set the listen port, keeping the OAuth redirect URI in step.
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self.oauth.redirect_uri = format!("http://localhost:{}/", port);
        self
    }

    /// Set the full bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the upstream EDO API base URL.
    pub fn with_upstream_base_url(mut self, base: impl Into<String>) -> Self {
        self.upstream_base_url = base.into();
        self
    }

    /// Set the static site directory.
    pub fn with_site_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.site_dir = dir.into();
        self
    }

    /// Set the token cache file location.
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    /// Replace the OAuth endpoints.
    pub fn with_oauth(mut self, oauth: OAuthConfig) -> Self {
        self.oauth = oauth;
        self
    }

    /// Enable or disable the CORS layer.
    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }
}

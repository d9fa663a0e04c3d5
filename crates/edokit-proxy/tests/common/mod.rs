//! Common test utilities for the proxy integration tests.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use edokit_proxy::{OAuthConfig, ProxyConfig, ProxyServer};

/// A proxy wired to throwaway directories and optional mock endpoints.
///
/// Requests run through the router via `oneshot`; no socket is bound.
pub struct Harness {
    /// The server under test.
    pub server: ProxyServer,
    /// Temporary root holding the site directory and the token cache file.
    pub dir: tempfile::TempDir,
}

impl Harness {
    /// Build a proxy whose token endpoint and upstream point at the given
    /// mock servers. `None` leaves the compiled-in default in place.
    pub fn new(token_url: Option<&str>, upstream: Option<&str>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join("site");
        std::fs::create_dir_all(&site).unwrap();
        std::fs::write(site.join("index.html"), "<h1>harness</h1>").unwrap();

        let mut oauth = OAuthConfig::edo(3001);
        if let Some(url) = token_url {
            oauth.token_url = url.to_string();
        }

        let mut config = ProxyConfig::default()
            .with_oauth(oauth)
            .with_cache_path(dir.path().join("cache.json"))
            .with_site_dir(site);
        if let Some(base) = upstream {
            config = config.with_upstream_base_url(base);
        }

        Self {
            server: ProxyServer::new(config),
            dir,
        }
    }

    /// Path of the on-disk token cache.
    pub fn cache_file(&self) -> std::path::PathBuf {
        self.dir.path().join("cache.json")
    }

    /// Run one GET through the router.
    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.server
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// Run an arbitrary request through the router.
    pub async fn request(&self, request: Request<Body>) -> axum::response::Response {
        self.server.router().oneshot(request).await.unwrap()
    }
}

/// Collect a response body into a string.
pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).to_string()
}

/// Follow `/oauth/start` and pull the state out of the Location header.
pub async fn start_flow(harness: &Harness) -> String {
    let response = harness.get("/oauth/start").await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response.headers()[header::LOCATION].to_str().unwrap();
    let url = url::Url::parse(location).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.to_string())
        .expect("authorize URL carries a state")
}

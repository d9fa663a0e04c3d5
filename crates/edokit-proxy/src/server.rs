//! The development proxy server.
//!
//! Composes the token cache, the PKCE session store, the exchange client,
//! and the upstream forwarder behind one axum router:
//!
//! - `GET /oauth/start` — begin a PKCE flow, redirect to the provider
//! - `GET /` — OAuth callback when flow params are present, else the site
//! - `GET /api/dev-auth/status` — the channel dashboards poll for a token
//! - `ANY /api/edo/{*rest}` — transparent forward to the upstream API
//! - everything else — static files from the site directory

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::{any, get},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::{ProxyError, Result};
use crate::oauth;
use crate::pages;
use crate::session::PkceSessionStore;
use crate::static_files;
use crate::token_cache::{DEFAULT_LIFETIME_SECS, TokenCache, TokenRecord};
use crate::upstream::UpstreamForwarder;

/// Everything the handlers need.
#[derive(Debug)]
pub struct ProxyContext {
    pub config: ProxyConfig,
    pub cache: TokenCache,
    pub sessions: PkceSessionStore,
    pub upstream: UpstreamForwarder,
    pub http: reqwest::Client,
}

impl ProxyContext {
    pub fn new(config: ProxyConfig) -> Self {
        let http = reqwest::Client::new();
        Self {
            cache: TokenCache::new(config.cache_path.clone()),
            sessions: PkceSessionStore::new(),
            upstream: UpstreamForwarder::new(http.clone(), config.upstream_base_url.clone()),
            http,
            config,
        }
    }
}

/// The development proxy server.
pub struct ProxyServer {
    context: Arc<ProxyContext>,
}

impl ProxyServer {
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            context: Arc::new(ProxyContext::new(config)),
        }
    }

    /// The shared handler context.
    pub fn context(&self) -> Arc<ProxyContext> {
        self.context.clone()
    }

    /// Build the router.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/", get(handle_root))
            .route("/oauth/start", get(handle_start))
            .route("/api/dev-auth/status", get(handle_status))
            .route("/api/edo/{*rest}", any(handle_forward))
            .fallback(handle_static)
            .with_state(self.context.clone())
            .layer(TraceLayer::new_for_http());

        if self.context.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        router
    }

    /// Warm the token cache from disk and serve until the listener fails.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.context.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;

        self.context.cache.load().await;

        tracing::info!(addr = %local_addr, upstream = %self.context.upstream.base_url(), "Starting EDO dev proxy");
        axum::serve(listener, self.router()).await
    }

    /// Serve in a background task with graceful shutdown, returning the
    /// bound address once the listener is up.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<SocketAddr> {
        let listener = TcpListener::bind(self.context.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;

        self.context.cache.load().await;

        tracing::info!(addr = %local_addr, upstream = %self.context.upstream.base_url(), "Starting EDO dev proxy");

        let router = self.router();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(error = %e, "Proxy server stopped");
            }
        });

        Ok(local_addr)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OAuth flow
// ─────────────────────────────────────────────────────────────────────────────

/// GET /oauth/start — create a PKCE entry and redirect to the provider.
async fn handle_start(State(ctx): State<Arc<ProxyContext>>) -> impl IntoResponse {
    let start = ctx.sessions.begin();
    let url = oauth::build_authorize_url(&ctx.config.oauth, &start.challenge, &start.state);

    tracing::info!(in_flight = ctx.sessions.len(), "Authorization flow started");

    // Literal 302; axum's Redirect helpers emit 303/307/308.
    (StatusCode::FOUND, [(header::LOCATION, url)])
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl CallbackParams {
    fn is_callback(&self) -> bool {
        self.error.is_some() || (self.code.is_some() && self.state.is_some())
    }
}

/// GET / — the OAuth callback when flow params are present, otherwise the
/// site index.
async fn handle_root(
    State(ctx): State<Arc<ProxyContext>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if params.is_callback() {
        return handle_callback(&ctx, params).await;
    }

    match static_files::serve(&ctx.config.site_dir, "/").await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// Resolve one authorization callback against the session store.
async fn handle_callback(ctx: &ProxyContext, params: CallbackParams) -> Response {
    if let Some(error) = params.error {
        // The provider bounced the attempt; discard any matching entry.
        if let Some(state) = &params.state {
            ctx.sessions.complete(state);
        }
        let detail = match params.error_description {
            Some(desc) => format!("{}: {}", error, desc),
            None => error,
        };
        tracing::warn!(detail = %detail, "Authorization rejected by the provider");
        return Html(pages::error(&detail)).into_response();
    }

    let (Some(code), Some(state)) = (params.code, params.state) else {
        return Html(pages::error("missing code or state")).into_response();
    };

    let Some(verifier) = ctx.sessions.complete(&state) else {
        tracing::warn!("Callback with unknown or already-used state");
        return Html(pages::error("unknown or already-used state")).into_response();
    };

    let reply = match oauth::exchange_code(&ctx.http, &ctx.config.oauth, &code, &verifier).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(error = %e, "Token exchange failed");
            return Html(pages::error(&e.to_string())).into_response();
        }
    };

    let Some(access_token) = reply.access_token else {
        let detail = reply.failure_reason();
        tracing::warn!(detail = %detail, "Token endpoint reported an error");
        return Html(pages::error(&detail)).into_response();
    };

    let lifetime = reply.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS);
    ctx.cache
        .persist(TokenRecord::expiring_in(access_token, lifetime))
        .await;

    tracing::info!("Authorization complete, token cached");
    Html(pages::success()).into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Status and forwarding
// ─────────────────────────────────────────────────────────────────────────────

/// Reply shape of the status endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusReply {
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// GET /api/dev-auth/status — the channel dashboards poll.
async fn handle_status(State(ctx): State<Arc<ProxyContext>>) -> Json<StatusReply> {
    match ctx.cache.current_valid().await {
        Some(record) => Json(StatusReply {
            ready: true,
            token: Some(record.access_token),
        }),
        None => Json(StatusReply {
            ready: false,
            token: None,
        }),
    }
}

/// ANY /api/edo/{*rest} — transparent forward to the upstream API.
async fn handle_forward(
    State(ctx): State<Arc<ProxyContext>>,
    Path(rest): Path<String>,
    method: Method,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let upstream_response = ctx
        .upstream
        .forward(method, &rest, raw_query.as_deref(), &headers, body)
        .await?;

    let status = upstream_response.status();
    let content_type = upstream_response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let stream = upstream_response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    let body = axum::body::Body::from_stream(stream);

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(body)
        .map_err(|e| ProxyError::Network(format!("Failed to relay upstream response: {}", e)))
}

/// Fallback — static files for unmatched GET paths.
async fn handle_static(
    State(ctx): State<Arc<ProxyContext>>,
    method: Method,
    uri: Uri,
) -> Result<Response> {
    if method != Method::GET {
        return Err(ProxyError::NotFound(format!(
            "no route for {} {}",
            method,
            uri.path()
        )));
    }
    static_files::serve(&ctx.config.site_dir, uri.path()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_server() -> (ProxyServer, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join("site");
        std::fs::create_dir_all(&site).unwrap();
        std::fs::write(site.join("index.html"), "<h1>dashboard</h1>").unwrap();

        let config = ProxyConfig::default()
            .with_cache_path(dir.path().join("cache.json"))
            .with_site_dir(site);
        (ProxyServer::new(config), dir)
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&bytes).to_string()
    }

    #[tokio::test]
    async fn test_start_redirects_with_flow_params() {
        let (server, _dir) = test_server();
        let response = server
            .router()
            .oneshot(Request::builder().uri("/oauth/start").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.contains("code_challenge="));
        assert!(location.contains("code_challenge_method=S256"));
        assert!(location.contains("state="));
        assert_eq!(server.context().sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_status_reports_not_ready_without_a_token() {
        let (server, _dir) = test_server();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api/dev-auth/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        // the token key is omitted entirely, not null
        assert_eq!(body_string(response).await, r#"{"ready":false}"#);
    }

    #[tokio::test]
    async fn test_status_reports_the_cached_token() {
        let (server, _dir) = test_server();
        server
            .context()
            .cache
            .persist(TokenRecord::expiring_in("cached-token", 1800))
            .await;

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api/dev-auth/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let reply: StatusReply = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(reply.ready);
        assert_eq!(reply.token.as_deref(), Some("cached-token"));
    }

    #[tokio::test]
    async fn test_callback_with_unknown_state_renders_the_error_page() {
        let (server, _dir) = test_server();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/?code=abc&state=forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("edo_auth_error"));
        assert!(body.contains("already-used state"));
        assert!(server.context().cache.current_valid().await.is_none());
    }

    #[tokio::test]
    async fn test_provider_error_consumes_the_session_entry() {
        let (server, _dir) = test_server();
        let start = server.context().sessions.begin();

        let uri = format!(
            "/?error=access_denied&error_description=user+cancelled&state={}",
            start.state
        );
        let response = server
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("edo_auth_error"));
        assert!(body.contains("access_denied"));
        assert!(server.context().sessions.is_empty());
    }

    #[tokio::test]
    async fn test_bare_root_serves_the_site_index() {
        let (server, _dir) = test_server();
        let response = server
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert!(body_string(response).await.contains("dashboard"));
    }

    #[tokio::test]
    async fn test_traversal_is_forbidden() {
        let (server, _dir) = test_server();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/../cache.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(body_string(response).await.contains("forbidden"));
    }

    #[tokio::test]
    async fn test_unknown_files_are_not_found() {
        let (server, _dir) = test_server();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/missing.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_get_outside_the_api_is_not_found() {
        let (server, _dir) = test_server();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/index.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

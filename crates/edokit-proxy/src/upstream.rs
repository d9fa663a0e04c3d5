//! Transparent forwarder to the upstream EDO API.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, header};

use crate::error::{ProxyError, Result};

/// Forwards requests verbatim to the upstream API.
///
/// No token handling of its own: whatever Authorization header the caller
/// presents is what reaches upstream.
#[derive(Debug, Clone)]
pub struct UpstreamForwarder {
    http: reqwest::Client,
    base_url: String,
}

impl UpstreamForwarder {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// The upstream base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forward one request, returning the raw upstream response so the
    /// caller can stream the body back.
    pub async fn forward(
        &self,
        method: Method,
        rest: &str,
        raw_query: Option<&str>,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<reqwest::Response> {
        let url = join_url(&self.base_url, rest, raw_query);

        tracing::debug!(method = %method, url = %url, "Forwarding to upstream");

        let mut request = self.http.request(method, &url);

        if let Some(auth) = headers.get(header::AUTHORIZATION) {
            request = request.header(header::AUTHORIZATION, auth.clone());
        }
        if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
            request = request.header(header::CONTENT_TYPE, content_type.clone());
        }

        if !body.is_empty() {
            request = request.body(body);
        }

        request
            .send()
            .await
            .map_err(|e| ProxyError::Network(format!("Upstream request failed: {}", e)))
    }
}

/// Join the base URL, a relative path, and the raw query string.
///
/// The query is appended untouched so repeated keys survive in order.
fn join_url(base: &str, rest: &str, raw_query: Option<&str>) -> String {
    let mut url = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        rest.trim_start_matches('/')
    );
    if let Some(query) = raw_query {
        url.push('?');
        url.push_str(query);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_handles_slashes() {
        assert_eq!(
            join_url("https://api.example.com/", "/point/1", None),
            "https://api.example.com/point/1"
        );
        assert_eq!(
            join_url("https://api.example.com", "point/1", None),
            "https://api.example.com/point/1"
        );
    }

    #[test]
    fn test_join_keeps_the_raw_query() {
        assert_eq!(
            join_url("https://api.example.com", "points", Some("id=1&id=2&from=2024")),
            "https://api.example.com/points?id=1&id=2&from=2024"
        );
    }
}

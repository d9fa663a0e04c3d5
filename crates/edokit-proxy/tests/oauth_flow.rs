//! OAuth callback flow tests against a mock token endpoint.
//!
//! These run the full start → callback → status sequence and verify what
//! reaches the provider and what lands in the cache file.

mod common;

use anyhow::Result;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use axum::http::StatusCode;
use edokit_proxy::StatusReply;

use common::{Harness, body_string, start_flow};

#[tokio::test]
async fn test_full_flow_caches_the_token() -> Result<()> {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&provider)
        .await;

    let harness = Harness::new(Some(&format!("{}/token", provider.uri())), None);

    let state = start_flow(&harness).await;
    let response = harness
        .get(&format!("/?code=test-code&state={}", state))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("edo_auth_ok"));

    // The exchange was form-encoded and carried the PKCE fields.
    let requests = provider.received_requests().await.unwrap();
    let form = String::from_utf8_lossy(&requests[0].body).to_string();
    assert!(form.contains("grant_type=authorization_code"));
    assert!(form.contains("code=test-code"));
    assert!(form.contains("code_verifier="));

    // The status endpoint now hands the token out.
    let response = harness.get("/api/dev-auth/status").await;
    let reply: StatusReply = serde_json::from_str(&body_string(response).await)?;
    assert!(reply.ready);
    assert_eq!(reply.token.as_deref(), Some("fresh-token"));

    // And the record survives on disk for the next start.
    let cached = std::fs::read_to_string(harness.cache_file())?;
    assert!(cached.contains("fresh-token"));
    assert!(cached.contains("expires_on"));

    Ok(())
}

#[tokio::test]
async fn test_cache_file_makes_a_restart_ready_without_a_new_flow() -> Result<()> {
    // No token endpoint is mounted; any exchange attempt would fail.
    let harness = Harness::new(None, None);

    // A token left behind by a previous run, half an hour from expiry.
    let expires_on = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs()
        + 1800;
    std::fs::write(
        harness.cache_file(),
        json!({ "access_token": "persisted-token", "expires_on": expires_on }).to_string(),
    )?;

    // run() warms the cache from disk before serving.
    harness.server.context().cache.load().await;

    let response = harness.get("/api/dev-auth/status").await;
    let reply: StatusReply = serde_json::from_str(&body_string(response).await)?;
    assert!(reply.ready);
    assert_eq!(reply.token.as_deref(), Some("persisted-token"));

    Ok(())
}

#[tokio::test]
async fn test_provider_error_reply_renders_the_error_page() -> Result<()> {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "AADSTS70008: the code has expired"
        })))
        .mount(&provider)
        .await;

    let harness = Harness::new(Some(&format!("{}/token", provider.uri())), None);

    let state = start_flow(&harness).await;
    let response = harness.get(&format!("/?code=stale&state={}", state)).await;

    // Still 200: the page itself reports the failure.
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("edo_auth_error"));
    assert!(body.contains("invalid_grant"));

    let response = harness.get("/api/dev-auth/status").await;
    let reply: StatusReply = serde_json::from_str(&body_string(response).await)?;
    assert!(!reply.ready);

    Ok(())
}

#[tokio::test]
async fn test_unknown_state_never_reaches_the_token_endpoint() -> Result<()> {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "never-handed-out"
        })))
        .expect(0)
        .mount(&provider)
        .await;

    let harness = Harness::new(Some(&format!("{}/token", provider.uri())), None);

    let response = harness.get("/?code=abc&state=forged").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("edo_auth_error"));
    assert!(!harness.cache_file().exists());

    Ok(())
}

#[tokio::test]
async fn test_state_cannot_be_replayed() -> Result<()> {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "one-shot",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&provider)
        .await;

    let harness = Harness::new(Some(&format!("{}/token", provider.uri())), None);
    let state = start_flow(&harness).await;
    let callback = format!("/?code=abc&state={}", state);

    let first = harness.get(&callback).await;
    assert!(body_string(first).await.contains("edo_auth_ok"));

    // The second callback with the same state fails without an exchange.
    let second = harness.get(&callback).await;
    assert!(body_string(second).await.contains("edo_auth_error"));

    Ok(())
}

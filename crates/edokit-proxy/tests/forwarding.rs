//! Reverse-proxy tests against a mock upstream.
//!
//! The forwarder must be transparent: method, query, body, and the caller's
//! Authorization header pass through untouched, and upstream replies come
//! back verbatim.

mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{Harness, body_string};

#[tokio::test]
async fn test_forwarding_is_verbatim() -> Result<()> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/point/building/7/point"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "points": [{"id": 1}, {"id": 2}]
        })))
        .mount(&upstream)
        .await;

    let harness = Harness::new(None, Some(&upstream.uri()));

    let request = Request::builder()
        .uri("/api/edo/point/building/7/point?id=1&id=2&detail=full")
        .header(header::AUTHORIZATION, "Bearer caller-token")
        .body(Body::empty())
        .unwrap();
    let response = harness.request(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("points"));

    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    // Repeated keys survive in order, and the bearer passes untouched.
    assert_eq!(requests[0].url.query(), Some("id=1&id=2&detail=full"));
    let auth = requests[0].headers.get("authorization").unwrap().to_str()?;
    assert_eq!(auth, "Bearer caller-token");

    Ok(())
}

#[tokio::test]
async fn test_upstream_errors_relay_status_and_body() -> Result<()> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/point/building/999/point"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "no such building"})),
        )
        .mount(&upstream)
        .await;

    let harness = Harness::new(None, Some(&upstream.uri()));
    let response = harness.get("/api/edo/point/building/999/point").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("no such building"));

    Ok(())
}

#[tokio::test]
async fn test_post_bodies_reach_upstream() -> Result<()> {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"created": true})))
        .mount(&upstream)
        .await;

    let harness = Harness::new(None, Some(&upstream.uri()));

    let request = Request::builder()
        .method("POST")
        .uri("/api/edo/report")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"from":"2024-01-01"}"#))
        .unwrap();
    let response = harness.request(request).await;

    assert_eq!(response.status(), StatusCode::CREATED);

    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(
        String::from_utf8_lossy(&requests[0].body),
        r#"{"from":"2024-01-01"}"#
    );
    let content_type = requests[0].headers.get("content-type").unwrap().to_str()?;
    assert_eq!(content_type, "application/json");

    Ok(())
}

#[tokio::test]
async fn test_unreachable_upstream_is_a_gateway_error() -> Result<()> {
    // Nothing listens on port 1.
    let harness = Harness::new(None, Some("http://127.0.0.1:1"));
    let response = harness.get("/api/edo/point/building/7/point").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_string(response).await;
    assert!(body.contains("bad_gateway"));
    assert!(body.contains("detail"));

    Ok(())
}

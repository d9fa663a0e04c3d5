//! OAuth 2.0 PKCE flow against the EDO identity provider.
//!
//! Covers the pieces the proxy drives itself: verifier/challenge pairs,
//! the authorization URL, and the code-for-token exchange.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::OAuthConfig;
use crate::error::{ProxyError, Result};

/// PKCE verifier and challenge pair.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// The code verifier, sent only during the token exchange.
    pub verifier: String,
    /// The S256 challenge, sent in the authorization URL.
    pub challenge: String,
}

impl PkceChallenge {
    /// Generate a fresh pair from 32 random bytes.
    pub fn generate() -> Self {
        let mut verifier_bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);
        let challenge = challenge_for(&verifier);

        Self { verifier, challenge }
    }
}

/// S256 challenge for a verifier: base64url(sha256(verifier)), unpadded.
pub fn challenge_for(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Random state string for callback correlation.
pub fn generate_state() -> String {
    let mut state_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut state_bytes);
    URL_SAFE_NO_PAD.encode(state_bytes)
}

/// Build the authorization URL the browser is redirected to.
pub fn build_authorize_url(config: &OAuthConfig, challenge: &str, state: &str) -> String {
    let params = [
        ("client_id", config.client_id.as_str()),
        ("response_type", "code"),
        ("redirect_uri", &config.redirect_uri),
        ("response_mode", "query"),
        ("scope", &config.scope),
        ("code_challenge", challenge),
        ("code_challenge_method", "S256"),
        ("state", state),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", config.authorize_url, query)
}

/// Parsed token-endpoint reply.
///
/// Every field is optional: provider-reported failures come back as a
/// well-formed reply with `error` set and no `access_token`, and the
/// caller decides what to do with them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// Fields this proxy does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenReply {
    /// Short failure reason for the callback page.
    pub fn failure_reason(&self) -> String {
        match (&self.error, &self.error_description) {
            (Some(code), Some(desc)) => format!("{}: {}", code, desc),
            (Some(code), None) => code.clone(),
            _ => "token endpoint returned no access token".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
    code_verifier: &'a str,
    scope: &'a str,
}

/// Exchange an authorization code for a token reply.
///
/// Any well-formed JSON body parses, whatever the HTTP status. Errors
/// here mean the request itself failed or the body was not JSON.
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &OAuthConfig,
    code: &str,
    verifier: &str,
) -> Result<TokenReply> {
    let request = ExchangeRequest {
        grant_type: "authorization_code",
        client_id: &config.client_id,
        code,
        redirect_uri: &config.redirect_uri,
        code_verifier: verifier,
        scope: &config.scope,
    };

    tracing::debug!(token_url = %config.token_url, "Exchanging authorization code");

    let response = http
        .post(&config.token_url)
        .form(&request)
        .send()
        .await
        .map_err(|e| ProxyError::Network(format!("Token exchange request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProxyError::Network(format!("Failed to read token reply: {}", e)))?;

    let reply: TokenReply = serde_json::from_str(&body).map_err(|e| {
        ProxyError::MalformedReply(format!(
            "Token endpoint returned non-JSON ({}): {}",
            status, e
        ))
    })?;

    Ok(reply)
}

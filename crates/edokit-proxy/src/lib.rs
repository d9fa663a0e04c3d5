//! Local development proxy for EDO dashboards.
//!
//! Drives the OAuth 2.0 PKCE flow against the EDO identity provider,
//! caches the resulting bearer token on disk, reverse-proxies API calls
//! from the dashboard to the upstream EDO API, and serves the dashboard
//! itself. One process, so a bare `git clone` needs nothing but a port.
//!
//! # Components
//!
//! - [`oauth`] — PKCE pairs, the authorization URL, the code exchange
//! - [`session`] — in-flight state-to-verifier map
//! - [`token_cache`] — the persisted token record
//! - [`upstream`] — transparent forwarder to the EDO API
//! - [`static_files`] — site serving with a traversal guard
//! - [`server`] — the axum server tying it together

pub mod config;
pub mod error;
pub mod oauth;
pub mod pages;
pub mod server;
pub mod session;
pub mod static_files;
pub mod token_cache;
pub mod upstream;

pub use config::{OAuthConfig, ProxyConfig};
pub use error::{ProxyError, Result};
pub use oauth::{PkceChallenge, TokenReply};
pub use server::{ProxyContext, ProxyServer, StatusReply};
pub use session::PkceSessionStore;
pub use token_cache::{TokenCache, TokenRecord};
pub use upstream::UpstreamForwarder;

//! Authentication SDK and data client for EDO dashboards.
//!
//! Two mutually exclusive modes, fixed when the client is built:
//!
//! - **Embedded** — an embedding host pushes the token over a
//!   [`HostChannel`]. The SDK announces itself with `EDO_READY` and waits
//!   for `EDO_TOKEN`, ignoring foreign traffic on the channel.
//! - **Standalone** — the SDK works through provisioned credentials, the
//!   session file, and one status probe against the local dev proxy; if
//!   all come up empty it hands back an [`InteractiveAuth`] flow for the
//!   caller to drive.
//!
//! Whichever path succeeds first resolves a single-use readiness signal.
//! Data calls made through [`EdoClient::get`] park on that signal, then
//! go through the proxy's `/api/edo/` prefix with the resolved bearer
//! token.

pub mod auth;
pub mod client;
pub mod error;
pub mod message;
pub mod params;
pub mod readiness;
pub mod session;

pub use auth::{AuthStrategy, InteractiveAuth, POLL_INTERVAL};
pub use client::{AuthOutcome, ClientBuilder, DEFAULT_PROXY_BASE, EdoClient};
pub use error::{Error, Result};
pub use message::{AUTH_ERROR_SENTINEL, AUTH_OK_SENTINEL, HostChannel, HostMessage, HostSide};
pub use params::{Param, Query};
pub use readiness::{Credentials, Readiness};
pub use session::SessionStore;

//! Messages exchanged with an embedding host.
//!
//! When a dashboard runs inside a larger application, the host delivers
//! the token over a message channel instead of the SDK running any flow
//! of its own. The wire shapes are tagged JSON objects; anything else on
//! the channel is foreign traffic and is ignored.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Sentinel the callback success page posts to its opener window.
pub const AUTH_OK_SENTINEL: &str = "edo_auth_ok";

/// Sentinel the callback failure page posts to its opener window.
pub const AUTH_ERROR_SENTINEL: &str = "edo_auth_error";

/// A message crossing the host boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum HostMessage {
    /// SDK to host: the dashboard finished loading and wants a token.
    #[serde(rename = "EDO_READY")]
    Ready,

    /// Host to SDK: the token and the proxy base to spend it against.
    #[serde(rename = "EDO_TOKEN")]
    Token {
        token: String,
        #[serde(rename = "proxyBaseUrl")]
        proxy_base_url: String,
    },
}

impl HostMessage {
    /// Parse a raw channel value; `None` for foreign shapes.
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// The SDK's two ends of a host embedding, as raw JSON values.
#[derive(Debug)]
pub struct HostChannel {
    /// Messages arriving from the host.
    pub incoming: mpsc::Receiver<serde_json::Value>,
    /// Messages for the host.
    pub outgoing: mpsc::Sender<serde_json::Value>,
}

impl HostChannel {
    /// Build a connected channel pair: the SDK side and the host side.
    pub fn pair(buffer: usize) -> (Self, HostSide) {
        let (to_sdk, incoming) = mpsc::channel(buffer);
        let (outgoing, from_sdk) = mpsc::channel(buffer);
        (
            Self { incoming, outgoing },
            HostSide {
                outgoing: to_sdk,
                incoming: from_sdk,
            },
        )
    }
}

/// The host's ends of a [`HostChannel`] pair, for embedding shells and
/// tests.
#[derive(Debug)]
pub struct HostSide {
    /// Messages for the SDK.
    pub outgoing: mpsc::Sender<serde_json::Value>,
    /// Messages arriving from the SDK.
    pub incoming: mpsc::Receiver<serde_json::Value>,
}

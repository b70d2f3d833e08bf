//! Request DTOs.
//!
//! Account bodies are validated by the account service itself; they are
//! re-exported here so handlers read the same way for every endpoint.

use serde::{Deserialize, Serialize};

pub use parley_service::account::{SignInRequest, SignUpRequest};

/// JSON form of a text-only send.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendTextRequest {
    /// Message text.
    #[serde(default)]
    pub text: Option<String>,
}

/// Query string accepted by the WebSocket handshake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsQuery {
    /// Claimed user id; must match the session when present.
    pub user_id: Option<String>,
    /// Session token for clients that cannot send cookies or headers.
    pub token: Option<String>,
}

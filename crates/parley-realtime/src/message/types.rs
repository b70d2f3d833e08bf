//! Inbound and outbound WebSocket event definitions.
//!
//! Every frame is a JSON text frame shaped as `{"event": <name>, "data": <payload>}`.
//! `data` is absent for events without a payload.

use serde::{Deserialize, Serialize};

use parley_core::types::id::UserId;
use parley_entity::message::Message;

/// Events sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum InboundEvent {
    /// Ask for a fresh online-user snapshot.
    GetOnlineUsers,
}

/// Events sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    /// Full set of currently online users.
    GetOnlineUsers(Vec<UserId>),
    /// A message addressed to this connection's user was just stored.
    NewMessage(Message),
    /// The last inbound frame was rejected.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

impl OutboundEvent {
    /// Build an error event.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetOnlineUsers(_) => "getOnlineUsers",
            Self::NewMessage(_) => "newMessage",
            Self::Error { .. } => "error",
        }
    }
}

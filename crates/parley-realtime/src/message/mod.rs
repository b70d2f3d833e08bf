//! Wire events exchanged over the WebSocket.

pub mod types;
pub mod validator;

pub use types::{InboundEvent, OutboundEvent};

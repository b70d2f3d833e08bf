//! Conversation use cases: contacts, history, and send-then-relay.

pub mod service;

pub use service::{MessageService, SendMessage};

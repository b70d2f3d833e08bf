//! # parley-service
//!
//! Business logic for Parley. Services receive their stores, auth
//! primitives, object storage and the realtime relay at construction time
//! and implement the account and messaging use cases on top of them.

pub mod account;
pub mod context;
pub mod message;
pub mod store;

pub use account::{AccountService, AuthSession, SignInRequest, SignUpRequest};
pub use context::RequestContext;
pub use message::{MessageService, SendMessage};
pub use store::{MemoryStore, MessageStore, PgStore, UserStore};

//! Persistence seams used by the services.
//!
//! The services only see these traits. Production wires them to Postgres
//! through [`PgStore`]; tests and database-less runs use [`MemoryStore`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use parley_core::result::AppResult;
use parley_core::types::id::UserId;
use parley_entity::message::{CreateMessage, Message};
use parley_entity::user::{CreateUser, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// User directory.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    /// Look up a user by id.
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>>;

    /// Look up a user by normalized email.
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Every user except `exclude`, newest first.
    async fn list_users_except(&self, exclude: UserId) -> AppResult<Vec<User>>;

    /// Insert a user. A taken email yields a `Conflict` error.
    async fn create_user(&self, data: CreateUser) -> AppResult<User>;

    /// Replace the avatar URL and return the updated user.
    async fn set_profile_picture(&self, id: UserId, url: &str) -> AppResult<User>;
}

/// Durable message store.
#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a message. It is durable once this returns.
    async fn create_message(&self, data: CreateMessage) -> AppResult<Message>;

    /// Messages between `a` and `b` in either direction, oldest first.
    async fn conversation(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>>;
}

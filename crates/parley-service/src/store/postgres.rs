//! Store implementation backed by the Postgres repositories.

use async_trait::async_trait;

use parley_core::result::AppResult;
use parley_core::types::id::UserId;
use parley_database::DatabasePool;
use parley_database::repositories::{MessageRepository, UserRepository};
use parley_entity::message::{CreateMessage, Message};
use parley_entity::user::{CreateUser, User};

use super::{MessageStore, UserStore};

/// Postgres-backed user and message store.
#[derive(Debug, Clone)]
pub struct PgStore {
    users: UserRepository,
    messages: MessageRepository,
}

impl PgStore {
    /// Build repositories over the shared pool.
    pub fn new(db: &DatabasePool) -> Self {
        Self {
            users: UserRepository::new(db.pool().clone()),
            messages: MessageRepository::new(db.pool().clone()),
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.users.find_by_email(email).await
    }

    async fn list_users_except(&self, exclude: UserId) -> AppResult<Vec<User>> {
        self.users.list_except(exclude).await
    }

    async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        self.users.create(&data).await
    }

    async fn set_profile_picture(&self, id: UserId, url: &str) -> AppResult<User> {
        self.users.update_profile_picture(id, url).await
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn create_message(&self, data: CreateMessage) -> AppResult<Message> {
        self.messages.create(&data).await
    }

    async fn conversation(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>> {
        self.messages.find_conversation(a, b).await
    }
}

//! In-process store for tests and database-less development runs.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use parley_core::error::AppError;
use parley_core::result::AppResult;
use parley_core::types::id::{MessageId, UserId};
use parley_entity::message::{CreateMessage, Message};
use parley_entity::user::{CreateUser, User};

use super::{MessageStore, UserStore};

/// Keeps users and messages in insertion order behind async locks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    messages: RwLock<Vec<Message>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users_except(&self, exclude: UserId) -> AppResult<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .rev()
            .filter(|u| u.id != exclude)
            .cloned()
            .collect())
    }

    async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == data.email) {
            return Err(AppError::conflict("Email is already taken"));
        }
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            full_name: data.full_name,
            email: data.email,
            password_hash: data.password_hash,
            profile_picture: data.profile_picture,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn set_profile_picture(&self, id: UserId, url: &str) -> AppResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.profile_picture = url.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create_message(&self, data: CreateMessage) -> AppResult<Message> {
        let now = Utc::now();
        let message = Message {
            id: MessageId::new(),
            sender_id: data.sender_id,
            receiver_id: data.receiver_id,
            text: data.text,
            image_url: data.image_url,
            created_at: now,
            updated_at: now,
        };
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn conversation(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.is_between(a, b))
            .cloned()
            .collect())
    }
}

//! Message repository implementation.

use sqlx::PgPool;

use parley_core::result::AppResult;
use parley_core::types::id::{MessageId, UserId};
use parley_entity::message::{CreateMessage, Message};

use super::query_error;

/// Repository for direct messages.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a message. The row is committed when this returns.
    pub async fn create(&self, data: &CreateMessage) -> AppResult<Message> {
        sqlx::query_as::<_, Message>(
            "INSERT INTO messages (id, sender_id, receiver_id, text, image_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(MessageId::new())
        .bind(data.sender_id)
        .bind(data.receiver_id)
        .bind(&data.text)
        .bind(&data.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_error("Failed to create message", e))
    }

    /// All messages exchanged between `a` and `b`, oldest first.
    pub async fn find_conversation(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            "SELECT * FROM messages \
             WHERE (sender_id = $1 AND receiver_id = $2) \
                OR (sender_id = $2 AND receiver_id = $1) \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("Failed to load conversation", e))
    }
}

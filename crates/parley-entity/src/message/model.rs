//! Message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use parley_core::types::id::{MessageId, UserId};

/// A persisted direct message between two users.
///
/// Messages are immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Author of the message.
    pub sender_id: UserId,
    /// Recipient of the message.
    pub receiver_id: UserId,
    /// Trimmed text body, empty for image-only messages.
    pub text: String,
    /// Public URL of the attached image, empty when there is none.
    #[serde(rename = "image")]
    pub image_url: String,
    /// When the message was stored.
    pub created_at: DateTime<Utc>,
    /// When the message was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Whether the message belongs to the conversation between `a` and `b`.
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}

/// Data required to persist a new message.
#[derive(Debug, Clone)]
pub struct CreateMessage {
    /// Author of the message.
    pub sender_id: UserId,
    /// Recipient of the message.
    pub receiver_id: UserId,
    /// Text body, possibly empty.
    pub text: String,
    /// Image URL, possibly empty.
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        Message {
            id: MessageId::new(),
            sender_id: UserId::new(),
            receiver_id: UserId::new(),
            text: "hi".into(),
            image_url: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_wire_shape_uses_camel_case_and_image_key() {
        let msg = sample();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["senderId"], msg.sender_id.to_string());
        assert_eq!(json["receiverId"], msg.receiver_id.to_string());
        assert_eq!(json["text"], "hi");
        assert_eq!(json["image"], "");
        assert!(json.get("imageUrl").is_none());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_is_between_either_direction() {
        let msg = sample();
        assert!(msg.is_between(msg.sender_id, msg.receiver_id));
        assert!(msg.is_between(msg.receiver_id, msg.sender_id));
        assert!(!msg.is_between(msg.sender_id, UserId::new()));
    }
}

//! Message service: persists messages and hands them to the live relay.

use std::sync::Arc;

use tracing::info;

use parley_core::error::AppError;
use parley_core::result::AppResult;
use parley_core::types::id::UserId;
use parley_entity::message::{CreateMessage, Message};
use parley_entity::user::User;
use parley_realtime::{DeliveryOutcome, DeliveryRelay};
use parley_storage::{ImageUpload, StorageManager};

use crate::account::service::is_image;
use crate::context::RequestContext;
use crate::store::{MessageStore, UserStore};

/// Content of an outgoing message as received from the client.
#[derive(Debug, Clone, Default)]
pub struct SendMessage {
    /// Text body, trimmed before storing.
    pub text: Option<String>,
    /// Attached image.
    pub image: Option<ImageUpload>,
}

/// Handles conversation use cases.
#[derive(Debug, Clone)]
pub struct MessageService {
    users: Arc<dyn UserStore>,
    messages: Arc<dyn MessageStore>,
    storage: Arc<StorageManager>,
    relay: DeliveryRelay,
}

impl MessageService {
    /// Creates a new message service.
    pub fn new(
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
        storage: Arc<StorageManager>,
        relay: DeliveryRelay,
    ) -> Self {
        Self {
            users,
            messages,
            storage,
            relay,
        }
    }

    /// Everyone the caller can talk to, newest accounts first.
    pub async fn list_contacts(&self, ctx: &RequestContext) -> AppResult<Vec<User>> {
        self.users.list_users_except(ctx.user_id).await
    }

    /// The full history between the caller and `contact_id`, oldest first.
    pub async fn conversation(
        &self,
        ctx: &RequestContext,
        contact_id: &str,
    ) -> AppResult<Vec<Message>> {
        let contact = parse_contact(contact_id)?;

        if self.users.find_user(ctx.user_id).await?.is_none() {
            return Err(AppError::validation("Main user not found"));
        }
        if self.users.find_user(contact).await?.is_none() {
            return Err(AppError::validation("Contact user not found"));
        }

        self.messages.conversation(ctx.user_id, contact).await
    }

    /// Store a message from the caller to `contact_id`, then push it to the
    /// receiver if they are online.
    ///
    /// The message is durable before the relay runs. The relay outcome is
    /// only logged; an offline receiver picks the message up from history.
    pub async fn send(
        &self,
        ctx: &RequestContext,
        contact_id: &str,
        input: SendMessage,
    ) -> AppResult<Message> {
        let receiver = parse_contact(contact_id)?;

        let text = input
            .text
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        let image = input.image.filter(|img| !img.data.is_empty());

        if text.is_empty() && image.is_none() {
            return Err(AppError::validation("Either text or an image is required"));
        }

        if let Some(img) = &image {
            let max = self.storage.max_image_size_bytes();
            if img.size() > max {
                return Err(AppError::validation(format!(
                    "Image must be less than {}MB",
                    max / (1024 * 1024)
                )));
            }
            if !is_image(&img.content_type) {
                return Err(AppError::validation("Only image attachments are allowed"));
            }
        }

        if self.users.find_user(receiver).await?.is_none() {
            return Err(AppError::validation("Contact user not found"));
        }

        let image_url = match image {
            Some(img) => self.storage.store_image(ctx.user_id, img).await?,
            None => String::new(),
        };

        let message = self
            .messages
            .create_message(CreateMessage {
                sender_id: ctx.user_id,
                receiver_id: receiver,
                text,
                image_url,
            })
            .await?;

        let outcome = self.relay.relay(&message);

        info!(
            message_id = %message.id,
            sender_id = %ctx.user_id,
            receiver_id = %receiver,
            has_image = !message.image_url.is_empty(),
            delivered = outcome == DeliveryOutcome::Delivered,
            "Message sent"
        );

        Ok(message)
    }
}

fn parse_contact(raw: &str) -> AppResult<UserId> {
    raw.parse()
        .map_err(|_| AppError::validation("Invalid contact user ID"))
}

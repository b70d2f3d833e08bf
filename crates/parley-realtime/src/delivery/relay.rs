//! Relays stored messages to their receiver's live connection.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use parley_entity::message::Message;

use crate::connection::registry::ConnectionRegistry;
use crate::message::types::OutboundEvent;
use crate::metrics::EngineMetrics;

/// What happened to a relayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Pushed to the receiver's current connection.
    Delivered,
    /// Not pushed; the receiver will see it in their history.
    ReceiverOffline,
}

/// Pushes `newMessage` events to online receivers. Never queues or retries.
#[derive(Debug, Clone)]
pub struct DeliveryRelay {
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<EngineMetrics>,
}

impl DeliveryRelay {
    /// Create a relay over `registry`.
    pub fn new(registry: Arc<ConnectionRegistry>, metrics: Arc<EngineMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// Push `message` to its receiver if they are online.
    ///
    /// Must only be called once the message is durably stored. A failed push
    /// is reported as [`DeliveryOutcome::ReceiverOffline`] and never as an error.
    pub fn relay(&self, message: &Message) -> DeliveryOutcome {
        let Some(handle) = self.registry.lookup(message.receiver_id) else {
            debug!(
                message_id = %message.id,
                receiver_id = %message.receiver_id,
                "Receiver offline, message left for history"
            );
            self.metrics.record_undelivered();
            return DeliveryOutcome::ReceiverOffline;
        };

        if handle.send(OutboundEvent::NewMessage(message.clone())) {
            debug!(
                message_id = %message.id,
                receiver_id = %message.receiver_id,
                conn_id = %handle.id,
                "Message delivered"
            );
            self.metrics.record_delivered();
            DeliveryOutcome::Delivered
        } else {
            warn!(
                message_id = %message.id,
                receiver_id = %message.receiver_id,
                conn_id = %handle.id,
                "Push to receiver failed, message left for history"
            );
            self.metrics.record_undelivered();
            DeliveryOutcome::ReceiverOffline
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use parley_core::types::id::{MessageId, UserId};

    use super::*;
    use crate::connection::handle::ConnectionHandle;

    fn message_to(receiver: UserId) -> Message {
        Message {
            id: MessageId::new(),
            sender_id: UserId::new(),
            receiver_id: receiver,
            text: "hi".into(),
            image_url: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn setup() -> (Arc<ConnectionRegistry>, Arc<EngineMetrics>, DeliveryRelay) {
        let registry = Arc::new(ConnectionRegistry::new());
        let metrics = Arc::new(EngineMetrics::new());
        let relay = DeliveryRelay::new(Arc::clone(&registry), Arc::clone(&metrics));
        (registry, metrics, relay)
    }

    #[test]
    fn test_online_receiver_gets_exactly_one_push() {
        let (registry, metrics, relay) = setup();
        let receiver = UserId::new();
        let (handle, mut rx) = ConnectionHandle::channel(receiver, 8);
        registry.register(receiver, Arc::new(handle));

        let message = message_to(receiver);
        assert_eq!(relay.relay(&message), DeliveryOutcome::Delivered);

        assert_eq!(rx.try_recv().unwrap(), OutboundEvent::NewMessage(message));
        assert!(rx.try_recv().is_err());
        assert_eq!(metrics.snapshot().messages_delivered, 1);
    }

    #[test]
    fn test_offline_receiver_gets_nothing() {
        let (_registry, metrics, relay) = setup();
        let message = message_to(UserId::new());
        assert_eq!(relay.relay(&message), DeliveryOutcome::ReceiverOffline);
        assert_eq!(metrics.snapshot().messages_undelivered, 1);
    }

    #[test]
    fn test_closed_transport_reports_offline() {
        let (registry, _metrics, relay) = setup();
        let receiver = UserId::new();
        let (handle, rx) = ConnectionHandle::channel(receiver, 8);
        registry.register(receiver, Arc::new(handle));
        drop(rx);

        assert_eq!(
            relay.relay(&message_to(receiver)),
            DeliveryOutcome::ReceiverOffline
        );
        assert!(registry.is_online(receiver));
    }

    #[test]
    fn test_only_latest_connection_receives() {
        let (registry, _metrics, relay) = setup();
        let receiver = UserId::new();
        let (old, mut old_rx) = ConnectionHandle::channel(receiver, 8);
        let (new, mut new_rx) = ConnectionHandle::channel(receiver, 8);
        registry.register(receiver, Arc::new(old));
        registry.register(receiver, Arc::new(new));

        assert_eq!(relay.relay(&message_to(receiver)), DeliveryOutcome::Delivered);
        assert!(old_rx.try_recv().is_err());
        assert!(new_rx.try_recv().is_ok());
    }
}

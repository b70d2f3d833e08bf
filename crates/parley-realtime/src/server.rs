//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use parley_auth::jwt::JwtDecoder;
use parley_core::config::RealtimeConfig;
use parley_core::types::id::UserId;

use crate::connection::authenticator::WsAuthenticator;
use crate::connection::handle::{ConnectionHandle, OutboundReceiver};
use crate::connection::pool::ConnectionPool;
use crate::connection::registry::ConnectionRegistry;
use crate::delivery::relay::DeliveryRelay;
use crate::message::types::{InboundEvent, OutboundEvent};
use crate::message::validator::parse_inbound;
use crate::metrics::EngineMetrics;
use crate::presence::broadcaster::PresenceBroadcaster;

/// Lifecycle events reported by connection tasks.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// An authenticated connection was opened.
    Connect(Arc<ConnectionHandle>),
    /// A connection's socket closed.
    Disconnect(Arc<ConnectionHandle>),
    /// The client asked for the current online set.
    RequestSnapshot(Arc<ConnectionHandle>),
}

/// Central real-time engine. Built once at startup and shared by `Arc`.
pub struct RealtimeEngine {
    /// Who is online and which connection receives their pushes.
    pub registry: Arc<ConnectionRegistry>,
    /// Every open socket.
    pub pool: Arc<ConnectionPool>,
    /// Presence snapshot fan-out.
    pub presence: Arc<PresenceBroadcaster>,
    /// Live message delivery.
    pub relay: DeliveryRelay,
    /// Handshake authentication.
    pub authenticator: WsAuthenticator,
    /// Metrics collector.
    pub metrics: Arc<EngineMetrics>,
    config: RealtimeConfig,
    shutdown_tx: broadcast::Sender<()>,
    broadcaster_task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("online", &self.registry.len())
            .field("connections", &self.pool.connection_count())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems.
    pub fn new(config: RealtimeConfig, decoder: Arc<JwtDecoder>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(EngineMetrics::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let pool = Arc::new(ConnectionPool::new());
        let presence = Arc::new(PresenceBroadcaster::new(
            Arc::clone(&registry),
            Arc::clone(&pool),
            Arc::clone(&metrics),
        ));
        let relay = DeliveryRelay::new(Arc::clone(&registry), Arc::clone(&metrics));

        info!("Real-time engine initialized");

        Self {
            registry,
            pool,
            presence,
            relay,
            authenticator: WsAuthenticator::new(decoder),
            metrics,
            config,
            shutdown_tx,
            broadcaster_task: Mutex::new(None),
        }
    }

    /// Spawn the presence broadcaster. Calling it twice is harmless.
    pub async fn start(&self) {
        let mut task = self.broadcaster_task.lock().await;
        if task.is_none() {
            let presence = Arc::clone(&self.presence);
            *task = Some(tokio::spawn(presence.run(self.shutdown_tx.subscribe())));
        }
    }

    /// Create the handle and outbound queue for a new connection.
    ///
    /// The handle is not announced until a [`ConnectionEvent::Connect`] is
    /// handled for it.
    pub fn open_connection(
        &self,
        user_id: UserId,
    ) -> (Arc<ConnectionHandle>, OutboundReceiver) {
        let (handle, rx) = ConnectionHandle::channel(user_id, self.config.outbound_buffer_size);
        (Arc::new(handle), rx)
    }

    /// Apply a connection lifecycle event.
    pub async fn handle_event(&self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connect(handle) => {
                if let Some(previous) = self.registry.register(handle.user_id, Arc::clone(&handle))
                {
                    debug!(
                        user_id = %handle.user_id,
                        superseded = %previous.id,
                        "New connection takes over presence"
                    );
                }
                self.presence.admit(&handle).await;
                self.metrics.record_connect();
                info!(
                    conn_id = %handle.id,
                    user_id = %handle.user_id,
                    "User connected"
                );
            }
            ConnectionEvent::Disconnect(handle) => {
                handle.mark_dead();
                if self.pool.remove(&handle.id).is_none() {
                    return;
                }
                let went_offline = self.registry.unregister(handle.user_id, &handle);
                self.metrics.record_disconnect();
                info!(
                    conn_id = %handle.id,
                    user_id = %handle.user_id,
                    went_offline,
                    "User disconnected"
                );
            }
            ConnectionEvent::RequestSnapshot(handle) => {
                self.presence.send_snapshot(&handle).await;
            }
        }
    }

    /// Process one inbound text frame from `handle`.
    pub async fn handle_inbound(&self, handle: &Arc<ConnectionHandle>, raw: &str) {
        match parse_inbound(raw, self.config.max_inbound_message_bytes) {
            Ok(InboundEvent::GetOnlineUsers) => {
                self.metrics.record_inbound(true);
                self.handle_event(ConnectionEvent::RequestSnapshot(Arc::clone(handle)))
                    .await;
            }
            Err(e) => {
                self.metrics.record_inbound(false);
                debug!(conn_id = %handle.id, error = %e.message, "Rejected inbound frame");
                handle.send(OutboundEvent::error("INVALID_EVENT", e.message));
            }
        }
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Stop the broadcaster and drop every connection.
    pub async fn shutdown(&self) {
        info!("Shutting down real-time engine");

        let _ = self.shutdown_tx.send(());

        if let Some(task) = self.broadcaster_task.lock().await.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Presence broadcaster ended abnormally");
            }
        }

        for handle in self.pool.drain() {
            handle.mark_dead();
            self.metrics.record_disconnect();
        }
        self.registry.clear();

        info!("Real-time engine shut down");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use parley_core::config::AuthConfig;
    use parley_core::types::id::MessageId;
    use parley_entity::message::Message;

    use super::*;
    use crate::delivery::relay::DeliveryOutcome;

    fn engine() -> RealtimeEngine {
        RealtimeEngine::new(
            RealtimeConfig::default(),
            Arc::new(JwtDecoder::new(&AuthConfig::default())),
        )
    }

    fn sorted(mut ids: Vec<UserId>) -> Vec<UserId> {
        ids.sort();
        ids
    }

    async fn wait_for_snapshot(
        rx: &mut OutboundReceiver,
        expected: &[UserId],
    ) {
        let expected = sorted(expected.to_vec());
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Some(OutboundEvent::GetOnlineUsers(ids)) = rx.recv().await {
                    if sorted(ids) == expected {
                        return;
                    }
                }
            }
        })
        .await
        .expect("expected snapshot never arrived");
    }

    fn message(from: UserId, to: UserId, text: &str) -> Message {
        Message {
            id: MessageId::new(),
            sender_id: from,
            receiver_id: to,
            text: text.into(),
            image_url: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_two_users_chat_then_one_leaves() {
        let engine = engine();
        engine.start().await;

        let a = UserId::new();
        let b = UserId::new();
        let (ha, mut rxa) = engine.open_connection(a);
        engine.handle_event(ConnectionEvent::Connect(Arc::clone(&ha))).await;
        let (hb, mut rxb) = engine.open_connection(b);
        engine.handle_event(ConnectionEvent::Connect(Arc::clone(&hb))).await;

        wait_for_snapshot(&mut rxa, &[a, b]).await;
        wait_for_snapshot(&mut rxb, &[a, b]).await;

        let hi = message(a, b, "hi");
        assert_eq!(engine.relay.relay(&hi), DeliveryOutcome::Delivered);
        let received = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Some(OutboundEvent::NewMessage(m)) = rxb.recv().await {
                    return m;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(received.text, "hi");

        engine.handle_event(ConnectionEvent::Disconnect(Arc::clone(&hb))).await;
        wait_for_snapshot(&mut rxa, &[a]).await;

        let later = message(a, b, "still there?");
        assert_eq!(engine.relay.relay(&later), DeliveryOutcome::ReceiverOffline);

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_superseded_disconnect_keeps_user_online() {
        let engine = engine();
        let user = UserId::new();
        let (old, _rx_old) = engine.open_connection(user);
        let (new, mut rx_new) = engine.open_connection(user);

        engine.handle_event(ConnectionEvent::Connect(Arc::clone(&old))).await;
        engine.handle_event(ConnectionEvent::Connect(Arc::clone(&new))).await;
        engine.handle_event(ConnectionEvent::Disconnect(Arc::clone(&old))).await;

        assert!(engine.registry.is_online(user));
        assert_eq!(engine.registry.lookup(user).unwrap().id, new.id);
        assert_eq!(engine.pool.connection_count(), 1);

        while rx_new.try_recv().is_ok() {}
        let m = message(UserId::new(), user, "ping");
        assert_eq!(engine.relay.relay(&m), DeliveryOutcome::Delivered);
        assert_eq!(rx_new.try_recv().unwrap(), OutboundEvent::NewMessage(m));
    }

    #[tokio::test]
    async fn test_duplicate_disconnect_is_ignored() {
        let engine = engine();
        let user = UserId::new();
        let (handle, _rx) = engine.open_connection(user);
        engine.handle_event(ConnectionEvent::Connect(Arc::clone(&handle))).await;
        engine.handle_event(ConnectionEvent::Disconnect(Arc::clone(&handle))).await;
        engine.handle_event(ConnectionEvent::Disconnect(Arc::clone(&handle))).await;

        let snapshot = engine.metrics.snapshot();
        assert_eq!(snapshot.connections_total, 1);
        assert_eq!(snapshot.connections_active, 0);
    }

    #[tokio::test]
    async fn test_inbound_snapshot_request_and_garbage() {
        let engine = engine();
        let user = UserId::new();
        let (handle, mut rx) = engine.open_connection(user);
        engine.handle_event(ConnectionEvent::Connect(Arc::clone(&handle))).await;
        assert_eq!(rx.try_recv().unwrap(), OutboundEvent::GetOnlineUsers(vec![user]));

        engine.handle_inbound(&handle, r#"{"event":"getOnlineUsers"}"#).await;
        assert_eq!(rx.try_recv().unwrap(), OutboundEvent::GetOnlineUsers(vec![user]));

        engine.handle_inbound(&handle, "nonsense").await;
        assert!(matches!(rx.try_recv().unwrap(), OutboundEvent::Error { .. }));
        assert_eq!(engine.metrics.snapshot().inbound_rejected, 1);
    }

    #[tokio::test]
    async fn test_shutdown_clears_presence() {
        let engine = engine();
        engine.start().await;
        let (handle, _rx) = engine.open_connection(UserId::new());
        engine.handle_event(ConnectionEvent::Connect(Arc::clone(&handle))).await;

        engine.shutdown().await;
        assert!(engine.registry.is_empty());
        assert_eq!(engine.pool.connection_count(), 0);
        assert!(!handle.is_alive());
        assert_eq!(engine.metrics.snapshot().connections_active, 0);

        // The connection task still reports its close; it must not count twice.
        engine.handle_event(ConnectionEvent::Disconnect(handle)).await;
        let snapshot = engine.metrics.snapshot();
        assert_eq!(snapshot.connections_active, 0);
        assert_eq!(snapshot.connections_total, 1);
    }

    #[tokio::test]
    async fn test_full_queue_still_learns_latest_presence() {
        let engine = RealtimeEngine::new(
            RealtimeConfig {
                outbound_buffer_size: 1,
                ..RealtimeConfig::default()
            },
            Arc::new(JwtDecoder::new(&AuthConfig::default())),
        );
        engine.start().await;

        let a = UserId::new();
        let b = UserId::new();
        let (ha, mut rxa) = engine.open_connection(a);
        engine.handle_event(ConnectionEvent::Connect(Arc::clone(&ha))).await;

        let queued = message(b, a, "fills the only slot");
        assert_eq!(engine.relay.relay(&queued), DeliveryOutcome::Delivered);

        let (hb, _rxb) = engine.open_connection(b);
        engine.handle_event(ConnectionEvent::Connect(Arc::clone(&hb))).await;

        let expected = sorted(vec![a, b]);
        let mut seen = Vec::new();
        tokio::time::timeout(Duration::from_secs(2), async {
            while let Some(event) = rxa.recv().await {
                let done = matches!(&event, OutboundEvent::GetOnlineUsers(ids) if sorted(ids.clone()) == expected);
                seen.push(event);
                if done {
                    return;
                }
            }
        })
        .await
        .expect("presence update was lost behind a full queue");
        while let Ok(event) = rxa.try_recv() {
            seen.push(event);
        }

        assert!(seen.contains(&OutboundEvent::NewMessage(queued)));
        engine.shutdown().await;
    }
}

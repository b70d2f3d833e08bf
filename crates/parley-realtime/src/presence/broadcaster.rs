//! Pushes online-user snapshots to connected clients.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info};

use crate::connection::handle::ConnectionHandle;
use crate::connection::pool::ConnectionPool;
use crate::connection::registry::ConnectionRegistry;
use crate::message::types::OutboundEvent;
use crate::metrics::EngineMetrics;

/// Sends `getOnlineUsers` snapshots.
///
/// All snapshot pushes go through `fanout`, so the snapshot is taken and
/// delivered under one lock. Each connection therefore sees snapshots in
/// the order they were taken.
#[derive(Debug)]
pub struct PresenceBroadcaster {
    registry: Arc<ConnectionRegistry>,
    pool: Arc<ConnectionPool>,
    metrics: Arc<EngineMetrics>,
    fanout: Mutex<()>,
}

impl PresenceBroadcaster {
    /// Create a broadcaster over the given registry and pool.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        pool: Arc<ConnectionPool>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            registry,
            pool,
            metrics,
            fanout: Mutex::new(()),
        }
    }

    /// Greet a new connection with the current snapshot, then include it in
    /// future broadcasts.
    pub async fn admit(&self, handle: &Arc<ConnectionHandle>) {
        let _guard = self.fanout.lock().await;
        let snapshot = self.registry.online_identities();
        handle.send(OutboundEvent::GetOnlineUsers(snapshot));
        self.pool.add(Arc::clone(handle));
    }

    /// Answer one connection's explicit snapshot request.
    pub async fn send_snapshot(&self, handle: &ConnectionHandle) {
        let _guard = self.fanout.lock().await;
        let snapshot = self.registry.online_identities();
        handle.send(OutboundEvent::GetOnlineUsers(snapshot));
    }

    /// Push the current snapshot to every open connection.
    ///
    /// Returns how many connections accepted the push.
    pub async fn broadcast_all(&self) -> usize {
        let _guard = self.fanout.lock().await;
        let snapshot = self.registry.online_identities();
        let connections = self.pool.all_connections();

        let delivered = connections
            .iter()
            .filter(|conn| conn.send(OutboundEvent::GetOnlineUsers(snapshot.clone())))
            .count();

        self.metrics.record_broadcast();
        debug!(
            online = snapshot.len(),
            connections = connections.len(),
            delivered,
            "Presence snapshot broadcast"
        );
        delivered
    }

    /// Broadcast after registry changes until shutdown.
    ///
    /// Changes that pile up while a broadcast is in flight collapse into a
    /// single follow-up broadcast of the then-current state.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut changes = self.registry.subscribe_changes();
        info!("Presence broadcaster started");

        loop {
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    changes.borrow_and_update();
                    self.broadcast_all().await;
                }
                _ = shutdown.recv() => break,
            }
        }

        info!("Presence broadcaster stopped");
    }
}

#[cfg(test)]
mod tests {
    use parley_core::types::id::UserId;

    use super::*;
    use crate::connection::handle::OutboundReceiver;

    fn setup() -> (Arc<ConnectionRegistry>, Arc<ConnectionPool>, PresenceBroadcaster) {
        let registry = Arc::new(ConnectionRegistry::new());
        let pool = Arc::new(ConnectionPool::new());
        let broadcaster = PresenceBroadcaster::new(
            Arc::clone(&registry),
            Arc::clone(&pool),
            Arc::new(EngineMetrics::new()),
        );
        (registry, pool, broadcaster)
    }

    fn connect(user: UserId) -> (Arc<ConnectionHandle>, OutboundReceiver) {
        let (handle, rx) = ConnectionHandle::channel(user, 16);
        (Arc::new(handle), rx)
    }

    #[tokio::test]
    async fn test_admit_sends_snapshot_to_newcomer_only() {
        let (registry, pool, broadcaster) = setup();
        let a = UserId::new();
        let (ha, mut rxa) = connect(a);
        registry.register(a, Arc::clone(&ha));
        broadcaster.admit(&ha).await;

        let b = UserId::new();
        let (hb, mut rxb) = connect(b);
        registry.register(b, Arc::clone(&hb));
        broadcaster.admit(&hb).await;

        assert_eq!(rxa.try_recv().unwrap(), OutboundEvent::GetOnlineUsers(vec![a]));
        assert!(rxa.try_recv().is_err());

        match rxb.try_recv().unwrap() {
            OutboundEvent::GetOnlineUsers(mut ids) => {
                ids.sort();
                let mut expected = vec![a, b];
                expected.sort();
                assert_eq!(ids, expected);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(pool.connection_count(), 2);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_superseded_tabs() {
        let (registry, _pool, broadcaster) = setup();
        let user = UserId::new();
        let (old, mut rx_old) = connect(user);
        let (new, mut rx_new) = connect(user);

        registry.register(user, Arc::clone(&old));
        broadcaster.admit(&old).await;
        registry.register(user, Arc::clone(&new));
        broadcaster.admit(&new).await;
        while rx_old.try_recv().is_ok() {}
        while rx_new.try_recv().is_ok() {}

        assert_eq!(broadcaster.broadcast_all().await, 2);
        assert_eq!(rx_old.try_recv().unwrap(), OutboundEvent::GetOnlineUsers(vec![user]));
        assert_eq!(rx_new.try_recv().unwrap(), OutboundEvent::GetOnlineUsers(vec![user]));
    }

    #[tokio::test]
    async fn test_run_follows_registry_changes() {
        let registry = Arc::new(ConnectionRegistry::new());
        let metrics = Arc::new(EngineMetrics::new());
        let broadcaster = Arc::new(PresenceBroadcaster::new(
            Arc::clone(&registry),
            Arc::new(ConnectionPool::new()),
            Arc::clone(&metrics),
        ));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(Arc::clone(&broadcaster).run(shutdown_rx));
        tokio::task::yield_now().await;

        let watcher = UserId::new();
        let (hw, mut rxw) = connect(watcher);
        registry.register(watcher, Arc::clone(&hw));
        broadcaster.admit(&hw).await;

        let other = UserId::new();
        let (ho, _rxo) = connect(other);
        registry.register(other, Arc::clone(&ho));
        tokio::task::yield_now().await;
        registry.unregister(other, &ho);

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let mut events = Vec::new();
        while let Ok(event) = rxw.try_recv() {
            events.push(event);
        }

        assert!(metrics.snapshot().presence_broadcasts >= 1);
        assert_eq!(
            events.last(),
            Some(&OutboundEvent::GetOnlineUsers(vec![watcher]))
        );

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
    }
}

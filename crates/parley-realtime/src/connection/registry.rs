//! Presence registry: the single source of truth for who is online.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use parley_core::types::id::UserId;

use super::handle::ConnectionHandle;

/// Maps each online user to the connection that receives their pushes.
///
/// At most one entry exists per user; the most recent connection wins.
/// Every mutation bumps a version on a watch channel, which the presence
/// broadcaster follows.
#[derive(Debug)]
pub struct ConnectionRegistry {
    entries: DashMap<UserId, Arc<ConnectionHandle>>,
    changes: watch::Sender<u64>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            entries: DashMap::new(),
            changes,
        }
    }

    /// Make `handle` the connection for `identity`, replacing any previous one.
    ///
    /// Returns the superseded handle, if there was one.
    pub fn register(
        &self,
        identity: UserId,
        handle: Arc<ConnectionHandle>,
    ) -> Option<Arc<ConnectionHandle>> {
        let conn_id = handle.id;
        let previous = self.entries.insert(identity, handle);
        if let Some(prev) = &previous {
            debug!(
                user_id = %identity,
                old_conn = %prev.id,
                new_conn = %conn_id,
                "Connection superseded"
            );
        }
        self.notify();
        previous
    }

    /// Remove the entry for `identity` only if it still points at `handle`.
    ///
    /// A disconnect from a superseded connection is a no-op, so it can never
    /// evict the newer connection. Returns whether an entry was removed.
    pub fn unregister(&self, identity: UserId, handle: &ConnectionHandle) -> bool {
        let removed = self
            .entries
            .remove_if(&identity, |_, current| current.id == handle.id)
            .is_some();
        if removed {
            self.notify();
        }
        removed
    }

    /// The connection currently receiving pushes for `identity`.
    pub fn lookup(&self, identity: UserId) -> Option<Arc<ConnectionHandle>> {
        self.entries
            .get(&identity)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Whether `identity` has a registered connection.
    pub fn is_online(&self, identity: UserId) -> bool {
        self.entries.contains_key(&identity)
    }

    /// Point-in-time copy of the online user set.
    pub fn online_identities(&self) -> Vec<UserId> {
        self.entries.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of online users.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nobody is online.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Follow registry mutations. The value is a monotonically increasing version.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.clear();
        self.notify();
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

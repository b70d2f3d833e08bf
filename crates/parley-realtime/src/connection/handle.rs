//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use parley_core::types::id::UserId;

use crate::message::types::OutboundEvent;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// A handle to a single WebSocket connection.
///
/// The socket itself is owned by the connection task; the handle only holds
/// the sending halves of that task's outbound queues. Once the task exits,
/// pushes through the handle fail without touching any shared state.
///
/// Presence snapshots do not share the bounded event queue. They go to a
/// single-slot `watch` that always holds the newest snapshot, so a client
/// whose queue was full still ends up with the current online set.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// User who owns this connection
    pub user_id: UserId,
    /// Sender for outbound events
    sender: mpsc::Sender<OutboundEvent>,
    /// Latest presence snapshot not yet read by the connection task
    presence: watch::Sender<Option<Vec<UserId>>>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end its connection task reads from.
    ///
    /// `capacity` bounds the event queue and must be non-zero.
    pub fn channel(user_id: UserId, capacity: usize) -> (Self, OutboundReceiver) {
        let (sender, events) = mpsc::channel(capacity);
        let (presence, presence_rx) = watch::channel(None);
        let handle = Self {
            id: Uuid::new_v4(),
            user_id,
            sender,
            presence,
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
        };
        let receiver = OutboundReceiver {
            events,
            presence: presence_rx,
        };
        (handle, receiver)
    }

    /// Queue an event for this connection without waiting.
    ///
    /// A presence snapshot replaces any unread one and never waits on the
    /// event queue. Returns `false` if the connection is gone or its event
    /// queue is full.
    pub fn send(&self, event: OutboundEvent) -> bool {
        if !self.is_alive() {
            return false;
        }
        if let OutboundEvent::GetOnlineUsers(ids) = event {
            if self.presence.is_closed() {
                self.mark_dead();
                return false;
            }
            self.presence.send_replace(Some(ids));
            return true;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && !self.sender.is_closed()
    }

    /// Mark connection as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

/// Receiving side of a connection's outbound traffic.
///
/// A pending presence snapshot is yielded before queued events.
#[derive(Debug)]
pub struct OutboundReceiver {
    events: mpsc::Receiver<OutboundEvent>,
    presence: watch::Receiver<Option<Vec<UserId>>>,
}

impl OutboundReceiver {
    /// Wait for the next outbound event. `None` once the handle is gone and
    /// everything queued has been read.
    pub async fn recv(&mut self) -> Option<OutboundEvent> {
        loop {
            if let Some(snapshot) = self.take_presence() {
                return Some(snapshot);
            }
            tokio::select! {
                biased;
                changed = self.presence.changed() => {
                    if changed.is_err() {
                        return self.events.recv().await;
                    }
                }
                event = self.events.recv() => return event,
            }
        }
    }

    /// Take the next outbound event if one is ready.
    pub fn try_recv(&mut self) -> Result<OutboundEvent, mpsc::error::TryRecvError> {
        match self.take_presence() {
            Some(snapshot) => Ok(snapshot),
            None => self.events.try_recv(),
        }
    }

    fn take_presence(&mut self) -> Option<OutboundEvent> {
        if !self.presence.has_changed().unwrap_or(false) {
            return None;
        }
        self.presence
            .borrow_and_update()
            .clone()
            .map(OutboundEvent::GetOnlineUsers)
    }
}

//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    connections_total: AtomicU64,
    connections_active: AtomicU64,
    messages_delivered: AtomicU64,
    messages_undelivered: AtomicU64,
    presence_broadcasts: AtomicU64,
    inbound_frames: AtomicU64,
    inbound_rejected: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection
    pub fn record_connect(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a disconnection
    pub fn record_disconnect(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a message pushed to an online receiver
    pub fn record_delivered(&self) {
        self.messages_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message left for history
    pub fn record_undelivered(&self) {
        self.messages_undelivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a presence fan-out
    pub fn record_broadcast(&self) {
        self.presence_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an inbound frame; `accepted` is false when it failed validation
    pub fn record_inbound(&self, accepted: bool) {
        self.inbound_frames.fetch_add(1, Ordering::Relaxed);
        if !accepted {
            self.inbound_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            messages_undelivered: self.messages_undelivered.load(Ordering::Relaxed),
            presence_broadcasts: self.presence_broadcasts.load(Ordering::Relaxed),
            inbound_frames: self.inbound_frames.load(Ordering::Relaxed),
            inbound_rejected: self.inbound_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections ever admitted
    pub connections_total: u64,
    /// Currently open connections
    pub connections_active: u64,
    /// Messages pushed to an online receiver
    pub messages_delivered: u64,
    /// Messages whose receiver was offline or unreachable
    pub messages_undelivered: u64,
    /// Presence fan-outs performed
    pub presence_broadcasts: u64,
    /// Inbound frames processed
    pub inbound_frames: u64,
    /// Inbound frames rejected
    pub inbound_rejected: u64,
}

//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each connection's outbound queue.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Maximum accepted size of an inbound text frame in bytes.
    #[serde(default = "default_max_inbound")]
    pub max_inbound_message_bytes: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            max_inbound_message_bytes: default_max_inbound(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_max_inbound() -> usize {
    16 * 1024
}

//! # parley-realtime
//!
//! Presence and live delivery for Parley. Provides:
//!
//! - the connection registry mapping each user to their current connection
//! - presence snapshots pushed to every connected client on change
//! - relay of freshly persisted messages to online recipients
//! - authentication of WebSocket handshakes against the session token
//!
//! Delivery is best effort: a message whose recipient is offline is not
//! queued and is picked up from history instead.

pub mod connection;
pub mod delivery;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod server;

pub use connection::authenticator::WsAuthenticator;
pub use connection::handle::{ConnectionHandle, ConnectionId, OutboundReceiver};
pub use connection::registry::ConnectionRegistry;
pub use delivery::relay::{DeliveryOutcome, DeliveryRelay};
pub use message::types::{InboundEvent, OutboundEvent};
pub use presence::broadcaster::PresenceBroadcaster;
pub use server::{ConnectionEvent, RealtimeEngine};

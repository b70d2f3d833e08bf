//! Live delivery of persisted messages.

pub mod relay;

pub use relay::{DeliveryOutcome, DeliveryRelay};

//! Presence fan-out.

pub mod broadcaster;

pub use broadcaster::PresenceBroadcaster;

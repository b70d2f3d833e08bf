//! Request handlers, one module per API area.

pub mod auth;
pub mod health;
pub mod message;
pub mod presence;
pub mod ws;

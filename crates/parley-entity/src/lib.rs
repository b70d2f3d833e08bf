//! # parley-entity
//!
//! Domain entity models for Parley. Every struct in this crate represents
//! a database table row or the data needed to create one. Row types derive
//! `sqlx::FromRow` and serialize with camelCase keys, which is the shape
//! clients receive over both HTTP and the WebSocket.

pub mod message;
pub mod user;

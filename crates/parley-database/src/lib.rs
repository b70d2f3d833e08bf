//! # parley-database
//!
//! PostgreSQL connection management and concrete repository
//! implementations for users and messages.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;

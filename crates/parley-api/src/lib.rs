//! # parley-api
//!
//! HTTP API layer for Parley built on Axum.
//!
//! Provides the REST endpoints for accounts and conversations, the
//! WebSocket upgrade into the realtime engine, middleware (CORS, request
//! logging), extractors, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;

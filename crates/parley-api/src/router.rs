//! Route definitions for the Parley HTTP API.
//!
//! REST routes are mounted under `/api`; the WebSocket endpoint lives at
//! `/ws`.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};

use crate::handlers;
use crate::state::AppState;

/// Room left in a request body for multipart framing and text fields.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the Axum router with all routes.
///
/// Receives the fully-constructed `AppState` and threads it through
/// every route via `.with_state(state)`.
pub fn build_router(state: AppState) -> Router {
    let max_body =
        state.config.storage.max_image_size_bytes as usize + MULTIPART_OVERHEAD_BYTES;

    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(message_routes())
        .merge(presence_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_upgrade))
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}

/// Sign-up, sign-in, logout, profile
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(handlers::auth::sign_up))
        .route("/auth/signin", post(handlers::auth::sign_in))
        .route("/auth/logout", delete(handlers::auth::logout))
        .route("/auth/get-user", get(handlers::auth::get_user))
        .route("/auth/update-user", put(handlers::auth::update_user))
}

/// Contacts, history, send
fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages/users", get(handlers::message::list_users))
        .route("/messages/{id}", get(handlers::message::get_messages))
        .route("/messages/send/{id}", post(handlers::message::send_message))
}

/// Online users
fn presence_routes() -> Router<AppState> {
    Router::new().route("/presence/online", get(handlers::presence::online_users))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

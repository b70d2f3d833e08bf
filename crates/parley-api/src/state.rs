//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use parley_auth::{JwtDecoder, JwtEncoder};
use parley_core::config::AppConfig;
use parley_realtime::RealtimeEngine;
use parley_service::{AccountService, MessageService, MessageStore, UserStore};
use parley_storage::StorageManager;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// When the process started serving
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// Image storage
    pub storage: Arc<StorageManager>,

    // ── Auth ─────────────────────────────────────────────────
    /// Session token decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Realtime ─────────────────────────────────────────────
    /// Presence and live delivery engine
    pub realtime: Arc<RealtimeEngine>,

    // ── Services ─────────────────────────────────────────────
    /// Account service
    pub accounts: Arc<AccountService>,
    /// Message service
    pub messages: Arc<MessageService>,
}

impl AppState {
    /// Wire the auth primitives, realtime engine, and services over the
    /// given stores.
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        message_store: Arc<dyn MessageStore>,
        storage: Arc<StorageManager>,
    ) -> Self {
        let jwt_encoder = Arc::new(JwtEncoder::new(&config.auth));
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));

        let realtime = Arc::new(RealtimeEngine::new(
            config.realtime.clone(),
            Arc::clone(&jwt_decoder),
        ));

        let accounts = Arc::new(AccountService::new(
            Arc::clone(&users),
            jwt_encoder,
            Arc::clone(&storage),
            &config.auth,
        ));
        let messages = Arc::new(MessageService::new(
            users,
            message_store,
            Arc::clone(&storage),
            realtime.relay.clone(),
        ));

        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
            storage,
            jwt_decoder,
            realtime,
            accounts,
            messages,
        }
    }
}

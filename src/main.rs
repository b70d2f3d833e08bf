//! Parley server: presence and live delivery for direct messaging.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing_subscriber::{EnvFilter, fmt};

use parley_api::{AppState, build_app};
use parley_core::config::AppConfig;
use parley_core::error::AppError;
use parley_database::DatabasePool;
use parley_service::{MemoryStore, MessageStore, PgStore, UserStore};
use parley_storage::StorageManager;

#[tokio::main]
async fn main() {
    let env = std::env::var("PARLEY_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Object storage ───────────────────────────────────
    tracing::info!(
        "Initializing storage (provider: {})...",
        config.storage.provider
    );
    let storage = Arc::new(StorageManager::from_config(&config.storage).await?);

    // ── Step 2: Persistence ──────────────────────────────────────
    let (db_pool, users, messages): (
        Option<DatabasePool>,
        Arc<dyn UserStore>,
        Arc<dyn MessageStore>,
    ) = if config.database.url.is_empty() {
        tracing::warn!("No database URL configured, using the in-memory store");
        let store = Arc::new(MemoryStore::new());
        (None, store.clone(), store)
    } else {
        tracing::info!("Connecting to database...");
        let pool = DatabasePool::connect(&config.database).await?;
        let store = Arc::new(PgStore::new(&pool));
        (Some(pool), store.clone(), store)
    };

    // ── Step 3: Application state ────────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, users, messages, storage);

    // ── Step 4: Realtime engine ──────────────────────────────────
    state.realtime.start().await;
    let realtime = Arc::clone(&state.realtime);

    // ── Step 5: Build and start HTTP server ──────────────────────
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("Parley server listening on {}", addr);

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let (signalled_tx, signalled_rx) = oneshot::channel();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, closing live connections...");
        let _ = signalled_tx.send(());
        realtime.shutdown().await;
    });
    let mut server = tokio::spawn(async move { server.await });

    let finished = tokio::select! {
        result = &mut server => Some(result),
        _ = signalled_rx => tokio::time::timeout(grace, &mut server).await.ok(),
    };

    match finished {
        Some(Ok(result)) => {
            result.map_err(|e| AppError::internal(format!("Server error: {}", e)))?;
        }
        Some(Err(e)) => {
            return Err(AppError::internal(format!("Server task failed: {}", e)));
        }
        None => {
            tracing::warn!(
                grace_seconds = grace.as_secs(),
                "In-flight requests did not finish within the grace period"
            );
            server.abort();
        }
    }

    // ── Step 7: Release resources ────────────────────────────────
    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("Parley server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! Application builder: wires router, middleware, and state into an Axum app.

use axum::Router;
use axum::middleware as axum_middleware;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
///
/// With the local storage provider, uploaded images are served from the
/// storage root at the provider's public base path.
pub fn build_app(state: AppState) -> Router {
    let config = state.config.clone();
    let mut app = build_router(state);

    if config.storage.provider == "local" {
        let mount = config.storage.local.public_base_url.trim_end_matches('/');
        if mount.starts_with('/') {
            app = app.nest_service(mount, ServeDir::new(&config.storage.local.root_path));
        }
    }

    app.layer(axum_middleware::from_fn(request_logging))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&config.server.cors))
}

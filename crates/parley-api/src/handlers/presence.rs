//! Presence handlers.

use axum::Json;
use axum::extract::State;

use parley_core::types::id::UserId;

use crate::dto::response::ApiResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/presence/online
pub async fn online_users(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Json<ApiResponse<Vec<UserId>>> {
    let online = state.realtime.registry.online_identities();
    Json(ApiResponse::ok("Online users fetched successfully", online))
}

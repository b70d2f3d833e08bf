//! WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use parley_core::types::id::UserId;
use parley_realtime::ConnectionEvent;

use crate::dto::request::WsQuery;
use crate::error::ApiError;
use crate::extractors::auth::session_token;
use crate::state::AppState;

/// GET /ws?userId={id}: WebSocket upgrade
///
/// The session token comes from the `jwt` cookie, a bearer header, or the
/// `token` query parameter, in that order.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    // Authenticate before upgrade
    let token = session_token(&headers, &state.config.auth.cookie_name).or(query.token);
    let user_id = state
        .realtime
        .authenticator
        .authenticate(token.as_deref(), query.user_id.as_deref())?;

    Ok(ws.on_upgrade(move |socket| handle_ws_connection(state, user_id, socket)))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, user_id: UserId, socket: WebSocket) {
    let engine = Arc::clone(&state.realtime);
    let mut shutdown = engine.shutdown_receiver();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = engine.open_connection(user_id);
    let conn_id = handle.id;
    engine
        .handle_event(ConnectionEvent::Connect(Arc::clone(&handle)))
        .await;

    // Spawn outbound message forwarder
    let outbound_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(conn_id = %conn_id, event = event.name(), error = %e, "Failed to encode event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    // Process inbound messages
    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    engine.handle_inbound(&handle, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
            _ = shutdown.recv() => break,
        }
    }

    // Cleanup
    outbound_task.abort();
    engine.handle_event(ConnectionEvent::Disconnect(handle)).await;

    info!(conn_id = %conn_id, user_id = %user_id, "WebSocket connection closed");
}

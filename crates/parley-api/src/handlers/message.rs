//! Conversation handlers: contacts, history, send.

use axum::Json;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header::CONTENT_TYPE;

use parley_core::error::AppError;
use parley_entity::message::Message;
use parley_entity::user::User;
use parley_service::SendMessage;

use crate::dto::request::SendTextRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{AuthUser, JsonBody, UploadForm};
use crate::state::AppState;

/// GET /api/messages/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.messages.list_contacts(&auth).await?;
    Ok(Json(ApiResponse::ok("Users fetched successfully", users)))
}

/// GET /api/messages/{id}
pub async fn get_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(contact_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let messages = state.messages.conversation(&auth, &contact_id).await?;
    Ok(Json(ApiResponse::ok("Messages fetched successfully", messages)))
}

/// POST /api/messages/send/{id}
///
/// Accepts `multipart/form-data` with a `text` field and an optional
/// `image` file, or a JSON body `{"text": ...}` for text-only messages.
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(contact_id): Path<String>,
    request: Request,
) -> Result<Json<ApiResponse<Message>>, ApiError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let input = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        let mut form = UploadForm::collect(multipart).await?;
        SendMessage {
            text: form.take_field("text"),
            image: form.take_file("image"),
        }
    } else {
        let JsonBody(body) = JsonBody::<SendTextRequest>::from_request(request, &state).await?;
        SendMessage {
            text: body.text,
            image: None,
        }
    };

    let message = state.messages.send(&auth, &contact_id, input).await?;
    Ok(Json(ApiResponse::ok("Message sent successfully", message)))
}

//! Auth handlers: sign-up, sign-in, logout, profile.

use axum::Json;
use axum::extract::State;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};

use parley_core::config::AppConfig;
use parley_core::error::AppError;
use parley_entity::user::User;

use crate::dto::request::{SignInRequest, SignUpRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{AuthUser, JsonBody, MaybeAuthUser, UploadForm};
use crate::state::AppState;

/// `Set-Cookie` value carrying the session token.
///
/// `Secure` is dropped and `SameSite` relaxed to `Lax` only in development.
pub fn session_cookie(config: &AppConfig, token: &str, max_age_seconds: u64) -> String {
    let (same_site, secure) = if config.server.is_development() {
        ("Lax", "")
    } else {
        ("Strict", "; Secure")
    };
    format!(
        "{}={}; Path=/; HttpOnly; Max-Age={}; SameSite={}{}",
        config.auth.cookie_name, token, max_age_seconds, same_site, secure
    )
}

/// `Set-Cookie` value that removes the session cookie.
pub fn cleared_session_cookie(config: &AppConfig) -> String {
    session_cookie(config, "", 0)
}

fn session_max_age(config: &AppConfig) -> u64 {
    config.auth.token_ttl_days * 24 * 60 * 60
}

/// POST /api/auth/signup
pub async fn sign_up(
    State(state): State<AppState>,
    MaybeAuthUser(current): MaybeAuthUser,
    JsonBody(req): JsonBody<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if current.is_some() {
        return Err(AppError::validation("User is already logged in and cannot sign up again").into());
    }

    let session = state.accounts.sign_up(req).await?;
    let cookie = session_cookie(&state.config, &session.token.token, session_max_age(&state.config));

    Ok((
        [(SET_COOKIE, cookie)],
        Json(ApiResponse::ok("Sign up successful", session.user)),
    ))
}

/// POST /api/auth/signin
pub async fn sign_in(
    State(state): State<AppState>,
    MaybeAuthUser(current): MaybeAuthUser,
    JsonBody(req): JsonBody<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if current.is_some() {
        return Err(AppError::validation("User is already logged in and cannot sign in again").into());
    }

    let session = state.accounts.sign_in(req).await?;
    let cookie = session_cookie(&state.config, &session.token.token, session_max_age(&state.config));

    Ok((
        [(SET_COOKIE, cookie)],
        Json(ApiResponse::ok("Sign in successful", session.user)),
    ))
}

/// DELETE /api/auth/logout
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(SET_COOKIE, cleared_session_cookie(&state.config))],
        Json(ApiResponse::message("Logged out successfully")),
    )
}

/// GET /api/auth/get-user
///
/// A request without a valid session also has its cookie cleared.
pub async fn get_user(
    State(state): State<AppState>,
    MaybeAuthUser(current): MaybeAuthUser,
) -> Response {
    let Some(ctx) = current else {
        let err = ApiError(AppError::authentication(
            "User is not logged in and cannot get user profile",
        ));
        return ([(SET_COOKIE, cleared_session_cookie(&state.config))], err).into_response();
    };

    match state.accounts.profile(&ctx).await {
        Ok(user) => Json(ApiResponse::ok("User profile fetched successfully", user)).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// PUT /api/auth/update-user (multipart, field `profilePicture`)
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let upload = match multipart {
        Ok(multipart) => UploadForm::collect(multipart).await?.take_file("profilePicture"),
        Err(_) => None,
    };

    let user = state.accounts.update_profile_picture(&auth, upload).await?;
    Ok(Json(ApiResponse::ok("Profile picture updated successfully", user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_attributes_follow_environment() {
        let mut config = AppConfig::default();
        config.server.environment = "production".into();
        assert_eq!(
            session_cookie(&config, "tok", 604800),
            "jwt=tok; Path=/; HttpOnly; Max-Age=604800; SameSite=Strict; Secure"
        );

        config.server.environment = "development".into();
        assert_eq!(
            cleared_session_cookie(&config),
            "jwt=; Path=/; HttpOnly; Max-Age=0; SameSite=Lax"
        );
    }
}

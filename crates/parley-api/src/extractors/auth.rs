//! `AuthUser` extractor: pulls the session token from the `jwt` cookie or the
//! Authorization header, validates it, and injects the request context.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};

use parley_core::error::AppError;
use parley_service::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Session token carried by the request, cookie first, then bearer header.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            headers
                .typed_get::<Authorization<Bearer>>()
                .map(|auth| auth.token().to_string())
        })
}

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.config.auth.cookie_name)
            .ok_or_else(|| AppError::authentication("Unauthorized - No token provided"))?;

        let user_id = state.jwt_decoder.verify(&token)?;
        Ok(AuthUser(RequestContext::new(user_id)))
    }
}

/// Like [`AuthUser`], but a missing or invalid token yields `None` instead
/// of a rejection.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<RequestContext>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = session_token(&parts.headers, &state.config.auth.cookie_name)
            .and_then(|token| match state.jwt_decoder.verify(&token) {
                Ok(user_id) => Some(RequestContext::new(user_id)),
                Err(e) => {
                    tracing::debug!(error = %e.message, "Ignoring invalid session token");
                    None
                }
            });
        Ok(MaybeAuthUser(ctx))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use axum::http::header::{AUTHORIZATION, COOKIE};

    use super::*;

    #[test]
    fn test_cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; jwt=from-cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(session_token(&headers, "jwt").as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_bearer_fallback_and_absent() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers, "jwt"), None);

        headers.insert(COOKIE, HeaderValue::from_static("jwt="));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(session_token(&headers, "jwt").as_deref(), Some("abc.def.ghi"));
    }
}

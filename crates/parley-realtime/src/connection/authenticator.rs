//! WebSocket handshake authentication.

use std::sync::Arc;

use parley_auth::jwt::JwtDecoder;
use parley_core::error::AppError;
use parley_core::types::id::UserId;

/// Admits WebSocket handshakes that carry a valid session token.
///
/// Clients may also send the legacy `userId` query parameter. It is only
/// accepted when it names the same user as the verified token.
#[derive(Clone)]
pub struct WsAuthenticator {
    decoder: Arc<JwtDecoder>,
}

impl std::fmt::Debug for WsAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAuthenticator").finish()
    }
}

impl WsAuthenticator {
    /// Creates a new WebSocket authenticator.
    pub fn new(decoder: Arc<JwtDecoder>) -> Self {
        Self { decoder }
    }

    /// Resolve the connecting user, or reject the handshake.
    pub fn authenticate(
        &self,
        token: Option<&str>,
        claimed_user_id: Option<&str>,
    ) -> Result<UserId, AppError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::authentication("Unauthorized - No token provided"))?;

        let user_id = self.decoder.verify(token)?;

        if let Some(claimed) = claimed_user_id.map(str::trim).filter(|c| !c.is_empty()) {
            let claimed: UserId = claimed
                .parse()
                .map_err(|_| AppError::authentication("Invalid userId"))?;
            if claimed != user_id {
                return Err(AppError::authentication(
                    "userId does not match the authenticated session",
                ));
            }
        }

        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_auth::jwt::JwtEncoder;
    use parley_core::config::AuthConfig;
    use parley_core::error::ErrorKind;

    fn setup() -> (JwtEncoder, WsAuthenticator) {
        let config = AuthConfig::default();
        (
            JwtEncoder::new(&config),
            WsAuthenticator::new(Arc::new(JwtDecoder::new(&config))),
        )
    }

    #[test]
    fn test_token_alone_is_enough() {
        let (encoder, auth) = setup();
        let user = UserId::new();
        let token = encoder.generate_token(user).unwrap().token;
        assert_eq!(auth.authenticate(Some(&token), None).unwrap(), user);
    }

    #[test]
    fn test_matching_user_id_accepted() {
        let (encoder, auth) = setup();
        let user = UserId::new();
        let token = encoder.generate_token(user).unwrap().token;
        let claimed = user.to_string();
        assert_eq!(auth.authenticate(Some(&token), Some(&claimed)).unwrap(), user);
    }

    #[test]
    fn test_spoofed_user_id_rejected() {
        let (encoder, auth) = setup();
        let token = encoder.generate_token(UserId::new()).unwrap().token;
        let other = UserId::new().to_string();
        let err = auth.authenticate(Some(&token), Some(&other)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[test]
    fn test_missing_or_bad_token_rejected() {
        let (_, auth) = setup();
        let claimed = UserId::new().to_string();
        assert!(auth.authenticate(None, Some(&claimed)).is_err());
        assert!(auth.authenticate(Some(""), None).is_err());
        assert!(auth.authenticate(Some("forged"), None).is_err());
    }
}

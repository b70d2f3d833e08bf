//! Session token verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use parley_core::config::AuthConfig;
use parley_core::error::AppError;
use parley_core::types::id::UserId;

use super::claims::Claims;

/// Verifies session tokens and yields the authenticated identity.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // seconds of clock skew
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Checks signature and expiry and returns the full claims.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                debug!(error = %e, "Session token rejected");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication("Invalid token"),
                }
            })?;

        Ok(token_data.claims)
    }

    /// Verifies a session token and returns the user it was issued to.
    pub fn verify(&self, token: &str) -> Result<UserId, AppError> {
        self.decode(token).map(|claims| claims.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::JwtEncoder;
    use parley_core::error::ErrorKind;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_issued_token_verifies_to_same_user() {
        let cfg = config("unit-test-secret");
        let user = UserId::new();
        let issued = JwtEncoder::new(&cfg).generate_token(user).unwrap();

        let decoder = JwtDecoder::new(&cfg);
        assert_eq!(decoder.verify(&issued.token).unwrap(), user);

        let claims = decoder.decode(&issued.token).unwrap();
        assert!(!claims.is_expired());
        assert_eq!(claims.expires_at().timestamp(), issued.expires_at.timestamp());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = JwtEncoder::new(&config("one"))
            .generate_token(UserId::new())
            .unwrap();
        let err = JwtDecoder::new(&config("two")).verify(&issued.token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[test]
    fn test_expired_token_rejected() {
        let cfg = AuthConfig {
            token_ttl_days: 0,
            ..config("expiry")
        };
        let claims = Claims {
            user_id: UserId::new(),
            iat: 0,
            exp: chrono::Utc::now().timestamp() - 3600,
            jti: uuid::Uuid::new_v4(),
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
        )
        .unwrap();

        let err = JwtDecoder::new(&cfg).verify(&token).unwrap_err();
        assert_eq!(err.message, "Token has expired");
    }

    #[test]
    fn test_garbage_rejected() {
        let decoder = JwtDecoder::new(&config("x"));
        assert!(decoder.verify("not.a.jwt").is_err());
        assert!(decoder.verify("").is_err());
    }
}

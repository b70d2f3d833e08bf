//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication, session token, and password policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Session token lifetime in days. Also used as the cookie `Max-Age`.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_days: u64,
    /// Name of the cookie carrying the session token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Maximum password length.
    #[serde(default = "default_password_max")]
    pub password_max_length: usize,
    /// Minimum zxcvbn score (0-4). Zero disables the strength check.
    #[serde(default)]
    pub min_password_score: u8,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_days: default_token_ttl(),
            cookie_name: default_cookie_name(),
            password_min_length: default_password_min(),
            password_max_length: default_password_max(),
            min_password_score: 0,
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_token_ttl() -> u64 {
    7
}

fn default_cookie_name() -> String {
    "jwt".to_string()
}

fn default_password_min() -> usize {
    8
}

fn default_password_max() -> usize {
    128
}

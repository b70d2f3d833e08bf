//! Password policy enforcement for new accounts.

use parley_core::config::AuthConfig;
use parley_core::error::AppError;

/// Characters accepted as the required "special" character.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Validates new passwords against the configured policy.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
    max_length: usize,
    min_score: u8,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
            max_length: config.password_max_length,
            min_score: config.min_password_score,
        }
    }

    /// Returns the first violated rule as a validation error.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        let length = password.chars().count();
        if length < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if length > self.max_length {
            return Err(AppError::validation(format!(
                "Password must be at most {} characters long",
                self.max_length
            )));
        }

        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(AppError::validation(
                "Password must contain at least one lowercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(AppError::validation(
                "Password must contain at least one uppercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::validation(
                "Password must contain at least one number",
            ));
        }

        if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
            return Err(AppError::validation(
                "Password must contain at least one special character",
            ));
        }

        if self.min_score > 0 {
            let estimate = zxcvbn::zxcvbn(password, &[]);
            if (estimate.score() as u8) < self.min_score {
                return Err(AppError::validation(
                    "Password is too weak. Please use a stronger password.",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> PasswordValidator {
        PasswordValidator::new(&AuthConfig::default())
    }

    #[test]
    fn test_accepts_policy_compliant_password() {
        assert!(validator().validate("Passw0rd!").is_ok());
    }

    #[test]
    fn test_reports_first_violation() {
        let v = validator();
        let msg = |p: &str| v.validate(p).unwrap_err().message;

        assert_eq!(msg("Pa0!"), "Password must be at least 8 characters long");
        assert_eq!(msg("PASSW0RD!"), "Password must contain at least one lowercase letter");
        assert_eq!(msg("passw0rd!"), "Password must contain at least one uppercase letter");
        assert_eq!(msg("Password!"), "Password must contain at least one number");
        assert_eq!(msg("Passw0rd_"), "Password must contain at least one special character");
    }

    #[test]
    fn test_rejects_overlong_password() {
        let long = format!("Aa1!{}", "x".repeat(125));
        assert!(validator().validate(&long).is_err());
    }

    #[test]
    fn test_strength_floor_when_enabled() {
        let v = PasswordValidator::new(&AuthConfig {
            min_password_score: 4,
            ..AuthConfig::default()
        });
        assert!(v.validate("Passw0rd!").is_err());
    }
}

//! Account request payloads and their field rules.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

const FULL_NAME_MIN: usize = 3;
const FULL_NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 254;

/// Sign-up body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    /// Display name.
    #[serde(default)]
    #[validate(custom(function = "validate_full_name"))]
    pub full_name: String,
    /// Email address.
    #[serde(default)]
    #[validate(custom(function = "validate_email_address"))]
    pub email: String,
    /// Plain-text password, checked against the password policy.
    #[serde(default)]
    pub password: String,
    /// Must repeat `password`.
    #[serde(default)]
    #[validate(must_match(other = "password", message = "Passwords don't match"))]
    pub confirm_password: String,
    /// Avatar URL; a generated one is used when absent.
    #[serde(default)]
    pub profile_picture: Option<String>,
}

impl SignUpRequest {
    /// Copy with surrounding whitespace removed from the name and email.
    pub fn trimmed(&self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            ..self.clone()
        }
    }
}

/// Sign-in body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    /// Email address.
    #[serde(default)]
    #[validate(custom(function = "validate_email_address"))]
    pub email: String,
    /// Plain-text password.
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

fn rule(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

fn validate_full_name(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 {
        return Err(rule("required", "Full name is required"));
    }
    if len < FULL_NAME_MIN {
        return Err(rule(
            "length",
            format!("Full name must be at least {FULL_NAME_MIN} characters"),
        ));
    }
    if len > FULL_NAME_MAX {
        return Err(rule(
            "length",
            format!("Full name must be {FULL_NAME_MAX} characters or less"),
        ));
    }
    Ok(())
}

fn validate_email_address(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(rule("required", "Email is required"));
    }
    if !value.validate_email() {
        return Err(rule("email", "Invalid email address"));
    }
    if value.chars().count() > EMAIL_MAX {
        return Err(rule(
            "length",
            format!("Email must be {EMAIL_MAX} characters or less"),
        ));
    }
    Ok(())
}

/// First failure message among `fields`, checked in the given order.
pub fn first_message(errors: &ValidationErrors, fields: &[&str]) -> Option<String> {
    let by_field = errors.field_errors();
    fields.iter().find_map(|field| {
        by_field.get(*field).and_then(|list| {
            list.first().map(|err| {
                err.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {field}"))
            })
        })
    })
}

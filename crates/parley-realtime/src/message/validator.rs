//! Inbound frame validation.

use parley_core::error::AppError;

use super::types::InboundEvent;

/// Check size limits and parse an inbound text frame.
pub fn parse_inbound(raw: &str, max_bytes: usize) -> Result<InboundEvent, AppError> {
    if raw.len() > max_bytes {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {max_bytes} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    serde_json::from_str(raw)
        .map_err(|e| AppError::validation(format!("Failed to parse message: {e}")))
}

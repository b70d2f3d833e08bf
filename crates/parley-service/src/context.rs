//! Request context carrying the authenticated user.

use chrono::{DateTime, Utc};

use parley_core::types::id::UserId;

/// Context for the current authenticated request.
///
/// Built by the API layer once the session token is verified and passed
/// into service methods so that every operation knows who is acting.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            request_time: Utc::now(),
        }
    }
}

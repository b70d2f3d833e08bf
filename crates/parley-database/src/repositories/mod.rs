//! Repository implementations for Parley entities.

pub mod message;
pub mod user;

pub use message::MessageRepository;
pub use user::UserRepository;

use parley_core::error::{AppError, ErrorKind};
use tracing::warn;

/// Map a query failure, reporting pool exhaustion as a retryable condition.
pub(crate) fn query_error(context: &'static str, err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            warn!(error = %err, context, "Database pool unavailable");
            AppError::service_unavailable("Database is temporarily unavailable")
        }
        other => AppError::with_source(ErrorKind::Database, context, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_service_unavailable() {
        let err = query_error("Failed to list users", sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn test_other_failures_keep_context() {
        let err = query_error("Failed to list users", sqlx::Error::RowNotFound);
        assert_eq!(err.kind, ErrorKind::Database);
        assert_eq!(err.message, "Failed to list users");
        assert!(err.source.is_some());
    }
}

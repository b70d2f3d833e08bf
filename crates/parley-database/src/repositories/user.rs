//! User repository implementation.

use sqlx::PgPool;

use parley_core::error::AppError;
use parley_core::result::AppResult;
use parley_core::types::id::UserId;
use parley_entity::user::{CreateUser, User};

use super::query_error;

/// Repository for user account queries.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("Failed to find user by id", e))
    }

    /// Find a user by (already lowercased) email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("Failed to find user by email", e))
    }

    /// Every user except `exclude`, newest first.
    pub async fn list_except(&self, exclude: UserId) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id <> $1 ORDER BY created_at DESC",
        )
        .bind(exclude)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("Failed to list users", e))
    }

    /// Insert a new user.
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, full_name, email, password_hash, profile_picture) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(UserId::new())
        .bind(&data.full_name)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.profile_picture)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("users_email_key") => {
                AppError::conflict("Email is already taken")
            }
            _ => query_error("Failed to create user", e),
        })
    }

    /// Replace a user's avatar URL.
    pub async fn update_profile_picture(&self, id: UserId, url: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET profile_picture = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("Failed to update profile picture", e))?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }
}

//! API bearer tokens (`user_session` table).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use furnish_core::UserId;

use super::RepositoryError;

/// Repository for API session tokens.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a newly issued token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_session (user_id, session_token, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id.as_i32())
        .bind(token)
        .bind(expires_at)
        .execute(self.pool)
        .await
        .map_err(RepositoryError::from_unique)?;
        Ok(())
    }

    /// The user owning an unexpired token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_user(&self, token: &str) -> Result<Option<UserId>, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT user_id FROM user_session WHERE session_token = $1 AND expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id,)| UserId::new(id)))
    }

    /// Revoke a token. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn delete(&self, token: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM user_session WHERE session_token = $1")
            .bind(token)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove expired tokens. Returns how many were deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM user_session WHERE expires_at <= NOW()")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

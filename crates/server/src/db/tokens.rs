//! API token storage.
//!
//! Tokens are opaque 40-character hex keys sent as `Authorization: Token <key>`.

use sqlx::PgPool;

use foodgram_core::UserId;

use super::{RepositoryError, map_unique_violation};

/// Repository for API tokens.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a freshly generated token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the key is already in use.
    pub async fn create(&self, key: &str, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO auth_tokens (key, user_id) VALUES ($1, $2)")
            .bind(key)
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| map_unique_violation(e, |_| "token already exists".to_owned()))?;
        Ok(())
    }

    /// Resolve a token to the user it belongs to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn user_for(&self, key: &str) -> Result<Option<UserId>, RepositoryError> {
        let row: Option<(UserId,)> =
            sqlx::query_as("SELECT user_id FROM auth_tokens WHERE key = $1")
                .bind(key)
                .fetch_optional(self.pool)
                .await?;
        Ok(row.map(|r| r.0))
    }

    /// Delete a token.
    ///
    /// # Returns
    ///
    /// Returns `true` if the token existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, key: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE key = $1")
            .bind(key)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

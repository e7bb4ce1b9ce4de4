//! Subscriptions between users.

use std::collections::BTreeSet;

use sqlx::PgPool;

use foodgram_core::UserId;

use super::{RepositoryError, map_unique_violation};

pub struct FollowRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FollowRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Subscribe `user` to `following`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the subscription already exists.
    pub async fn follow(&self, user: UserId, following: UserId) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO follows (user_id, following_id) VALUES ($1, $2)")
            .bind(user)
            .bind(following)
            .execute(self.pool)
            .await
            .map_err(|e| map_unique_violation(e, |_| "already subscribed".to_owned()))?;
        Ok(())
    }

    /// # Returns
    ///
    /// Returns `true` if the subscription existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unfollow(&self, user: UserId, following: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND following_id = $2")
            .bind(user)
            .bind(following)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Which of `candidates` `user` is subscribed to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn followed_among(
        &self,
        user: UserId,
        candidates: &[UserId],
    ) -> Result<BTreeSet<UserId>, RepositoryError> {
        let raw: Vec<i32> = candidates.iter().map(UserId::as_i32).collect();
        let rows: Vec<(UserId,)> = sqlx::query_as(
            "SELECT following_id FROM follows WHERE user_id = $1 AND following_id = ANY($2)",
        )
        .bind(user)
        .bind(raw)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// One page of the users `user` follows, ordered by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn following(
        &self,
        user: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserId>, RepositoryError> {
        let rows: Vec<(UserId,)> = sqlx::query_as(
            r"
            SELECT u.id
            FROM follows f
            JOIN users u ON u.id = f.following_id
            WHERE f.user_id = $1
            ORDER BY u.email
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_following(&self, user: UserId) -> Result<i64, RepositoryError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE user_id = $1")
            .bind(user)
            .fetch_one(self.pool)
            .await?;
        Ok(row.0)
    }
}

//! Ingredient repository.
//!
//! Search matches names case-insensitively by prefix first. When the prefix
//! finds nothing, the query falls back to a substring match so that typing
//! "соль" still finds "морская соль".

use std::collections::BTreeSet;

use sqlx::PgPool;

use foodgram_core::IngredientId;

use super::{RepositoryError, escape_like};
use crate::models::Ingredient;

pub struct IngredientRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> IngredientRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Ingredients matching `name`, or all ingredients when `name` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, name: Option<&str>) -> Result<Vec<Ingredient>, RepositoryError> {
        let Some(query) = name.map(str::trim).filter(|q| !q.is_empty()) else {
            return self.matching("%").await;
        };

        let escaped = escape_like(&query.to_lowercase());
        let by_prefix = self.matching(&format!("{escaped}%")).await?;
        if !by_prefix.is_empty() {
            return Ok(by_prefix);
        }
        self.matching(&format!("%{escaped}%")).await
    }

    async fn matching(&self, pattern: &str) -> Result<Vec<Ingredient>, RepositoryError> {
        let rows = sqlx::query_as::<_, Ingredient>(
            r"
            SELECT id, name, measurement_unit
            FROM ingredients
            WHERE lower(name) LIKE $1
            ORDER BY name
            ",
        )
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: IngredientId) -> Result<Option<Ingredient>, RepositoryError> {
        let row = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// The subset of `ids` that refer to existing ingredients.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn existing(
        &self,
        ids: &[IngredientId],
    ) -> Result<BTreeSet<IngredientId>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(IngredientId::as_i32).collect();
        let rows: Vec<(IngredientId,)> =
            sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
                .bind(raw)
                .fetch_all(self.pool)
                .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Insert an ingredient unless one with the same name exists.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert_if_absent(
        &self,
        name: &str,
        measurement_unit: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO ingredients (name, measurement_unit)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            ",
        )
        .bind(name)
        .bind(measurement_unit)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

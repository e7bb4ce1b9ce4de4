//! Tag repository.

use std::collections::BTreeSet;

use sqlx::PgPool;

use foodgram_core::{RecipeId, TagId};

use super::RepositoryError;
use crate::models::Tag;

pub struct TagRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TagRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All tags ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Tag>, RepositoryError> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(tags)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: TagId) -> Result<Option<Tag>, RepositoryError> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(tag)
    }

    /// The subset of `ids` that refer to existing tags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn existing(&self, ids: &[TagId]) -> Result<BTreeSet<TagId>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(TagId::as_i32).collect();
        let rows: Vec<(TagId,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
            .bind(raw)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Tags of each recipe in `recipes`, ordered by tag name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_recipes(
        &self,
        recipes: &[RecipeId],
    ) -> Result<Vec<(RecipeId, Tag)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            recipe_id: RecipeId,
            #[sqlx(flatten)]
            tag: Tag,
        }

        let raw: Vec<i32> = recipes.iter().map(RecipeId::as_i32).collect();
        let rows: Vec<Row> = sqlx::query_as(
            r"
            SELECT rt.recipe_id, t.id, t.name, t.slug
            FROM recipe_tags rt
            JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id = ANY($1)
            ORDER BY t.name
            ",
        )
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| (r.recipe_id, r.tag)).collect())
    }

    /// Insert a tag unless one with the same name or slug exists.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, including when
    /// the slug violates the allowed character set.
    pub async fn insert_if_absent(&self, name: &str, slug: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO tags (name, slug) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(name)
        .bind(slug)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

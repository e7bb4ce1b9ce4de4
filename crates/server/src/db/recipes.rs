//! Recipe repository.
//!
//! Recipes are written together with their tag and ingredient relations in a
//! single transaction. Updates compute a [`CompositionDiff`] against the
//! stored relations and apply it while holding a row lock on the recipe, so a
//! concurrent reader sees either the old relation set or the new one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use foodgram_core::composition::{CompositionDiff, IngredientAmount, RecipeComposition};
use foodgram_core::{Amount, CookingTime, IngredientId, RecipeId, TagId, UserId};

use super::RepositoryError;
use crate::models::recipe::RecipeFields;
use crate::models::{Recipe, RecipeIngredient};

/// Number of random short links tried before giving up.
const SHORT_LINK_ATTEMPTS: usize = 5;

/// Length of a short link code, in hex characters.
pub const SHORT_LINK_LENGTH: usize = 6;

const RECIPE_COLUMNS: &str =
    "r.id, r.author_id, r.name, r.text, r.image, r.cooking_time, r.short_link, r.created_at";

/// Internal row type for recipe queries.
#[derive(Debug, sqlx::FromRow)]
struct RecipeRow {
    id: RecipeId,
    author_id: UserId,
    name: String,
    text: String,
    image: String,
    cooking_time: i32,
    short_link: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = RepositoryError;

    fn try_from(row: RecipeRow) -> Result<Self, Self::Error> {
        let cooking_time = CookingTime::new(i64::from(row.cooking_time)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid cooking time in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            author_id: row.author_id,
            name: row.name,
            text: row.text,
            image: row.image,
            cooking_time,
            short_link: row.short_link.trim_end().to_owned(),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecipeIngredientRow {
    recipe_id: RecipeId,
    id: IngredientId,
    name: String,
    measurement_unit: String,
    amount: i32,
}

fn amount_from_db(raw: i32) -> Result<Amount, RepositoryError> {
    Amount::new(i64::from(raw))
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid amount in database: {e}")))
}

/// Filters for the recipe list.
///
/// Every set field narrows the result; tags match if the recipe carries any
/// of the given slugs.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author: Option<UserId>,
    pub tag_slugs: Vec<String>,
    pub favorited_by: Option<UserId>,
    pub in_cart_of: Option<UserId>,
}

const FILTER_CLAUSE: &str = r"
    ($1::int IS NULL OR r.author_id = $1)
    AND (cardinality($2::text[]) = 0 OR EXISTS (
        SELECT 1 FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = r.id AND t.slug = ANY($2)
    ))
    AND ($3::int IS NULL OR EXISTS (
        SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.owner_id = $3
    ))
    AND ($4::int IS NULL OR EXISTS (
        SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.owner_id = $4
    ))
";

/// Random lowercase hex code for a recipe short link.
#[must_use]
pub fn generate_short_link() -> String {
    format!("{:06x}", rand::random::<u32>() & 0x00FF_FFFF)
}

/// Repository for recipe database operations.
pub struct RecipeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RecipeRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a recipe with its relations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if no free short link could be
    /// allocated, or `RepositoryError::Database` if any statement fails.
    pub async fn create(
        &self,
        author: UserId,
        fields: &RecipeFields,
        image: &str,
        composition: &RecipeComposition,
    ) -> Result<Recipe, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut created = None;
        for _ in 0..SHORT_LINK_ATTEMPTS {
            let row: Option<RecipeRow> = sqlx::query_as(&format!(
                r"
                INSERT INTO recipes AS r (author_id, name, text, image, cooking_time, short_link)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (short_link) DO NOTHING
                RETURNING {RECIPE_COLUMNS}
                "
            ))
            .bind(author)
            .bind(&fields.name)
            .bind(&fields.text)
            .bind(image)
            .bind(fields.cooking_time.as_i32())
            .bind(generate_short_link())
            .fetch_optional(&mut *tx)
            .await?;

            if row.is_some() {
                created = row;
                break;
            }
        }
        let recipe = Recipe::try_from(created.ok_or_else(|| {
            RepositoryError::Conflict("could not allocate a unique short link".to_owned())
        })?)?;

        let diff = composition.diff_from(&[], &[]);
        apply_diff(&mut *tx, recipe.id, &diff).await?;

        tx.commit().await?;
        Ok(recipe)
    }

    /// Update a recipe's fields and replace its relations.
    ///
    /// `image` replaces the stored image when set.
    ///
    /// # Returns
    ///
    /// The updated recipe and, if the image was replaced, the previous image path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the recipe does not exist.
    pub async fn update(
        &self,
        id: RecipeId,
        fields: &RecipeFields,
        image: Option<&str>,
        composition: &RecipeComposition,
    ) -> Result<(Recipe, Option<String>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<(String,)> =
            sqlx::query_as("SELECT image FROM recipes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (previous_image,) = previous.ok_or(RepositoryError::NotFound)?;

        let row: RecipeRow = sqlx::query_as(&format!(
            r"
            UPDATE recipes AS r
            SET name = $2, text = $3, cooking_time = $4, image = COALESCE($5, r.image)
            WHERE r.id = $1
            RETURNING {RECIPE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.text)
        .bind(fields.cooking_time.as_i32())
        .bind(image)
        .fetch_one(&mut *tx)
        .await?;
        let recipe = Recipe::try_from(row)?;

        let current_tags: Vec<(TagId,)> =
            sqlx::query_as("SELECT tag_id FROM recipe_tags WHERE recipe_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        let current_tags: Vec<TagId> = current_tags.into_iter().map(|r| r.0).collect();

        let current_rows: Vec<(IngredientId, i32)> = sqlx::query_as(
            "SELECT ingredient_id, amount FROM recipe_ingredients WHERE recipe_id = $1 ORDER BY position, id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        let current_ingredients = current_rows
            .into_iter()
            .map(|(ingredient, amount)| {
                amount_from_db(amount).map(|amount| IngredientAmount::new(ingredient, amount))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let diff = composition.diff_from(&current_tags, &current_ingredients);
        if !diff.is_empty() {
            tracing::debug!(
                recipe_id = %id,
                tags_removed = diff.tags_to_remove.len(),
                tags_added = diff.tags_to_add.len(),
                ingredients_removed = diff.ingredients_to_remove.len(),
                ingredients_upserted = diff.ingredients_to_upsert.len(),
                "Applying recipe relation diff"
            );
            apply_diff(&mut *tx, id, &diff).await?;
        }

        tx.commit().await?;

        let replaced = image.is_some().then_some(previous_image);
        Ok((recipe, replaced))
    }

    /// Delete a recipe, returning its image path if it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: RecipeId) -> Result<Option<String>, RepositoryError> {
        let row: Option<(String,)> = sqlx::query_as("DELETE FROM recipes WHERE id = $1 RETURNING image")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: RecipeId) -> Result<Option<Recipe>, RepositoryError> {
        let row: Option<RecipeRow> =
            sqlx::query_as(&format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        row.map(Recipe::try_from).transpose()
    }

    /// Resolve a short link code to its recipe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn id_by_short_link(&self, code: &str) -> Result<Option<RecipeId>, RepositoryError> {
        let row: Option<(RecipeId,)> = sqlx::query_as("SELECT id FROM recipes WHERE short_link = $1")
            .bind(code)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// One page of recipes matching `filter`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &RecipeFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Recipe>, RepositoryError> {
        let rows: Vec<RecipeRow> = sqlx::query_as(&format!(
            r"
            SELECT {RECIPE_COLUMNS}
            FROM recipes r
            WHERE {FILTER_CLAUSE}
            ORDER BY r.name, r.id
            LIMIT $5 OFFSET $6
            "
        ))
        .bind(filter.author)
        .bind(&filter.tag_slugs)
        .bind(filter.favorited_by)
        .bind(filter.in_cart_of)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Recipe::try_from).collect()
    }

    /// Number of recipes matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: &RecipeFilter) -> Result<i64, RepositoryError> {
        let row: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM recipes r WHERE {FILTER_CLAUSE}"
        ))
        .bind(filter.author)
        .bind(&filter.tag_slugs)
        .bind(filter.favorited_by)
        .bind(filter.in_cart_of)
        .fetch_one(self.pool)
        .await?;
        Ok(row.0)
    }

    /// Ingredient rows of each recipe in `recipes`, in submitted list order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored amount is out of range.
    pub async fn ingredients_for(
        &self,
        recipes: &[RecipeId],
    ) -> Result<Vec<(RecipeId, RecipeIngredient)>, RepositoryError> {
        let raw: Vec<i32> = recipes.iter().map(RecipeId::as_i32).collect();
        let rows: Vec<RecipeIngredientRow> = sqlx::query_as(
            r"
            SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = ANY($1)
            ORDER BY ri.recipe_id, ri.position, ri.id
            ",
        )
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let amount = amount_from_db(row.amount)?;
                Ok::<_, RepositoryError>((
                    row.recipe_id,
                    RecipeIngredient {
                        id: row.id,
                        name: row.name,
                        measurement_unit: row.measurement_unit,
                        amount,
                    },
                ))
            })
            .collect()
    }

    /// Newest recipes of each author, at most `per_author` each when set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_by_authors(
        &self,
        authors: &[UserId],
        per_author: Option<i64>,
    ) -> Result<Vec<Recipe>, RepositoryError> {
        let raw: Vec<i32> = authors.iter().map(UserId::as_i32).collect();
        let rows: Vec<RecipeRow> = sqlx::query_as(&format!(
            r"
            SELECT {RECIPE_COLUMNS}
            FROM (
                SELECT *, ROW_NUMBER() OVER (PARTITION BY author_id ORDER BY created_at DESC, id DESC) AS rn
                FROM recipes
                WHERE author_id = ANY($1)
            ) r
            WHERE $2::bigint IS NULL OR r.rn <= $2
            ORDER BY r.created_at DESC, r.id DESC
            "
        ))
        .bind(raw)
        .bind(per_author)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Recipe::try_from).collect()
    }

    /// Number of recipes per author in `authors`. Authors without recipes are absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_authors(
        &self,
        authors: &[UserId],
    ) -> Result<HashMap<UserId, i64>, RepositoryError> {
        let raw: Vec<i32> = authors.iter().map(UserId::as_i32).collect();
        let rows: Vec<(UserId, i64)> = sqlx::query_as(
            "SELECT author_id, COUNT(*) FROM recipes WHERE author_id = ANY($1) GROUP BY author_id",
        )
        .bind(raw)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }
}

/// Apply relation changes for one recipe on an open transaction.
async fn apply_diff(
    conn: &mut PgConnection,
    recipe: RecipeId,
    diff: &CompositionDiff,
) -> Result<(), RepositoryError> {
    if !diff.tags_to_remove.is_empty() {
        let ids: Vec<i32> = diff.tags_to_remove.iter().map(TagId::as_i32).collect();
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1 AND tag_id = ANY($2)")
            .bind(recipe)
            .bind(ids)
            .execute(&mut *conn)
            .await?;
    }

    if !diff.tags_to_add.is_empty() {
        let ids: Vec<i32> = diff.tags_to_add.iter().map(TagId::as_i32).collect();
        sqlx::query(
            r"
            INSERT INTO recipe_tags (recipe_id, tag_id)
            SELECT $1, tag_id FROM unnest($2::int[]) AS tag_id
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(recipe)
        .bind(ids)
        .execute(&mut *conn)
        .await?;
    }

    if !diff.ingredients_to_remove.is_empty() {
        let ids: Vec<i32> = diff
            .ingredients_to_remove
            .iter()
            .map(IngredientId::as_i32)
            .collect();
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1 AND ingredient_id = ANY($2)")
            .bind(recipe)
            .bind(ids)
            .execute(&mut *conn)
            .await?;
    }

    if !diff.ingredients_to_upsert.is_empty() {
        let mut ids = Vec::with_capacity(diff.ingredients_to_upsert.len());
        let mut amounts = Vec::with_capacity(diff.ingredients_to_upsert.len());
        let mut positions = Vec::with_capacity(diff.ingredients_to_upsert.len());
        for placed in &diff.ingredients_to_upsert {
            ids.push(placed.item.ingredient.as_i32());
            amounts.push(placed.item.amount.as_i32());
            positions.push(i32::try_from(placed.position).map_err(|_| {
                RepositoryError::Conflict("ingredient list is too long".to_owned())
            })?);
        }
        sqlx::query(
            r"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount, position)
            SELECT $1, u.ingredient_id, u.amount, u.position
            FROM unnest($2::int[], $3::int[], $4::int[]) AS u(ingredient_id, amount, position)
            ON CONFLICT (recipe_id, ingredient_id)
            DO UPDATE SET amount = EXCLUDED.amount, position = EXCLUDED.position
            ",
        )
        .bind(recipe)
        .bind(ids)
        .bind(amounts)
        .bind(positions)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_link_shape() {
        for _ in 0..100 {
            let code = generate_short_link();
            assert_eq!(code.len(), SHORT_LINK_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }
}

//! Favorites and shopping cart.
//!
//! Both lists are sets of `(owner, recipe)` pairs with identical behavior, so
//! one repository serves both, parameterized by [`RecipeList`]. A second add
//! of the same pair, including one racing a concurrent request, is rejected
//! by the table's unique constraint and surfaces as
//! [`RepositoryError::Conflict`].

use std::collections::{BTreeSet, HashMap};

use sqlx::PgPool;

use foodgram_core::shopping_list::{CartRecipe, CartSource, IngredientLine};
use foodgram_core::{RecipeId, UserId};

use super::recipes::RecipeRepository;
use super::{RepositoryError, map_unique_violation};

/// Which per-user recipe list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    const fn table(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::ShoppingCart => "shopping_cart",
        }
    }

    /// Human-readable name used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::ShoppingCart => "shopping cart",
        }
    }
}

pub struct UserRecipeRepository<'a> {
    pool: &'a PgPool,
    list: RecipeList,
}

impl<'a> UserRecipeRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, list: RecipeList) -> Self {
        Self { pool, list }
    }

    /// Add `recipe` to `owner`'s list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the recipe is already in the list.
    pub async fn add(&self, owner: UserId, recipe: RecipeId) -> Result<(), RepositoryError> {
        let list = self.list;
        sqlx::query(&format!(
            "INSERT INTO {} (owner_id, recipe_id) VALUES ($1, $2)",
            list.table()
        ))
        .bind(owner)
        .bind(recipe)
        .execute(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, |_| format!("recipe is already in {}", list.label())))?;
        Ok(())
    }

    /// Remove `recipe` from `owner`'s list.
    ///
    /// # Returns
    ///
    /// Returns `true` if the recipe was in the list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, owner: UserId, recipe: RecipeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE owner_id = $1 AND recipe_id = $2",
            self.list.table()
        ))
        .bind(owner)
        .bind(recipe)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Which of `recipes` are in `owner`'s list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contained(
        &self,
        owner: UserId,
        recipes: &[RecipeId],
    ) -> Result<BTreeSet<RecipeId>, RepositoryError> {
        let raw: Vec<i32> = recipes.iter().map(RecipeId::as_i32).collect();
        let rows: Vec<(RecipeId,)> = sqlx::query_as(&format!(
            "SELECT recipe_id FROM {} WHERE owner_id = $1 AND recipe_id = ANY($2)",
            self.list.table()
        ))
        .bind(owner)
        .bind(raw)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}

/// Shopping cart contents for the shopping list download.
pub struct ShoppingCartSource<'a> {
    pool: &'a PgPool,
}

impl<'a> ShoppingCartSource<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CartSource for ShoppingCartSource<'_> {
    type Error = RepositoryError;

    async fn load_cart_entries(&self, owner: UserId) -> Result<Vec<CartRecipe>, RepositoryError> {
        let rows: Vec<(RecipeId, String)> = sqlx::query_as(
            r"
            SELECT r.id, r.name
            FROM shopping_cart c
            JOIN recipes r ON r.id = c.recipe_id
            WHERE c.owner_id = $1
            ORDER BY c.id
            ",
        )
        .bind(owner)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(recipe_id, name)| CartRecipe { recipe_id, name })
            .collect())
    }

    async fn load_recipe_ingredients(
        &self,
        recipes: &[RecipeId],
    ) -> Result<HashMap<RecipeId, Vec<IngredientLine>>, RepositoryError> {
        let rows = RecipeRepository::new(self.pool).ingredients_for(recipes).await?;

        let mut lines: HashMap<RecipeId, Vec<IngredientLine>> = HashMap::new();
        for (recipe, row) in rows {
            lines.entry(recipe).or_default().push(row.into());
        }
        Ok(lines)
    }
}

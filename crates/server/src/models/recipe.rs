//! Recipe models.

use chrono::{DateTime, Utc};
use foodgram_core::shopping_list::IngredientLine;
use foodgram_core::{Amount, CookingTime, IngredientId, RecipeId, UserId};
use serde::Serialize;

/// A stored recipe without its relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: RecipeId,
    pub author_id: UserId,
    pub name: String,
    pub text: String,
    /// Path of the image relative to the media root.
    pub image: String,
    pub cooking_time: CookingTime,
    pub short_link: String,
    pub created_at: DateTime<Utc>,
}

/// One ingredient row of a recipe, joined with the ingredient itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeIngredient {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
    pub amount: Amount,
}

impl From<RecipeIngredient> for IngredientLine {
    fn from(row: RecipeIngredient) -> Self {
        Self::new(row.name, row.amount.get(), row.measurement_unit)
    }
}

/// Fields a recipe write sets besides its relations.
#[derive(Debug, Clone)]
pub struct RecipeFields {
    pub name: String,
    pub text: String,
    pub cooking_time: CookingTime,
}

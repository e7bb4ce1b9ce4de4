//! Reference data: tags and ingredients.

use foodgram_core::{IngredientId, TagId};
use serde::Serialize;

/// A recipe tag such as "Breakfast".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub slug: String,
}

/// An ingredient with its measurement unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}

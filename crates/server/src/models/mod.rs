//! Domain models backed by the database.

pub mod catalog;
pub mod recipe;
pub mod user;

pub use catalog::{Ingredient, Tag};
pub use recipe::{Recipe, RecipeIngredient};
pub use user::User;

//! Read-only ingredient endpoints with name search.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use foodgram_core::IngredientId;

use crate::db::ingredients::IngredientRepository;
use crate::error::{AppError, Result};
use crate::models::Ingredient;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
}

/// Ingredients, optionally filtered by name.
///
/// GET /api/ingredients/?name=<query>
///
/// Names starting with the query come first; when none do, names containing
/// it are returned instead. Matching ignores case.
#[instrument(skip_all, fields(name = ?params.name))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Ingredient>>> {
    let ingredients = IngredientRepository::new(state.pool())
        .search(params.name.as_deref())
        .await?;
    Ok(Json(ingredients))
}

/// GET /api/ingredients/{id}/
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<IngredientId>,
) -> Result<Json<Ingredient>> {
    IngredientRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("ingredient not found".to_owned()))
}

//! Read-only tag endpoints.

use axum::{
    Json,
    extract::{Path, State},
};

use foodgram_core::TagId;

use crate::db::tags::TagRepository;
use crate::error::{AppError, Result};
use crate::models::Tag;
use crate::state::AppState;

/// All tags, ordered by name.
///
/// GET /api/tags/
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Tag>>> {
    Ok(Json(TagRepository::new(state.pool()).list().await?))
}

/// GET /api/tags/{id}/
pub async fn show(State(state): State<AppState>, Path(id): Path<TagId>) -> Result<Json<Tag>> {
    TagRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("tag not found".to_owned()))
}

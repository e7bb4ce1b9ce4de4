//! Short link redirects.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

use crate::db::recipes::{RecipeRepository, SHORT_LINK_LENGTH};
use crate::error::{AppError, Result};
use crate::state::AppState;

fn is_short_link(code: &str) -> bool {
    code.len() == SHORT_LINK_LENGTH
        && code
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Redirect a short link to the recipe page.
///
/// GET /s/{code}/
pub async fn redirect(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response> {
    let not_found = || AppError::NotFound("short link not found".to_owned());

    let code = code.to_ascii_lowercase();
    if !is_short_link(&code) {
        return Err(not_found());
    }

    let id = RecipeRepository::new(state.pool())
        .id_by_short_link(&code)
        .await?
        .ok_or_else(not_found)?;

    Ok((StatusCode::FOUND, [(LOCATION, format!("/recipes/{id}/"))]).into_response())
}

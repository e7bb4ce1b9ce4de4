//! Token login and logout.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::json_body;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, token_from_headers};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

/// Issue a token for valid credentials.
///
/// POST /api/auth/token/login/
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>> {
    let form = json_body(body)?;
    let auth_token = AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await?;

    Ok(Json(TokenResponse { auth_token }))
}

/// Revoke the token the request was made with.
///
/// POST /api/auth/token/logout/
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let key = token_from_headers(&headers).ok_or_else(|| {
        AppError::Unauthorized("Authentication credentials were not provided".into())
    })?;
    AuthService::new(state.pool()).logout(key).await?;

    tracing::info!(user_id = %user.id, "Token revoked");
    Ok(StatusCode::NO_CONTENT)
}

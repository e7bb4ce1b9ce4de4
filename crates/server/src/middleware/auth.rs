//! Token authentication extractors.
//!
//! Clients authenticate with `Authorization: Token <key>`, where the key was
//! issued by `POST /api/auth/token/login/`.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

const TOKEN_SCHEME: &str = "Token";

/// Extract the token key from the `Authorization` header, if present.
#[must_use]
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, key) = value.trim().split_once(' ')?;
    let key = key.trim();
    (scheme.eq_ignore_ascii_case(TOKEN_SCHEME) && !key.is_empty()).then_some(key)
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(key) = token_from_headers(&parts.headers) else {
        return Ok(None);
    };

    let user = AuthService::new(state.pool()).authenticate(key).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::Span::current().record("user_id", tracing::field::display(user.id));

    Ok(Some(user))
}

/// Extractor that requires an authenticated user.
///
/// Rejects with 401 when the header is missing or the token is unknown.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     Json(user.username)
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await?.map(Self).ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided".to_owned())
        })
    }
}

/// Extractor that optionally gets the current user.
///
/// Anonymous requests get `None`. A header carrying an unknown token is still
/// rejected with 401 rather than silently treated as anonymous.
pub struct OptionalAuth(pub Option<User>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve(parts, state).await?))
    }
}

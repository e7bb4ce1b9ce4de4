//! User accounts, avatars and subscriptions.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{OriginalUri, Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use foodgram_core::UserId;

use super::json_body;
use super::pagination::{Page, Pagination, lookup, query_pairs};
use super::recipes::ShortRecipeView;
use crate::config::ServerConfig;
use crate::db::follows::FollowRepository;
use crate::db::recipes::RecipeRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::User;
use crate::services::auth::{AuthService, Registration};
use crate::services::media::{MediaKind, parse_data_uri};
use crate::state::AppState;

// =============================================================================
// Representations
// =============================================================================

/// A user as shown to other users.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub email: String,
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserView {
    #[must_use]
    pub fn new(user: &User, is_subscribed: bool, config: &ServerConfig) -> Self {
        Self {
            email: user.email.as_str().to_owned(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
            avatar: user.avatar.as_deref().map(|path| config.media_url(path)),
        }
    }
}

/// Response to a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub email: String,
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// A followed author with a preview of their recipes.
#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub user: UserView,
    pub recipes: Vec<ShortRecipeView>,
    pub recipes_count: i64,
}

/// Build views of `users` as seen by `viewer`.
///
/// # Errors
///
/// Returns `AppError::Database` if the subscription lookup fails.
pub async fn user_views(
    state: &AppState,
    viewer: Option<&User>,
    users: &[User],
) -> Result<Vec<UserView>> {
    let followed = match viewer {
        Some(viewer) => {
            let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
            FollowRepository::new(state.pool())
                .followed_among(viewer.id, &ids)
                .await?
        }
        None => Default::default(),
    };

    Ok(users
        .iter()
        .map(|user| UserView::new(user, followed.contains(&user.id), state.config()))
        .collect())
}

/// Build subscription views for `authors` followed by `viewer`.
async fn subscription_views(
    state: &AppState,
    viewer: &User,
    authors: &[User],
    recipes_limit: Option<i64>,
) -> Result<Vec<SubscriptionView>> {
    let ids: Vec<UserId> = authors.iter().map(|u| u.id).collect();
    let recipes = RecipeRepository::new(state.pool());

    let mut latest: HashMap<UserId, Vec<ShortRecipeView>> = HashMap::new();
    for recipe in recipes.latest_by_authors(&ids, recipes_limit).await? {
        latest
            .entry(recipe.author_id)
            .or_default()
            .push(ShortRecipeView::new(&recipe, state.config()));
    }
    let counts = recipes.count_by_authors(&ids).await?;

    let views = user_views(state, Some(viewer), authors).await?;
    Ok(views
        .into_iter()
        .map(|user| SubscriptionView {
            recipes: latest.remove(&user.id).unwrap_or_default(),
            recipes_count: counts.get(&user.id).copied().unwrap_or(0),
            user,
        })
        .collect())
}

/// Parse the optional `recipes_limit` query parameter.
fn recipes_limit(pairs: &[(String, String)]) -> Result<Option<i64>> {
    lookup(pairs, "recipes_limit")
        .map(|raw| {
            raw.parse::<i64>().ok().filter(|n| *n >= 0).ok_or_else(|| {
                AppError::Validation(FieldErrors::single(
                    "recipes_limit",
                    "a valid non-negative integer is required",
                ))
            })
        })
        .transpose()
}

async fn load_user(state: &AppState, id: UserId) -> Result<User> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_owned()))
}

// =============================================================================
// Accounts
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
}

/// Register a new user.
///
/// POST /api/users/
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredUser>)> {
    let form = json_body(body)?;
    let user = AuthService::new(state.pool())
        .register(&Registration {
            email: &form.email,
            username: &form.username,
            first_name: &form.first_name,
            last_name: &form.last_name,
            password: &form.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredUser {
            email: user.email.into_inner(),
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }),
    ))
}

/// List users.
///
/// GET /api/users/
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Page<UserView>>> {
    let pagination = Pagination::from_uri(&state.config().base_url, &uri)?;
    let users = UserRepository::new(state.pool());

    let count = users.count().await?;
    pagination.ensure_in_range(count)?;
    let page = users.list(pagination.limit(), pagination.offset()).await?;

    let views = user_views(&state, viewer.as_ref(), &page).await?;
    Ok(Json(pagination.page(count, views)))
}

/// Show one user.
///
/// GET /api/users/{id}/
#[instrument(skip_all, fields(id = %id))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Path(id): Path<UserId>,
) -> Result<Json<UserView>> {
    let user = load_user(&state, id).await?;
    let mut views = user_views(&state, viewer.as_ref(), std::slice::from_ref(&user)).await?;
    views
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("user view missing".to_owned()))
}

/// The current user.
///
/// GET /api/users/me/
pub async fn me(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Json<UserView> {
    Json(UserView::new(&user, false, state.config()))
}

/// Password change request body.
#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub current_password: String,
}

/// Change the current user's password.
///
/// POST /api/users/set_password/
#[instrument(skip_all)]
pub async fn set_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<SetPasswordRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let form = json_body(body)?;
    AuthService::new(state.pool())
        .set_password(&user, &form.current_password, &form.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Avatar
// =============================================================================

/// Avatar upload request body.
#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub avatar: String,
}

/// Upload or replace the current user's avatar.
///
/// PUT /api/users/me/avatar/
#[instrument(skip_all)]
pub async fn set_avatar(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<AvatarRequest>, JsonRejection>,
) -> Result<Json<AvatarResponse>> {
    let form = json_body(body)?;
    let raw = form
        .avatar
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| FieldErrors::single("avatar", "this field is required"))?;
    let image = parse_data_uri(&raw).map_err(|e| FieldErrors::single("avatar", e))?;

    let path = state.media().save(MediaKind::Avatar, &image).await?;
    let previous = match UserRepository::new(state.pool())
        .set_avatar(user.id, Some(&path))
        .await
    {
        Ok(previous) => previous,
        Err(e) => {
            state.media().delete(&path).await;
            return Err(e.into());
        }
    };
    if let Some(previous) = previous {
        state.media().delete(&previous).await;
    }

    tracing::info!(user_id = %user.id, "Avatar updated");
    Ok(Json(AvatarResponse {
        avatar: state.config().media_url(&path),
    }))
}

/// Remove the current user's avatar.
///
/// DELETE /api/users/me/avatar/
#[instrument(skip_all)]
pub async fn delete_avatar(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<StatusCode> {
    let previous = UserRepository::new(state.pool())
        .set_avatar(user.id, None)
        .await?;
    if let Some(previous) = previous {
        state.media().delete(&previous).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Subscriptions
// =============================================================================

/// Authors the current user follows.
///
/// GET /api/users/subscriptions/
#[instrument(skip_all)]
pub async fn subscriptions(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Page<SubscriptionView>>> {
    let pagination = Pagination::from_uri(&state.config().base_url, &uri)?;
    let limit = recipes_limit(pagination.query())?;
    let follows = FollowRepository::new(state.pool());

    let count = follows.count_following(user.id).await?;
    pagination.ensure_in_range(count)?;
    let ids = follows
        .following(user.id, pagination.limit(), pagination.offset())
        .await?;

    // get_many returns rows unordered; keep the email order of `ids`
    let mut by_id: HashMap<UserId, User> = UserRepository::new(state.pool())
        .get_many(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let authors: Vec<User> = ids.iter().filter_map(|id| by_id.remove(id)).collect();

    let views = subscription_views(&state, &user, &authors, limit).await?;
    Ok(Json(pagination.page(count, views)))
}

/// Follow an author.
///
/// POST /api/users/{id}/subscribe/
#[instrument(skip_all, fields(id = %id))]
pub async fn subscribe(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<UserId>,
    OriginalUri(uri): OriginalUri,
) -> Result<(StatusCode, Json<SubscriptionView>)> {
    let limit = recipes_limit(&query_pairs(&uri))?;
    let author = load_user(&state, id).await?;
    if author.id == user.id {
        return Err(AppError::BadRequest(
            "you cannot subscribe to yourself".to_owned(),
        ));
    }

    FollowRepository::new(state.pool())
        .follow(user.id, author.id)
        .await?;
    tracing::info!(user_id = %user.id, following_id = %author.id, "Subscribed");

    let view = subscription_views(&state, &user, std::slice::from_ref(&author), limit)
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("subscription view missing".to_owned()))?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Unfollow an author.
///
/// DELETE /api/users/{id}/subscribe/
#[instrument(skip_all, fields(id = %id))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    let author = load_user(&state, id).await?;
    let removed = FollowRepository::new(state.pool())
        .unfollow(user.id, author.id)
        .await?;
    if !removed {
        return Err(AppError::BadRequest(
            "you are not subscribed to this user".to_owned(),
        ));
    }

    tracing::info!(user_id = %user.id, following_id = %author.id, "Unsubscribed");
    Ok(StatusCode::NO_CONTENT)
}

//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/auth/token/login/                 - Issue a token (rate limited)
//! POST   /api/auth/token/logout/                - Revoke the current token
//!
//! # Users
//! GET    /api/users/                            - User list (paginated)
//! POST   /api/users/                            - Register
//! GET    /api/users/{id}/                       - User detail
//! GET    /api/users/me/                         - Current user
//! PUT    /api/users/me/avatar/                  - Upload avatar
//! DELETE /api/users/me/avatar/                  - Remove avatar
//! POST   /api/users/set_password/               - Change password
//! GET    /api/users/subscriptions/              - Followed authors (paginated)
//! POST   /api/users/{id}/subscribe/             - Follow
//! DELETE /api/users/{id}/subscribe/             - Unfollow
//!
//! # Reference data
//! GET    /api/tags/, /api/tags/{id}/
//! GET    /api/ingredients/?name=, /api/ingredients/{id}/
//!
//! # Recipes
//! GET    /api/recipes/                          - Recipe list (paginated, filtered)
//! POST   /api/recipes/                          - Create
//! GET    /api/recipes/{id}/                     - Detail
//! PATCH  /api/recipes/{id}/                     - Update (author only)
//! DELETE /api/recipes/{id}/                     - Delete (author only)
//! GET    /api/recipes/{id}/get-link/            - Short link
//! POST   /api/recipes/{id}/favorite/            - Add to favorites
//! DELETE /api/recipes/{id}/favorite/            - Remove from favorites
//! POST   /api/recipes/{id}/shopping_cart/       - Add to shopping cart
//! DELETE /api/recipes/{id}/shopping_cart/       - Remove from shopping cart
//! GET    /api/recipes/download_shopping_cart/   - Shopping list as text
//!
//! # Short links
//! GET    /s/{code}/                             - Redirect to the recipe page
//! ```

pub mod auth;
pub mod ingredients;
pub mod pagination;
pub mod recipes;
pub mod short_link;
pub mod tags;
pub mod users;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Unwrap a JSON body, turning extractor rejections into a JSON 400.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Handler for methods a resource deliberately doesn't support.
pub(crate) async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/auth/token/login/",
            post(auth::login).layer(login_rate_limiter()),
        )
        .route("/api/auth/token/logout/", post(auth::logout))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/", get(users::index).post(users::register))
        .route("/api/users/me/", get(users::me))
        .route(
            "/api/users/me/avatar/",
            put(users::set_avatar).delete(users::delete_avatar),
        )
        .route("/api/users/set_password/", post(users::set_password))
        .route("/api/users/subscriptions/", get(users::subscriptions))
        .route("/api/users/{id}/", get(users::show))
        .route(
            "/api/users/{id}/subscribe/",
            post(users::subscribe).delete(users::unsubscribe),
        )
}

/// Create the reference data routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tags/", get(tags::index))
        .route("/api/tags/{id}/", get(tags::show))
        .route("/api/ingredients/", get(ingredients::index))
        .route("/api/ingredients/{id}/", get(ingredients::show))
}

/// Create the recipe routes router.
pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/api/recipes/", get(recipes::index).post(recipes::create))
        .route(
            "/api/recipes/download_shopping_cart/",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/api/recipes/{id}/",
            get(recipes::show)
                .patch(recipes::update)
                .put(method_not_allowed)
                .delete(recipes::destroy),
        )
        .route("/api/recipes/{id}/get-link/", get(recipes::get_link))
        .route(
            "/api/recipes/{id}/favorite/",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/api/recipes/{id}/shopping_cart/",
            post(recipes::add_to_cart).delete(recipes::remove_from_cart),
        )
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(catalog_routes())
        .merge(recipe_routes())
        // Short links are shared without the trailing slash too
        .route("/s/{code}", get(short_link::redirect))
        .route("/s/{code}/", get(short_link::redirect))
}

//! Recipes, favorites, shopping cart and the shopping list download.
//!
//! Writes are validated in three stages, reported as field-keyed errors:
//!
//! 1. Field checks: presence, lengths, ranges, image decoding
//! 2. Composition rules from [`foodgram_core::composition::validate`]
//! 3. Existence of the referenced tags and ingredients

use std::collections::{BTreeSet, HashMap};

use axum::{
    Json,
    extract::{OriginalUri, Path, State, rejection::JsonRejection},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use foodgram_core::composition::{self, IngredientAmount, RecipeComposition};
use foodgram_core::shopping_list::{ShoppingList, build_shopping_list};
use foodgram_core::{Amount, CookingTime, IngredientId, RecipeId, TagId, UserId};

use super::json_body;
use super::pagination::{Page, Pagination, flag};
use super::users::{UserView, user_views};
use crate::config::ServerConfig;
use crate::db::ingredients::IngredientRepository;
use crate::db::recipes::{RecipeFilter, RecipeRepository};
use crate::db::tags::TagRepository;
use crate::db::user_recipes::{RecipeList, ShoppingCartSource, UserRecipeRepository};
use crate::db::users::UserRepository;
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::recipe::RecipeFields;
use crate::models::{Recipe, RecipeIngredient, Tag, User};
use crate::services::media::{DecodedImage, MediaKind, parse_data_uri};
use crate::state::AppState;

/// Maximum recipe name length, in characters.
const MAX_NAME_LENGTH: usize = 256;

/// File name offered for the shopping list download.
const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

// =============================================================================
// Representations
// =============================================================================

/// Compact recipe used in favorites, cart and subscription responses.
#[derive(Debug, Clone, Serialize)]
pub struct ShortRecipeView {
    pub id: RecipeId,
    pub name: String,
    pub image: String,
    pub cooking_time: CookingTime,
}

impl ShortRecipeView {
    #[must_use]
    pub fn new(recipe: &Recipe, config: &ServerConfig) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: config.media_url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Full recipe representation.
#[derive(Debug, Serialize)]
pub struct RecipeView {
    pub id: RecipeId,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: CookingTime,
}

/// Build full views of `recipes` as seen by `viewer`, batching every lookup.
async fn recipe_views(
    state: &AppState,
    viewer: Option<&User>,
    recipes: Vec<Recipe>,
) -> Result<Vec<RecipeView>> {
    let pool = state.pool();
    let ids: Vec<RecipeId> = recipes.iter().map(|r| r.id).collect();

    let mut tags: HashMap<RecipeId, Vec<Tag>> = HashMap::new();
    for (recipe, tag) in TagRepository::new(pool).for_recipes(&ids).await? {
        tags.entry(recipe).or_default().push(tag);
    }

    let mut ingredients: HashMap<RecipeId, Vec<RecipeIngredient>> = HashMap::new();
    for (recipe, row) in RecipeRepository::new(pool).ingredients_for(&ids).await? {
        ingredients.entry(recipe).or_default().push(row);
    }

    let author_ids: Vec<UserId> = recipes
        .iter()
        .map(|r| r.author_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let authors = UserRepository::new(pool).get_many(&author_ids).await?;
    let authors: HashMap<UserId, UserView> = user_views(state, viewer, &authors)
        .await?
        .into_iter()
        .map(|view| (view.id, view))
        .collect();

    let (favorited, in_cart) = match viewer {
        Some(viewer) => (
            UserRecipeRepository::new(pool, RecipeList::Favorites)
                .contained(viewer.id, &ids)
                .await?,
            UserRecipeRepository::new(pool, RecipeList::ShoppingCart)
                .contained(viewer.id, &ids)
                .await?,
        ),
        None => (BTreeSet::new(), BTreeSet::new()),
    };

    recipes
        .into_iter()
        .map(|recipe| -> Result<RecipeView> {
            let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                AppError::Internal(format!("author of recipe {} missing", recipe.id))
            })?;
            Ok(RecipeView {
                id: recipe.id,
                tags: tags.remove(&recipe.id).unwrap_or_default(),
                author,
                ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                image: state.config().media_url(&recipe.image),
                name: recipe.name,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}

async fn recipe_view(
    state: &AppState,
    viewer: Option<&User>,
    recipe: Recipe,
) -> Result<RecipeView> {
    recipe_views(state, viewer, vec![recipe])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("recipe view missing".to_owned()))
}

async fn load_recipe(state: &AppState, id: RecipeId) -> Result<Recipe> {
    RecipeRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("recipe not found".to_owned()))
}

fn ensure_author(recipe: &Recipe, user: &User) -> Result<()> {
    if recipe.author_id == user.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "you do not have permission to modify this recipe".to_owned(),
        ))
    }
}

// =============================================================================
// Write validation
// =============================================================================

/// One ingredient line of a recipe write.
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientInput {
    pub id: IngredientId,
    pub amount: i64,
}

/// Body of recipe create and update requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeRequest {
    pub ingredients: Option<Vec<IngredientInput>>,
    pub tags: Option<Vec<TagId>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
}

/// Whether the request must carry an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePolicy {
    Required,
    Optional,
}

/// A recipe write that passed field checks and composition rules.
#[derive(Debug)]
pub struct ValidatedRecipe {
    pub fields: RecipeFields,
    pub image: Option<DecodedImage>,
    pub composition: RecipeComposition,
}

fn required_text(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    match value.map(|v| v.trim().to_owned()) {
        None => {
            errors.add(field, "this field is required");
            None
        }
        Some(v) if v.is_empty() => {
            errors.add(field, "this field may not be blank");
            None
        }
        Some(v) => Some(v),
    }
}

/// Run field checks and the composition validator on a recipe write.
///
/// Missing `tags` or `ingredients` count as empty lists, so the composition
/// validator reports them.
///
/// # Errors
///
/// Returns `AppError::Validation` keyed by the first failing stage's fields.
pub fn validate_recipe(request: RecipeRequest, image: ImagePolicy) -> Result<ValidatedRecipe> {
    let mut errors = FieldErrors::new();

    let name = required_text(&mut errors, "name", request.name);
    if let Some(name) = &name
        && name.chars().count() > MAX_NAME_LENGTH
    {
        errors.add(
            "name",
            format!("ensure this field has no more than {MAX_NAME_LENGTH} characters"),
        );
    }
    let text = required_text(&mut errors, "text", request.text);

    let cooking_time = match request.cooking_time {
        None => {
            errors.add("cooking_time", "this field is required");
            None
        }
        Some(minutes) => errors.check("cooking_time", CookingTime::new(minutes)),
    };

    let decoded = match request.image.filter(|s| !s.trim().is_empty()) {
        None if image == ImagePolicy::Required => {
            errors.add("image", "this field is required");
            None
        }
        None => None,
        Some(raw) => errors.check("image", parse_data_uri(&raw)),
    };

    let mut ingredients = Vec::new();
    for input in request.ingredients.unwrap_or_default() {
        match Amount::new(input.amount) {
            Ok(amount) => ingredients.push(IngredientAmount::new(input.id, amount)),
            Err(e) => errors.add("ingredients", format!("ingredient {}: {e}", input.id)),
        }
    }

    errors.into_result()?;
    let (Some(name), Some(text), Some(cooking_time)) = (name, text, cooking_time) else {
        return Err(AppError::Internal("validated recipe field missing".to_owned()));
    };

    let composition = composition::validate(request.tags.unwrap_or_default(), ingredients)?;

    Ok(ValidatedRecipe {
        fields: RecipeFields {
            name,
            text,
            cooking_time,
        },
        image: decoded,
        composition,
    })
}

/// Check that every referenced tag and ingredient exists.
async fn ensure_references_exist(state: &AppState, composition: &RecipeComposition) -> Result<()> {
    let mut errors = FieldErrors::new();

    let known_tags = TagRepository::new(state.pool())
        .existing(composition.tags())
        .await?;
    for tag in composition.tags().iter().filter(|t| !known_tags.contains(t)) {
        errors.add("tags", format!("invalid pk \"{tag}\" - object does not exist"));
    }

    let ingredient_ids: Vec<IngredientId> =
        composition.ingredients().iter().map(|i| i.ingredient).collect();
    let known_ingredients = IngredientRepository::new(state.pool())
        .existing(&ingredient_ids)
        .await?;
    for id in ingredient_ids.iter().filter(|i| !known_ingredients.contains(i)) {
        errors.add(
            "ingredients",
            format!("invalid pk \"{id}\" - object does not exist"),
        );
    }

    errors.into_result().map_err(Into::into)
}

// =============================================================================
// Recipe CRUD
// =============================================================================

/// List recipes.
///
/// GET /api/recipes/
///
/// Filters: `author=<id>`, `tags=<slug>` (repeatable), `is_favorited=1`,
/// `is_in_shopping_cart=1`.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Page<RecipeView>>> {
    let pagination = Pagination::from_uri(&state.config().base_url, &uri)?;
    let query = pagination.query();

    let mut filter = RecipeFilter {
        tag_slugs: query
            .iter()
            .filter(|(key, _)| key == "tags")
            .map(|(_, slug)| slug.clone())
            .collect(),
        ..RecipeFilter::default()
    };
    if let Some((_, raw)) = query.iter().find(|(key, _)| key == "author") {
        let author = raw.parse::<i32>().map_err(|_| {
            FieldErrors::single("author", "select a valid choice")
        })?;
        filter.author = Some(UserId::new(author));
    }

    let wants_favorites = flag(query, "is_favorited");
    let wants_cart = flag(query, "is_in_shopping_cart");
    match &viewer {
        Some(viewer) => {
            filter.favorited_by = wants_favorites.then_some(viewer.id);
            filter.in_cart_of = wants_cart.then_some(viewer.id);
        }
        // Anonymous users have no lists
        None if wants_favorites || wants_cart => {
            return Ok(Json(pagination.page(0, Vec::new())));
        }
        None => {}
    }

    let recipes = RecipeRepository::new(state.pool());
    let count = recipes.count(&filter).await?;
    pagination.ensure_in_range(count)?;
    let page = recipes
        .list(&filter, pagination.limit(), pagination.offset())
        .await?;

    let views = recipe_views(&state, viewer.as_ref(), page).await?;
    Ok(Json(pagination.page(count, views)))
}

/// Create a recipe.
///
/// POST /api/recipes/
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<RecipeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeView>)> {
    let validated = validate_recipe(json_body(body)?, ImagePolicy::Required)?;
    ensure_references_exist(&state, &validated.composition).await?;

    let Some(image) = validated.image else {
        return Err(FieldErrors::single("image", "this field is required").into());
    };
    let image_path = state.media().save(MediaKind::RecipeImage, &image).await?;

    let recipe = match RecipeRepository::new(state.pool())
        .create(user.id, &validated.fields, &image_path, &validated.composition)
        .await
    {
        Ok(recipe) => recipe,
        Err(e) => {
            state.media().delete(&image_path).await;
            return Err(e.into());
        }
    };

    tracing::info!(recipe_id = %recipe.id, author_id = %user.id, "Recipe created");
    let view = recipe_view(&state, Some(&user), recipe).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Show one recipe.
///
/// GET /api/recipes/{id}/
#[instrument(skip_all, fields(id = %id))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Path(id): Path<RecipeId>,
) -> Result<Json<RecipeView>> {
    let recipe = load_recipe(&state, id).await?;
    Ok(Json(recipe_view(&state, viewer.as_ref(), recipe).await?))
}

/// Update a recipe. Only its author may do this.
///
/// PATCH /api/recipes/{id}/
#[instrument(skip_all, fields(id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
    body: std::result::Result<Json<RecipeRequest>, JsonRejection>,
) -> Result<Json<RecipeView>> {
    let recipe = load_recipe(&state, id).await?;
    ensure_author(&recipe, &user)?;

    let validated = validate_recipe(json_body(body)?, ImagePolicy::Optional)?;
    ensure_references_exist(&state, &validated.composition).await?;

    let new_image = match &validated.image {
        Some(image) => Some(state.media().save(MediaKind::RecipeImage, image).await?),
        None => None,
    };

    let result = RecipeRepository::new(state.pool())
        .update(
            id,
            &validated.fields,
            new_image.as_deref(),
            &validated.composition,
        )
        .await;
    let (recipe, replaced) = match result {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(path) = &new_image {
                state.media().delete(path).await;
            }
            return Err(e.into());
        }
    };
    if let Some(previous) = replaced {
        state.media().delete(&previous).await;
    }

    tracing::info!(recipe_id = %recipe.id, "Recipe updated");
    Ok(Json(recipe_view(&state, Some(&user), recipe).await?))
}

/// Delete a recipe. Only its author may do this.
///
/// DELETE /api/recipes/{id}/
#[instrument(skip_all, fields(id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
) -> Result<StatusCode> {
    let recipe = load_recipe(&state, id).await?;
    ensure_author(&recipe, &user)?;

    if let Some(image) = RecipeRepository::new(state.pool()).delete(id).await? {
        state.media().delete(&image).await;
    }

    tracing::info!(recipe_id = %id, "Recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

/// Public short link of a recipe.
///
/// GET /api/recipes/{id}/get-link/
#[instrument(skip_all, fields(id = %id))]
pub async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<RecipeId>,
) -> Result<Json<ShortLinkResponse>> {
    let recipe = load_recipe(&state, id).await?;
    Ok(Json(ShortLinkResponse {
        short_link: state
            .config()
            .absolute_url(&format!("s/{}", recipe.short_link)),
    }))
}

// =============================================================================
// Favorites and shopping cart
// =============================================================================

async fn add_to_list(
    state: &AppState,
    user: &User,
    id: RecipeId,
    list: RecipeList,
) -> Result<(StatusCode, Json<ShortRecipeView>)> {
    let recipe = load_recipe(state, id).await?;
    UserRecipeRepository::new(state.pool(), list)
        .add(user.id, recipe.id)
        .await?;

    tracing::info!(user_id = %user.id, recipe_id = %id, list = list.label(), "Recipe added");
    Ok((
        StatusCode::CREATED,
        Json(ShortRecipeView::new(&recipe, state.config())),
    ))
}

async fn remove_from_list(
    state: &AppState,
    user: &User,
    id: RecipeId,
    list: RecipeList,
) -> Result<StatusCode> {
    let recipe = load_recipe(state, id).await?;
    let removed = UserRecipeRepository::new(state.pool(), list)
        .remove(user.id, recipe.id)
        .await?;
    if !removed {
        return Err(AppError::BadRequest(format!(
            "recipe is not in {}",
            list.label()
        )));
    }

    tracing::info!(user_id = %user.id, recipe_id = %id, list = list.label(), "Recipe removed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/recipes/{id}/favorite/
#[instrument(skip_all, fields(id = %id))]
pub async fn add_favorite(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
) -> Result<(StatusCode, Json<ShortRecipeView>)> {
    add_to_list(&state, &user, id, RecipeList::Favorites).await
}

/// DELETE /api/recipes/{id}/favorite/
#[instrument(skip_all, fields(id = %id))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
) -> Result<StatusCode> {
    remove_from_list(&state, &user, id, RecipeList::Favorites).await
}

/// POST /api/recipes/{id}/shopping_cart/
#[instrument(skip_all, fields(id = %id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
) -> Result<(StatusCode, Json<ShortRecipeView>)> {
    add_to_list(&state, &user, id, RecipeList::ShoppingCart).await
}

/// DELETE /api/recipes/{id}/shopping_cart/
#[instrument(skip_all, fields(id = %id))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
) -> Result<StatusCode> {
    remove_from_list(&state, &user, id, RecipeList::ShoppingCart).await
}

/// Download the aggregated shopping list of the current user's cart.
///
/// GET /api/recipes/download_shopping_cart/
#[instrument(skip_all)]
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let source = ShoppingCartSource::new(state.pool());
    let list = build_shopping_list(&source, user.id, Utc::now()).await?;

    tracing::info!(
        user_id = %user.id,
        recipes = list.recipes.len(),
        totals = list.totals.len(),
        "Shopping list rendered"
    );

    Ok(shopping_list_response(&list))
}

/// The rendered list as a `text/plain` attachment named `shopping_list.txt`.
#[must_use]
pub fn shopping_list_response(list: &ShoppingList) -> Response {
    (
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
            ),
        ],
        list.render(),
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn request() -> RecipeRequest {
        serde_json::from_value(serde_json::json!({
            "ingredients": [{"id": 1, "amount": 10}, {"id": 2, "amount": 3}],
            "tags": [1, 2],
            "image": PNG,
            "name": "Borscht",
            "text": "Simmer for an hour.",
            "cooking_time": 90
        }))
        .unwrap()
    }

    fn field_errors(result: Result<ValidatedRecipe>) -> FieldErrors {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_request() {
        let validated = validate_recipe(request(), ImagePolicy::Required).unwrap();
        assert_eq!(validated.fields.name, "Borscht");
        assert_eq!(validated.fields.cooking_time.minutes(), 90);
        assert_eq!(validated.composition.tags(), &[TagId::new(1), TagId::new(2)]);
        assert_eq!(validated.composition.ingredients().len(), 2);
        assert_eq!(validated.image.unwrap().extension, "png");
    }

    #[test]
    fn test_field_checks_run_before_composition() {
        let mut req = request();
        req.cooking_time = Some(0);
        req.tags = Some(vec![TagId::new(1), TagId::new(1)]);

        let errors = field_errors(validate_recipe(req, ImagePolicy::Required));
        assert!(errors.get("cooking_time").is_some());
        assert!(errors.get("tags").is_none());
    }

    #[test]
    fn test_missing_fields_are_reported_together() {
        let errors = field_errors(validate_recipe(
            RecipeRequest::default(),
            ImagePolicy::Required,
        ));
        for field in ["name", "text", "cooking_time", "image"] {
            assert_eq!(
                errors.get(field).unwrap(),
                &["this field is required".to_owned()],
                "{field}"
            );
        }
    }

    #[test]
    fn test_image_optional_on_update() {
        let mut req = request();
        req.image = None;
        assert!(validate_recipe(req.clone(), ImagePolicy::Optional).is_ok());
        assert!(validate_recipe(req, ImagePolicy::Required).is_err());
    }

    #[test]
    fn test_absent_ingredients_fail_composition() {
        let mut req = request();
        req.ingredients = None;
        let errors = field_errors(validate_recipe(req, ImagePolicy::Optional));
        assert_eq!(
            errors.get("ingredients").unwrap(),
            &["a recipe needs at least one ingredient".to_owned()]
        );
    }

    #[test]
    fn test_duplicate_ingredients_reported_with_ids() {
        let mut req = request();
        req.ingredients = Some(vec![
            IngredientInput { id: IngredientId::new(7), amount: 1 },
            IngredientInput { id: IngredientId::new(3), amount: 1 },
            IngredientInput { id: IngredientId::new(7), amount: 2 },
            IngredientInput { id: IngredientId::new(3), amount: 5 },
        ]);
        let errors = field_errors(validate_recipe(req, ImagePolicy::Required));
        assert_eq!(
            errors.get("ingredients").unwrap(),
            &["ingredients are repeated: 3, 7".to_owned()]
        );
    }

    #[test]
    fn test_amount_out_of_range() {
        let mut req = request();
        req.ingredients = Some(vec![IngredientInput {
            id: IngredientId::new(4),
            amount: 40_000,
        }]);
        let errors = field_errors(validate_recipe(req, ImagePolicy::Required));
        assert_eq!(
            errors.get("ingredients").unwrap(),
            &["ingredient 4: ensure this value is less than or equal to 32767".to_owned()]
        );
    }

    #[test]
    fn test_name_limits() {
        let mut req = request();
        req.name = Some("   ".to_owned());
        let errors = field_errors(validate_recipe(req, ImagePolicy::Required));
        assert_eq!(
            errors.get("name").unwrap(),
            &["this field may not be blank".to_owned()]
        );

        let mut req = request();
        req.name = Some("щ".repeat(MAX_NAME_LENGTH + 1));
        assert!(validate_recipe(req, ImagePolicy::Required).is_err());
    }

    #[test]
    fn test_short_link_response_key() {
        let json = serde_json::to_value(ShortLinkResponse {
            short_link: "http://localhost:8000/s/0a1b2c".to_owned(),
        })
        .unwrap();
        assert_eq!(json["short-link"], "http://localhost:8000/s/0a1b2c");
    }
}

//! Shopping list aggregation through the `CartSource` seam.
//!
//! Uses an in-memory cart in place of the database-backed source.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::body::to_bytes;
use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use foodgram_core::shopping_list::{CartRecipe, CartSource, IngredientLine, build_shopping_list};
use foodgram_core::{RecipeId, UserId};
use foodgram_server::routes::recipes::shopping_list_response;

#[derive(Default)]
struct MemoryCart {
    carts: HashMap<UserId, Vec<CartRecipe>>,
    ingredients: HashMap<RecipeId, Vec<IngredientLine>>,
}

impl MemoryCart {
    fn add(&mut self, owner: i32, recipe: i32, name: &str, lines: Vec<IngredientLine>) {
        self.carts
            .entry(UserId::new(owner))
            .or_default()
            .push(CartRecipe {
                recipe_id: RecipeId::new(recipe),
                name: name.to_owned(),
            });
        self.ingredients.insert(RecipeId::new(recipe), lines);
    }
}

impl CartSource for MemoryCart {
    type Error = Infallible;

    async fn load_cart_entries(&self, owner: UserId) -> Result<Vec<CartRecipe>, Infallible> {
        Ok(self.carts.get(&owner).cloned().unwrap_or_default())
    }

    async fn load_recipe_ingredients(
        &self,
        recipes: &[RecipeId],
    ) -> Result<HashMap<RecipeId, Vec<IngredientLine>>, Infallible> {
        Ok(recipes
            .iter()
            .filter_map(|id| self.ingredients.get(id).map(|lines| (*id, lines.clone())))
            .collect())
    }
}

fn kitchen() -> MemoryCart {
    let mut cart = MemoryCart::default();
    cart.add(
        1,
        10,
        "Борщ",
        vec![
            IngredientLine::new("свёкла", 300, "г"),
            IngredientLine::new("вода", 2, "л"),
            IngredientLine::new("соль", 5, "г"),
        ],
    );
    cart.add(
        1,
        11,
        "Pancakes",
        vec![
            IngredientLine::new("flour", 250, "g"),
            IngredientLine::new("соль", 1, "щепотка"),
        ],
    );
    cart.add(2, 12, "Tea", vec![IngredientLine::new("water", 1, "cup")]);
    cart
}

#[tokio::test]
async fn test_report_for_full_cart() {
    let as_of = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).single().expect("valid date");

    let list = build_shopping_list(&kitchen(), UserId::new(1), as_of)
        .await
        .expect("infallible source");

    let expected = "\
Список покупок
Дата: 1 марта 2026

Рецепты:
1. Борщ
   - свёкла: 300 г
   - вода: 2 л
   - соль: 5 г
2. Pancakes
   - flour: 250 g
   - соль: 1 щепотка

Итого:
- flour: 250 g
- вода: 2 л
- свёкла: 300 г
- соль: 6 щепотка
";
    assert_eq!(list.render(), expected);
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let as_of = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 0).single().expect("valid date");

    let list = build_shopping_list(&kitchen(), UserId::new(2), as_of)
        .await
        .expect("infallible source");

    assert_eq!(list.recipes.len(), 1);
    assert_eq!(list.totals.len(), 1);
    assert!(list.render().starts_with("Список покупок\nДата: 31 декабря 2026\n"));
}

#[tokio::test]
async fn test_empty_cart_still_renders() {
    let as_of = Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).single().expect("valid date");

    let list = build_shopping_list(&kitchen(), UserId::new(99), as_of)
        .await
        .expect("infallible source");

    assert!(list.is_empty());
    assert_eq!(
        list.render(),
        "Список покупок\nДата: 16 октября 2026\n\nРецепты:\n\nИтого:\n"
    );
}

#[tokio::test]
async fn test_download_is_a_text_attachment() {
    let as_of = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).single().expect("valid date");
    let list = build_shopping_list(&kitchen(), UserId::new(2), as_of)
        .await
        .expect("infallible source");

    let response = shopping_list_response(&list);

    assert_eq!(response.status(), StatusCode::OK);
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    assert_eq!(header("content-type").as_deref(), Some("text/plain; charset=utf-8"));
    assert_eq!(
        header("content-disposition").as_deref(),
        Some("attachment; filename=\"shopping_list.txt\"")
    );

    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    assert_eq!(
        String::from_utf8(body.to_vec()).expect("utf-8 body"),
        "Список покупок\nДата: 1 марта 2026\n\nРецепты:\n1. Tea\n   - water: 1 cup\n\nИтого:\n- water: 1 cup\n"
    );
}

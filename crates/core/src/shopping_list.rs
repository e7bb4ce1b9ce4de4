//! Shopping list aggregation.
//!
//! Expands the recipes in a user's shopping cart into ingredient lines,
//! totals them per ingredient and renders a dated plain-text report.
//!
//! Totals are grouped by ingredient **name** only. When the same name shows
//! up with different measurement units, amounts are still summed and the
//! unit of the last line seen is the one displayed.
//!
//! # Report format
//!
//! Month names are Russian genitive forms regardless of the caller's locale:
//!
//! ```text
//! Список покупок
//! Дата: 16 октября 2026
//!
//! Рецепты:
//! 1. Soup
//!    - salt: 5 g
//!    - water: 1 l
//! 2. Stew
//!    - salt: 3 g
//!
//! Итого:
//! - salt: 8 g
//! - water: 1 l
//! ```

use core::fmt;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{RecipeId, UserId};

const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// One ingredient of one recipe, as it appears on the shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: u32,
}

impl IngredientLine {
    #[must_use]
    pub fn new(name: impl Into<String>, amount: u32, measurement_unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            measurement_unit: measurement_unit.into(),
            amount,
        }
    }
}

/// A shopping cart entry as stored: which recipe, under which name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRecipe {
    pub recipe_id: RecipeId,
    pub name: String,
}

/// A cart entry expanded with its recipe's ingredient lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartEntry {
    pub recipe_id: RecipeId,
    pub recipe_name: String,
    pub ingredients: Vec<IngredientLine>,
}

/// Summed amount of one ingredient across the whole cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingTotal {
    pub name: String,
    pub amount: u64,
    pub measurement_unit: String,
}

/// The consolidated shopping list for one cart at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingList {
    pub date: NaiveDate,
    pub recipes: Vec<CartEntry>,
    /// Sorted by ingredient name.
    pub totals: Vec<ShoppingTotal>,
}

impl ShoppingList {
    /// Build the list for `entries` as of `as_of`.
    ///
    /// Never fails: an empty cart yields a list with no recipes and no totals.
    #[must_use]
    pub fn aggregate(entries: Vec<CartEntry>, as_of: DateTime<Utc>) -> Self {
        let mut grouped: BTreeMap<&str, (u64, &str)> = BTreeMap::new();
        for line in entries.iter().flat_map(|entry| &entry.ingredients) {
            let slot = grouped.entry(line.name.as_str()).or_insert((0, ""));
            slot.0 += u64::from(line.amount);
            slot.1 = line.measurement_unit.as_str();
        }

        let totals = grouped
            .into_iter()
            .map(|(name, (amount, unit))| ShoppingTotal {
                name: name.to_owned(),
                amount,
                measurement_unit: unit.to_owned(),
            })
            .collect();

        Self {
            date: as_of.date_naive(),
            recipes: entries,
            totals,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Render the plain-text report.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

/// Day, genitive month name and year, e.g. `1 марта 2026`.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    let month = MONTHS_GENITIVE
        .get(date.month0() as usize)
        .copied()
        .unwrap_or_default();
    format!("{} {month} {}", date.day(), date.year())
}

impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Список покупок")?;
        writeln!(f, "Дата: {}", format_date(self.date))?;
        writeln!(f)?;

        writeln!(f, "Рецепты:")?;
        for (index, recipe) in self.recipes.iter().enumerate() {
            writeln!(f, "{}. {}", index + 1, recipe.recipe_name)?;
            for line in &recipe.ingredients {
                writeln!(
                    f,
                    "   - {}: {} {}",
                    line.name, line.amount, line.measurement_unit
                )?;
            }
        }
        writeln!(f)?;

        writeln!(f, "Итого:")?;
        for total in &self.totals {
            writeln!(
                f,
                "- {}: {} {}",
                total.name, total.amount, total.measurement_unit
            )?;
        }
        Ok(())
    }
}

/// Storage access needed to build a shopping list.
pub trait CartSource {
    type Error;

    /// Recipes in `owner`'s shopping cart, in the order they were added.
    fn load_cart_entries(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<Vec<CartRecipe>, Self::Error>> + Send;

    /// Ingredient lines of every recipe in `recipes`, fetched together.
    ///
    /// Recipes without lines may be absent from the map.
    fn load_recipe_ingredients(
        &self,
        recipes: &[RecipeId],
    ) -> impl Future<Output = Result<HashMap<RecipeId, Vec<IngredientLine>>, Self::Error>> + Send;
}

/// Load `owner`'s cart through `source` and aggregate it.
///
/// # Errors
///
/// Propagates any error returned by `source`.
pub async fn build_shopping_list<S>(
    source: &S,
    owner: UserId,
    as_of: DateTime<Utc>,
) -> Result<ShoppingList, S::Error>
where
    S: CartSource + Sync,
{
    let cart = source.load_cart_entries(owner).await?;
    let ids: Vec<RecipeId> = cart.iter().map(|recipe| recipe.recipe_id).collect();
    let mut lines = source.load_recipe_ingredients(&ids).await?;

    let entries = cart
        .into_iter()
        .map(|recipe| CartEntry {
            ingredients: lines.remove(&recipe.recipe_id).unwrap_or_default(),
            recipe_id: recipe.recipe_id,
            recipe_name: recipe.name,
        })
        .collect();
    Ok(ShoppingList::aggregate(entries, as_of))
}

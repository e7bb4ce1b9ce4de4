//! Recipe composition rules.
//!
//! A recipe is written together with its tag set and its ingredient list.
//! [`validate`] enforces that both are non-empty and free of repeated
//! references before anything is persisted. [`RecipeComposition::diff_from`]
//! turns an accepted composition into the minimal set of relation changes
//! needed to move a stored recipe onto it.
//!
//! # Check order
//!
//! Errors are reported in a fixed order so that clients get predictable
//! feedback:
//!
//! 1. [`CompositionError::EmptyIngredients`]
//! 2. [`CompositionError::EmptyTags`]
//! 3. [`CompositionError::DuplicateTags`]
//! 4. [`CompositionError::DuplicateIngredients`]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::types::{Amount, IngredientId, TagId};

/// One ingredient reference with its quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub ingredient: IngredientId,
    pub amount: Amount,
}

impl IngredientAmount {
    #[must_use]
    pub const fn new(ingredient: IngredientId, amount: Amount) -> Self {
        Self { ingredient, amount }
    }
}

/// An ingredient row with its place in the recipe's list, counted from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedIngredient {
    pub position: usize,
    pub item: IngredientAmount,
}

/// A validated tag set and ingredient list, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeComposition {
    tags: Vec<TagId>,
    ingredients: Vec<IngredientAmount>,
}

/// Reasons a proposed composition is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositionError {
    #[error("a recipe needs at least one ingredient")]
    EmptyIngredients,
    #[error("a recipe needs at least one tag")]
    EmptyTags,
    #[error("tags are repeated: {}", join_ids(.0))]
    DuplicateTags(BTreeSet<TagId>),
    #[error("ingredients are repeated: {}", join_ids(.0))]
    DuplicateIngredients(BTreeSet<IngredientId>),
}

impl CompositionError {
    /// Name of the request field the error belongs to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyTags | Self::DuplicateTags(_) => "tags",
            Self::EmptyIngredients | Self::DuplicateIngredients(_) => "ingredients",
        }
    }
}

fn join_ids<T: ToString>(ids: &BTreeSet<T>) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every value that occurs more than once in `items`.
///
/// Builds a frequency map in a single pass and keeps the keys whose count
/// exceeds one. The result is ordered so that error messages are stable.
pub fn find_duplicates<T, I>(items: I) -> BTreeSet<T>
where
    T: Copy + Eq + Hash + Ord,
    I: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, usize> = HashMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(item, _)| item)
        .collect()
}

/// Check a proposed tag set and ingredient list.
///
/// On success the inputs are returned unchanged, wrapped in a
/// [`RecipeComposition`].
///
/// # Errors
///
/// Returns the first failing [`CompositionError`] in the order documented on
/// this module. Duplicate errors carry every repeated reference.
///
/// ```
/// use foodgram_core::composition::{CompositionError, IngredientAmount, validate};
/// use foodgram_core::{Amount, IngredientId, TagId};
///
/// let t1 = TagId::new(1);
/// let t2 = TagId::new(2);
/// let salt = IngredientAmount::new(IngredientId::new(1), Amount::new(2).unwrap());
///
/// let err = validate(vec![t1, t2, t1], vec![salt]).unwrap_err();
/// assert_eq!(err, CompositionError::DuplicateTags([t1].into()));
/// ```
pub fn validate(
    tags: Vec<TagId>,
    ingredients: Vec<IngredientAmount>,
) -> Result<RecipeComposition, CompositionError> {
    if ingredients.is_empty() {
        return Err(CompositionError::EmptyIngredients);
    }
    if tags.is_empty() {
        return Err(CompositionError::EmptyTags);
    }

    let repeated_tags = find_duplicates(tags.iter().copied());
    if !repeated_tags.is_empty() {
        return Err(CompositionError::DuplicateTags(repeated_tags));
    }

    let repeated_ingredients = find_duplicates(ingredients.iter().map(|i| i.ingredient));
    if !repeated_ingredients.is_empty() {
        return Err(CompositionError::DuplicateIngredients(repeated_ingredients));
    }

    Ok(RecipeComposition { tags, ingredients })
}

impl RecipeComposition {
    #[must_use]
    pub fn tags(&self) -> &[TagId] {
        &self.tags
    }

    #[must_use]
    pub fn ingredients(&self) -> &[IngredientAmount] {
        &self.ingredients
    }

    /// Relation changes that turn the stored `current` relations into `self`.
    ///
    /// `current` comes from storage in list order and is not required to
    /// satisfy the composition rules. If it repeats an ingredient, the last
    /// row wins. A row is upserted when its amount or its position differs.
    #[must_use]
    pub fn diff_from(&self, current_tags: &[TagId], current: &[IngredientAmount]) -> CompositionDiff {
        let old_tags: BTreeSet<TagId> = current_tags.iter().copied().collect();
        let new_tags: BTreeSet<TagId> = self.tags.iter().copied().collect();

        let old_rows: BTreeMap<IngredientId, (usize, Amount)> = current
            .iter()
            .enumerate()
            .map(|(position, i)| (i.ingredient, (position, i.amount)))
            .collect();
        let new_ids: BTreeSet<IngredientId> = self.ingredients.iter().map(|i| i.ingredient).collect();

        CompositionDiff {
            tags_to_remove: old_tags.difference(&new_tags).copied().collect(),
            tags_to_add: self
                .tags
                .iter()
                .copied()
                .filter(|t| !old_tags.contains(t))
                .collect(),
            ingredients_to_remove: old_rows
                .keys()
                .copied()
                .filter(|id| !new_ids.contains(id))
                .collect(),
            ingredients_to_upsert: self
                .ingredients
                .iter()
                .copied()
                .enumerate()
                .filter(|&(position, i)| old_rows.get(&i.ingredient) != Some(&(position, i.amount)))
                .map(|(position, item)| PlacedIngredient { position, item })
                .collect(),
        }
    }
}

/// Row-level changes for one recipe's tag and ingredient relations.
///
/// Applied inside a single transaction by the recipe repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositionDiff {
    pub tags_to_remove: Vec<TagId>,
    pub tags_to_add: Vec<TagId>,
    pub ingredients_to_remove: Vec<IngredientId>,
    /// New ingredient rows plus rows whose amount or position changed.
    pub ingredients_to_upsert: Vec<PlacedIngredient>,
}

impl CompositionDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags_to_remove.is_empty()
            && self.tags_to_add.is_empty()
            && self.ingredients_to_remove.is_empty()
            && self.ingredients_to_upsert.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tag(id: i32) -> TagId {
        TagId::new(id)
    }

    fn item(id: i32, amount: i64) -> IngredientAmount {
        IngredientAmount::new(IngredientId::new(id), Amount::new(amount).unwrap())
    }

    fn placed(position: usize, id: i32, amount: i64) -> PlacedIngredient {
        PlacedIngredient {
            position,
            item: item(id, amount),
        }
    }

    #[test]
    fn test_valid_composition_is_returned_unchanged() {
        let tags = vec![tag(3), tag(1)];
        let ingredients = vec![item(5, 200), item(2, 1)];

        let composition = validate(tags.clone(), ingredients.clone()).unwrap();

        assert_eq!(composition.tags(), tags.as_slice());
        assert_eq!(composition.ingredients(), ingredients.as_slice());
    }

    #[test]
    fn test_empty_ingredients_reported_before_empty_tags() {
        assert_eq!(validate(vec![], vec![]), Err(CompositionError::EmptyIngredients));
    }

    #[test]
    fn test_empty_tags() {
        assert_eq!(
            validate(vec![], vec![item(1, 2)]),
            Err(CompositionError::EmptyTags)
        );
    }

    #[test]
    fn test_empty_ingredients_with_tags() {
        assert_eq!(
            validate(vec![tag(1)], vec![]),
            Err(CompositionError::EmptyIngredients)
        );
    }

    #[test]
    fn test_duplicate_tag_is_reported() {
        let err = validate(vec![tag(1), tag(2), tag(1)], vec![item(1, 2)]).unwrap_err();
        assert_eq!(err, CompositionError::DuplicateTags(BTreeSet::from([tag(1)])));
        assert_eq!(err.field(), "tags");
    }

    #[test]
    fn test_duplicate_tags_checked_before_duplicate_ingredients() {
        let err = validate(vec![tag(4), tag(4)], vec![item(1, 2), item(1, 3)]).unwrap_err();
        assert!(matches!(err, CompositionError::DuplicateTags(_)));
    }

    #[test]
    fn test_every_repeated_ingredient_is_reported() {
        let err = validate(
            vec![tag(1)],
            vec![item(7, 1), item(3, 1), item(7, 2), item(9, 1), item(3, 5), item(7, 1)],
        )
        .unwrap_err();

        assert_eq!(
            err,
            CompositionError::DuplicateIngredients(BTreeSet::from([
                IngredientId::new(3),
                IngredientId::new(7),
            ]))
        );
        assert_eq!(err.field(), "ingredients");
        assert_eq!(err.to_string(), "ingredients are repeated: 3, 7");
    }

    #[test]
    fn test_find_duplicates_ignores_singletons() {
        assert!(find_duplicates([1, 2, 3]).is_empty());
        assert_eq!(find_duplicates([5, 1, 5, 5, 2, 1]), BTreeSet::from([1, 5]));
    }

    #[test]
    fn test_diff_between_identical_compositions_is_empty() {
        let composition = validate(vec![tag(1), tag(2)], vec![item(1, 10)]).unwrap();
        let diff = composition.diff_from(&[tag(2), tag(1)], &[item(1, 10)]);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_diff_detects_added_removed_and_changed_rows() {
        let composition =
            validate(vec![tag(2), tag(3)], vec![item(1, 10), item(4, 2), item(5, 1)]).unwrap();

        let diff = composition.diff_from(&[tag(1), tag(2)], &[item(1, 5), item(4, 2), item(6, 3)]);

        assert_eq!(diff.tags_to_remove, vec![tag(1)]);
        assert_eq!(diff.tags_to_add, vec![tag(3)]);
        assert_eq!(diff.ingredients_to_remove, vec![IngredientId::new(6)]);
        assert_eq!(diff.ingredients_to_upsert, vec![placed(0, 1, 10), placed(2, 5, 1)]);
    }

    #[test]
    fn test_diff_rewrites_moved_rows() {
        let composition = validate(vec![tag(1)], vec![item(2, 5), item(3, 1)]).unwrap();

        let diff = composition.diff_from(&[tag(1)], &[item(1, 100), item(2, 5), item(3, 1)]);

        assert_eq!(diff.ingredients_to_remove, vec![IngredientId::new(1)]);
        assert_eq!(diff.ingredients_to_upsert, vec![placed(0, 2, 5), placed(1, 3, 1)]);
    }

    #[test]
    fn test_applying_diff_yields_new_relation_set() {
        let old_tags = vec![tag(1), tag(2), tag(3)];
        let old_items = vec![item(1, 1), item(2, 2), item(3, 3)];
        let composition = validate(vec![tag(3), tag(4)], vec![item(3, 30), item(4, 4)]).unwrap();

        let diff = composition.diff_from(&old_tags, &old_items);

        let mut tags: BTreeSet<TagId> = old_tags.into_iter().collect();
        for t in &diff.tags_to_remove {
            tags.remove(t);
        }
        tags.extend(diff.tags_to_add.iter().copied());

        let mut rows: BTreeMap<IngredientId, (usize, Amount)> = old_items
            .iter()
            .enumerate()
            .map(|(position, i)| (i.ingredient, (position, i.amount)))
            .collect();
        for id in &diff.ingredients_to_remove {
            rows.remove(id);
        }
        for p in &diff.ingredients_to_upsert {
            rows.insert(p.item.ingredient, (p.position, p.item.amount));
        }
        let mut items: Vec<(usize, IngredientAmount)> = rows
            .into_iter()
            .map(|(ingredient, (position, amount))| (position, IngredientAmount::new(ingredient, amount)))
            .collect();
        items.sort_by_key(|&(position, _)| position);

        assert_eq!(tags, composition.tags().iter().copied().collect());
        assert_eq!(
            items.into_iter().map(|(_, i)| i).collect::<Vec<_>>(),
            composition.ingredients()
        );
    }
}

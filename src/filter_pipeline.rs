use crate::models::{Category, ExerciseRecord, FilterState};
use std::collections::{HashMap, HashSet};

/// Derives the ordered list shown in the deck. Stable: relative catalog order
/// is preserved.
pub fn compute_visible_list(
    all_exercises: &[ExerciseRecord],
    filter: &FilterState,
    favorite_ids: &HashSet<u32>,
) -> Vec<ExerciseRecord> {
    all_exercises
        .iter()
        .filter(|record| match filter.selected_category {
            Some(category) => record.category == Some(category),
            None => true,
        })
        .filter(|record| !filter.favorites_only || favorite_ids.contains(&record.id))
        .cloned()
        .collect()
}

/// Applies the auto-disable policy: favorites-only with no favorites left
/// would pin the deck to the cover card, so the flag is cleared.
pub fn resolve_favorites_only(filter: FilterState, favorite_ids: &HashSet<u32>) -> FilterState {
    if filter.favorites_only && favorite_ids.is_empty() {
        FilterState {
            favorites_only: false,
            ..filter
        }
    } else {
        filter
    }
}

pub fn category_counts(all_exercises: &[ExerciseRecord]) -> HashMap<Category, usize> {
    let mut counts = HashMap::new();
    for category in all_exercises.iter().filter_map(|record| record.category) {
        *counts.entry(category).or_insert(0) += 1;
    }
    counts
}

use crate::countdown_timer::parse_duration;
use crate::models::{Category, ExerciseRecord, FilterState};
use serde::Serialize;
use std::collections::HashSet;

const SHARE_PREVIEW_CHARS: usize = 200;
const SHARE_FOOTER: &str = "Från Mindfulnessguiden - Verktygslådan för mindfulnessguider";

/// What the deck knows besides the filtered list when it draws a card.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub filter: &'a FilterState,
    pub favorite_ids: &'a HashSet<u32>,
    pub completed_ids: &'a HashSet<u32>,
    pub catalog: &'a [ExerciseRecord],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Card {
    #[serde(rename_all = "camelCase")]
    Cover {
        favorites_only: bool,
        favorites_count: usize,
        selected_category: Option<Category>,
        completion_percent: u32,
    },
    #[serde(rename_all = "camelCase")]
    Exercise {
        record: ExerciseRecord,
        is_favorite: bool,
        is_completed: bool,
        timer_available: bool,
    },
}

impl Card {
    pub fn exercise(&self) -> Option<&ExerciseRecord> {
        match self {
            Card::Exercise { record, .. } => Some(record),
            Card::Cover { .. } => None,
        }
    }
}

/// Index 0 is the cover; `i >= 1` is `filtered[i - 1]`. An index past the end
/// of the list (a filter change racing the render) falls back to the cover.
pub fn render_card(index: usize, filtered: &[ExerciseRecord], context: &RenderContext<'_>) -> Card {
    let record = index
        .checked_sub(1)
        .and_then(|position| filtered.get(position));
    match record {
        Some(record) => Card::Exercise {
            record: record.clone(),
            is_favorite: context.favorite_ids.contains(&record.id),
            is_completed: context.completed_ids.contains(&record.id),
            timer_available: parse_duration(&record.duration) > 0,
        },
        None => cover_card(context),
    }
}

/// Only completed ids still present in the catalog count toward progress.
fn cover_card(context: &RenderContext<'_>) -> Card {
    let completed = context
        .catalog
        .iter()
        .filter(|record| context.completed_ids.contains(&record.id))
        .count();
    Card::Cover {
        favorites_only: context.filter.favorites_only,
        favorites_count: context.favorite_ids.len(),
        selected_category: context.filter.selected_category,
        completion_percent: crate::preference_store::completion_percentage(
            completed,
            context.catalog.len(),
        ),
    }
}

pub fn exercise_url(base_url: &str, exercise_id: u32) -> String {
    format!("{}/#exercise-{exercise_id}", base_url.trim_end_matches('/'))
}

pub fn share_text(record: &ExerciseRecord, base_url: &str) -> String {
    let preview = match record.instructions.char_indices().nth(SHARE_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &record.instructions[..cut]),
        None => record.instructions.clone(),
    };
    format!(
        "{}\n\nTid: {}\n\n{}\n\n{}\n{}",
        record.name,
        record.duration,
        preview,
        SHARE_FOOTER,
        exercise_url(base_url, record.id)
    )
}

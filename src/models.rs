use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    pub id: u32,
    pub name: String,
    pub duration: String,
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Andning")]
    Breathing,
    #[serde(rename = "Rörelse")]
    Movement,
    #[serde(rename = "Meditation")]
    Meditation,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Breathing,
        Category::Movement,
        Category::Meditation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Breathing => "Andning",
            Category::Movement => "Rörelse",
            Category::Meditation => "Meditation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub selected_category: Option<Category>,
    pub favorites_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn base_pixels(self) -> u32 {
        match self {
            FontSize::Small => 14,
            FontSize::Medium => 16,
            FontSize::Large => 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Default,
    HighContrast,
}

/// Display preferences. Missing fields fall back to their defaults so older
/// settings files keep loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub font_size: FontSize,
    pub theme: Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionDirection {
    #[default]
    None,
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckState {
    pub visible_index: usize,
    pub card_count: usize,
    pub transition_lock: bool,
    pub transition_direction: TransitionDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Stopped,
    Running,
    Paused,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub exercise_id: Option<u32>,
    pub status: TimerStatus,
    pub total_seconds: u32,
    pub elapsed_seconds: u32,
    pub remaining_seconds: u32,
    pub remaining_label: String,
    pub progress: f32,
    pub last_chime_minute: u32,
}

impl TimerState {
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, ExerciseRecord, FontSize, Settings, Theme};

    #[test]
    fn category_uses_swedish_wire_labels() {
        let json = r#"{"id":3,"name":"Fyrkantsandning","duration":"4 minuter","instructions":"Andas in","category":"Rörelse"}"#;
        let record: ExerciseRecord = serde_json::from_str(json).expect("parse record");
        assert_eq!(record.category, Some(Category::Movement));

        let encoded = serde_json::to_string(&Category::Breathing).expect("encode");
        assert_eq!(encoded, "\"Andning\"");
    }

    #[test]
    fn category_is_optional() {
        let json = r#"{"id":1,"name":"Bodyscan","duration":"8 minuter","instructions":"Ligg ner"}"#;
        let record: ExerciseRecord = serde_json::from_str(json).expect("parse record");
        assert!(record.category.is_none());
    }

    #[test]
    fn partial_settings_merge_over_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"fontSize":"large"}"#).expect("parse");
        assert_eq!(settings.font_size, FontSize::Large);
        assert_eq!(settings.theme, Theme::Default);
        assert_eq!(settings.font_size.base_pixels(), 20);

        let theme: Theme = serde_json::from_str("\"high-contrast\"").expect("parse theme");
        assert_eq!(theme, Theme::HighContrast);
    }
}

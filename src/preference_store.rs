use crate::models::Settings;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const FAVORITES_FILE: &str = "favorites.json";
const COMPLETED_FILE: &str = "completed.json";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type PreferenceResult<T> = Result<T, PreferenceError>;

/// Favorites, completed exercises and display settings, one JSON file each.
/// Public operations never fail: I/O problems are logged and the store
/// answers with safe defaults.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    base_dir: PathBuf,
    favorites_path: PathBuf,
    completed_path: PathBuf,
    settings_path: PathBuf,
}

impl PreferenceStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        if let Err(err) = fs::create_dir_all(&base_dir) {
            warn!(dir = %base_dir.display(), error = %err, "could not create preference dir");
        }
        Self {
            favorites_path: base_dir.join(FAVORITES_FILE),
            completed_path: base_dir.join(COMPLETED_FILE),
            settings_path: base_dir.join(SETTINGS_FILE),
            base_dir,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn favorite_ids(&self) -> HashSet<u32> {
        self.read_ids(&self.favorites_path)
    }

    pub fn is_favorite(&self, exercise_id: u32) -> bool {
        self.favorite_ids().contains(&exercise_id)
    }

    /// Flips the favorite flag. Returns `true` when the exercise is now a favorite.
    pub fn toggle_favorite(&self, exercise_id: u32) -> bool {
        self.toggle_id(&self.favorites_path, exercise_id)
    }

    pub fn completed_ids(&self) -> HashSet<u32> {
        self.read_ids(&self.completed_path)
    }

    pub fn is_completed(&self, exercise_id: u32) -> bool {
        self.completed_ids().contains(&exercise_id)
    }

    /// Flips the completed flag. Returns `true` when the exercise is now completed.
    pub fn toggle_completed(&self, exercise_id: u32) -> bool {
        self.toggle_id(&self.completed_path, exercise_id)
    }

    /// Share of the catalog marked completed, rounded to a whole percent.
    pub fn completion_percentage(&self, total_exercises: usize) -> u32 {
        completion_percentage(self.completed_ids().len(), total_exercises)
    }

    pub fn settings(&self) -> Settings {
        match read_json::<Settings>(&self.settings_path) {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(err) => {
                warn!(error = %err, "failed to read settings, using defaults");
                Settings::default()
            }
        }
    }

    pub fn save_settings(&self, settings: &Settings) {
        if let Err(err) = write_json(&self.settings_path, settings) {
            warn!(error = %err, "failed to save settings");
        }
    }

    fn read_ids(&self, path: &Path) -> HashSet<u32> {
        match read_json::<Vec<u32>>(path) {
            Ok(ids) => ids.unwrap_or_default().into_iter().collect(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read ids, treating as empty");
                HashSet::new()
            }
        }
    }

    fn toggle_id(&self, path: &Path, exercise_id: u32) -> bool {
        let mut ids = match read_json::<Vec<u32>>(path) {
            Ok(ids) => ids.unwrap_or_default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read ids, starting over");
                Vec::new()
            }
        };
        let now_set = match ids.iter().position(|id| *id == exercise_id) {
            Some(index) => {
                ids.remove(index);
                false
            }
            None => {
                ids.push(exercise_id);
                true
            }
        };
        if let Err(err) = write_json(path, &ids) {
            warn!(path = %path.display(), error = %err, "failed to persist toggle");
        }
        debug!(exercise_id, now_set, path = %path.display(), "preference toggled");
        now_set
    }
}

pub fn completion_percentage(completed: usize, total_exercises: usize) -> u32 {
    if total_exercises == 0 {
        return 0;
    }
    let percent = ((completed as f64 / total_exercises as f64) * 100.0).round() as u32;
    percent.min(100)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> PreferenceResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&contents)?))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> PreferenceResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("tmp");
    let file = fs::File::create(&temp_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    match fs::rename(&temp_path, path) {
        Ok(()) => Ok(()),
        Err(_err) if path.exists() => {
            let _ = fs::remove_file(path);
            fs::rename(&temp_path, path).map_err(PreferenceError::from)
        }
        Err(err) => Err(PreferenceError::from(err)),
    }
}

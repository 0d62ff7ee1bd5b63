use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "config.json";

fn default_transition_ms() -> u64 {
    300
}

fn default_swipe_threshold_px() -> f32 {
    50.0
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_sample_rate() -> u32 {
    44_100
}

fn default_base_url() -> String {
    "https://mindfulnessguiden.se".to_string()
}

/// Engine tunables. Every field has a default, so a config file only needs the
/// keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,
    #[serde(default = "default_swipe_threshold_px")]
    pub swipe_threshold_px: f32,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transition_ms: default_transition_ms(),
            swipe_threshold_px: default_swipe_threshold_px(),
            tick_interval_ms: default_tick_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            sample_rate: default_sample_rate(),
            base_url: default_base_url(),
        }
    }
}

impl EngineConfig {
    /// Reads `config.json` from `data_dir`. A missing file yields the defaults;
    /// an unreadable or malformed one is logged and also yields the defaults.
    pub fn load_or_default(data_dir: &Path) -> Self {
        let path = data_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            debug!(path = %path.display(), "no engine config, using defaults");
            return Self::default();
        }
        let parsed = fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|contents| {
                serde_json::from_str::<Self>(&contents).map_err(|err| err.to_string())
            });
        match parsed {
            Ok(config) => config.sanitized(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring invalid engine config");
                Self::default()
            }
        }
    }

    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn sanitized(mut self) -> Self {
        if self.tick_interval_ms == 0 {
            warn!("tick interval must be positive, using default");
            self.tick_interval_ms = default_tick_interval_ms();
        }
        if self.poll_interval_ms == 0 {
            self.poll_interval_ms = default_poll_interval_ms();
        }
        if self.sample_rate == 0 {
            self.sample_rate = default_sample_rate();
        }
        if !self.swipe_threshold_px.is_finite() || self.swipe_threshold_px < 0.0 {
            self.swipe_threshold_px = default_swipe_threshold_px();
        }
        self
    }
}

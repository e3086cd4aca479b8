use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wg_core::constants::{DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH};

pub const SETTINGS_ENV_VAR: &str = "WG_REPLAY_SETTINGS";
pub const DEFAULT_SETTINGS_FILE: &str = "replay_settings.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
    /// Log file next to stderr output; `None` logs to stderr only.
    pub log_file: Option<String>,
    /// Milliseconds between animation ticks.
    pub tick_interval_ms: u64,
    /// Ticks to let run after the last packet before printing the map.
    pub ticks_after_replay: u32,
    pub map_width: usize,
    pub map_height: usize,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            tick_interval_ms: 120,
            ticks_after_replay: 8,
            map_width: DEFAULT_MAP_WIDTH,
            map_height: DEFAULT_MAP_HEIGHT,
        }
    }
}

/// Picks the settings file: an explicit path wins, then the environment,
/// then `replay_settings.json` in the working directory.
pub fn settings_path(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }
    match env::var(SETTINGS_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
        _ => PathBuf::from(DEFAULT_SETTINGS_FILE),
    }
}

/// Missing files give the defaults. So do unparsable ones, after logging.
pub fn load_settings_from_disk(path: &Path) -> ReplaySettings {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(_) => return ReplaySettings::default(),
    };

    match serde_json::from_slice::<ReplaySettings>(&bytes) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to parse settings file {:?}: {e}", path);
            ReplaySettings::default()
        }
    }
}

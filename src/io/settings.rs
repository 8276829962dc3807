use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::timeline::{TimelineZoom, ViewUnit};

/// Persisted view preferences (lives in the OS config directory).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub view_unit: ViewUnit,
    pub zoom_level: u32,
    pub show_completed: bool,
    pub detail_visible: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            view_unit: ViewUnit::Week,
            zoom_level: TimelineZoom::DEFAULT,
            show_completed: true,
            detail_visible: false,
        }
    }
}

impl AppSettings {
    pub fn settings_path() -> PathBuf {
        match directories::ProjectDirs::from("", "", "Taskline") {
            Some(dirs) => dirs.config_dir().join("settings.json"),
            None => PathBuf::from("settings.json"),
        }
    }

    /// Load persisted settings, falling back to defaults on any problem.
    pub fn load(path: &Path) -> Self {
        let Ok(json) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("ignoring malformed settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Best-effort save; a failed write only logs.
    pub fn save(&self, path: &Path) {
        let Ok(json) = serde_json::to_string_pretty(self) else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(path, json) {
            log::warn!("could not save settings to {}: {e}", path.display());
        }
    }

    pub fn zoom(&self) -> TimelineZoom {
        TimelineZoom::with_level(self.zoom_level)
    }
}

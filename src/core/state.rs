//! Settings types
//!
//! - Settings: Persisted user defaults
//! - BatchSettings: Resolved settings for one conversion run

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User defaults
///
/// Persisted to `<config dir>/semp3fix/settings.json`. Command line flags
/// take precedence over everything stored here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Encoder executable to use instead of `ffmpeg` from PATH
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
    /// Skip transcoding when the output file already exists
    #[serde(default)]
    pub skip_existing: bool,
    /// Stop the batch at the first failed file
    #[serde(default)]
    pub fail_fast: bool,
}

impl Settings {
    const SETTINGS_FILE: &'static str = "settings.json";

    /// Path of the settings file, if a config directory exists on this platform
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("semp3fix").join(Self::SETTINGS_FILE))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let result = Self::settings_path()
            .ok_or_else(|| "Could not determine config directory".to_string())
            .and_then(|path| Self::load_from(&path));

        match result {
            Ok(settings) => {
                log::debug!("Loaded settings from disk");
                settings
            }
            Err(e) => {
                log::debug!("Using default settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Err("Settings file not found".to_string());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings file: {}", e))?;

        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse settings file: {}", e))
    }
}

/// Everything the batch driver needs to know about one run
#[derive(Debug, Clone, Default)]
pub struct BatchSettings {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub skip_existing: bool,
    pub fail_fast: bool,
    /// Plan and report only; no directories, no encoder, no tag writes
    pub dry_run: bool,
}

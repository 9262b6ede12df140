//! Configuration management (scribe.toml)
//!
//! Settings for the recorder, the playback cache and the player, stored in
//! TOML format in the platform-specific config directory.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::replay::{CacheConfig, PlayerConfig, RecorderConfig};

const CONFIG_FILE: &str = "scribe.toml";

/// Scribe configuration.
///
/// Every section falls back to its defaults when missing from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScribeConfig {
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\Scribe\config`
/// On macOS: `~/Library/Application Support/dev.scribe.Scribe`
/// On Linux: `~/.config/scribe`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "scribe", "Scribe")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path of the config file, if a config directory exists
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Loads the configuration from disk.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> ScribeConfig {
    config_path()
        .map(|path| load_from(&path))
        .unwrap_or_default()
}

/// Loads a configuration file, falling back to defaults
pub fn load_from(path: &Path) -> ScribeConfig {
    let Ok(content) = std::fs::read_to_string(path) else {
        return ScribeConfig::default();
    };
    match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring invalid config {}: {e}", path.display());
            ScribeConfig::default()
        }
    }
}

/// Saves the configuration to the platform config directory.
///
/// Creates the directory if it doesn't exist.
pub fn save(config: &ScribeConfig) -> io::Result<()> {
    match config_path() {
        Some(path) => save_to(&path, config),
        None => Ok(()),
    }
}

pub fn save_to(path: &Path, config: &ScribeConfig) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(config).map_err(io::Error::other)?;
    std::fs::write(path, content)
}

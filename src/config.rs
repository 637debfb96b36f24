//! Configuration for ghostpane.
//!
//! Settings are read from `~/.ghostpane/config.toml`. Every field is
//! optional; missing fields take their defaults.
//!
//! ```toml
//! # tracing filter directive; RUST_LOG overrides it
//! log_level = "info"
//!
//! [engine]
//! load_recursive_files = true
//! supports_selection_clipboard = false
//!
//! [surface]
//! font_size = 13.0
//! wait_after_command = false
//! title = "Terminal"
//! ```
//!
//! Terminal appearance (fonts, colors, keybindings) belongs to the engine's
//! own configuration files, which the engine loads itself.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not determine home directory")]
    NoHome,
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log filter directive, e.g. `info` or `ghostpane=debug`
    pub log_level: String,
    pub engine: EngineConfig,
    pub surface: SurfaceDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            engine: EngineConfig::default(),
            surface: SurfaceDefaults::default(),
        }
    }
}

/// Engine bring-up settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Follow `config-file` includes in the engine configuration
    pub load_recursive_files: bool,
    /// Host exposes a selection clipboard
    pub supports_selection_clipboard: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            load_recursive_files: true,
            supports_selection_clipboard: false,
        }
    }
}

/// Defaults applied to new surfaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceDefaults {
    pub font_size: f32,
    pub wait_after_command: bool,
    pub title: String,
}

impl Default for SurfaceDefaults {
    fn default() -> Self {
        Self {
            font_size: 13.0,
            wait_after_command: false,
            title: "Terminal".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// A missing or unreadable file yields the defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Load configuration from `path`, reporting every failure
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoHome)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `~/.ghostpane`
    pub fn config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".ghostpane"))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("ghostpane.log"))
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

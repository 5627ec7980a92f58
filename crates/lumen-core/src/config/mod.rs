//! Configuration management for Lumen.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a missing file or a
//! partial file is always valid.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Lumen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Auth service settings
    pub auth: AuthConfig,

    /// Vision API settings
    pub api: ApiConfig,

    /// Search / index settings
    pub search: SearchConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Platform config directory for Lumen.
    ///
    /// - macOS: ~/Library/Application Support/com.lumen.lumen
    /// - Linux: ~/.config/lumen
    /// - Windows: C:\Users\<User>\AppData\Roaming\lumen\lumen\config
    ///
    /// Falls back to ~/.lumen if directory detection fails.
    pub fn config_dir() -> PathBuf {
        directories::ProjectDirs::from("com", "lumen", "lumen")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".lumen")
            })
    }

    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Resolved credential file path (with ~ expansion).
    pub fn credentials_path(&self) -> PathBuf {
        if self.general.credentials_file.trim().is_empty() {
            return Self::config_dir().join("credentials.json");
        }
        let expanded = shellexpand::tilde(&self.general.credentials_file);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

//! Configuration management for embedprobe.
//!
//! Configuration is loaded from the platform config directory. Missing keys
//! fall back to defaults (batch 256, 5 folds, 100 trees, seed 42, 3000 TF-IDF
//! features).

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for embedprobe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Input dataset locations
    pub data: DataConfig,

    /// Dense embedding model settings
    pub embedding: EmbeddingConfig,

    /// TF-IDF vectorizer settings
    pub tfidf: TfidfConfig,

    /// Cross-validation and forest settings
    pub evaluation: EvaluationConfig,

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

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.embedprobe.embedprobe/config.toml
    /// - Linux: ~/.config/embedprobe/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\embedprobe\config\config.toml
    ///
    /// Falls back to ~/.embedprobe/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "embedprobe", "embedprobe")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".embedprobe").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        expand(&self.general.model_dir)
    }

    /// Resolved path of the filtered (primary) dataset.
    pub fn primary_data_path(&self) -> PathBuf {
        expand(&self.data.primary)
    }

    /// Resolved path of the unfiltered (complete) dataset.
    pub fn complete_data_path(&self) -> PathBuf {
        expand(&self.data.complete)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}

//! JSON Configuration Management
//!
//! Handles reading and writing the application configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_dir};

/// Configuration service for managing app settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Load ~/.prose-cascade/config.json, creating defaults if it is missing
    pub fn new() -> AppResult<Self> {
        Self::open(config_path()?)
    }

    /// Load the config at `path`, creating defaults if it is missing
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = path.into();
        if let Some(parent) = config_path.parent() {
            ensure_dir(parent)?;
        }

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            tracing::info!("Creating default config at {}", config_path.display());
            let default_config = AppConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.config)
    }

    /// Reset configuration to defaults
    pub fn reset(&mut self) -> AppResult<()> {
        self.config = AppConfig::default();
        self.save()?;
        Ok(())
    }
}

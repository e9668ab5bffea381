//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.
//! Everything lives under ~/.prose-cascade/.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Prose Cascade directory (~/.prose-cascade/)
pub fn prose_cascade_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".prose-cascade"))
}

/// Get the config file path (~/.prose-cascade/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(prose_cascade_dir()?.join("config.json"))
}

/// Get the quota state file path (~/.prose-cascade/quota.json)
pub fn quota_state_path() -> AppResult<PathBuf> {
    Ok(prose_cascade_dir()?.join("quota.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

//! Platform-specific configuration paths.
//!
//! - **User config**: `~/.config/spectra/` (Linux), `~/Library/Application Support/spectra/` (macOS), `%APPDATA%\spectra\` (Windows)
//! - **Pipelines**: `pipelines/` under the user config directory

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "spectra";

/// Name of the main configuration file.
pub const CONFIG_FILE_NAME: &str = "spectra.toml";

/// Subdirectory for saved pipeline files.
const PIPELINES_SUBDIR: &str = "pipelines";

/// Returns the user-specific configuration directory.
///
/// Falls back to the current directory if the platform config directory
/// cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}

/// Returns the directory for saved pipelines.
pub fn user_pipelines_dir() -> PathBuf {
    user_config_dir().join(PIPELINES_SUBDIR)
}

/// Resolves a configuration file by name.
///
/// `name` may be a path to an existing file, or a pipeline name looked up
/// (with or without `.toml`) in [`user_pipelines_dir`].
pub fn find_config(name: &str) -> Option<PathBuf> {
    find_in(name, &user_pipelines_dir())
}

fn find_in(name: &str, dir: &Path) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }
    let file_name = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    };
    let candidate = dir.join(file_name);
    candidate.is_file().then_some(candidate)
}

/// Creates `dir` and its parents if missing.
pub fn ensure_dir(dir: &Path) -> Result<(), ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
    }
    Ok(())
}

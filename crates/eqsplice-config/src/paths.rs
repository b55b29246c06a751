//! Platform-specific locations of the settings record and engine tuning.
//!
//! - **User config**: `~/.config/eqsplice/` (Linux), `~/Library/Application Support/eqsplice/` (macOS), `%APPDATA%\eqsplice\` (Windows)
//! - **Settings record**: `<user config>/settings.json`
//! - **Engine tuning**: `<user config>/engine.toml`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "eqsplice";

/// File name of the persisted settings record.
pub const SETTINGS_FILE: &str = "settings.json";

/// File name of the engine tuning file.
pub const ENGINE_CONFIG_FILE: &str = "engine.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the persisted settings record.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

/// Path of the engine tuning file.
pub fn engine_config_path() -> PathBuf {
    user_config_dir().join(ENGINE_CONFIG_FILE)
}

/// Ensure the user config directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

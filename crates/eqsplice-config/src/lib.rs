//! Settings, persisted state, and engine tuning for eqsplice.
//!
//! # Features
//!
//! - **Settings**: normalized equalizer state and the UI messages that change it
//! - **Persistence**: the JSON record the settings UI keeps, with user presets
//! - **Engine tuning**: band Q, compensation constants, and readiness polling in TOML
//! - **Validation**: range checks with aggregated errors
//! - **Paths**: platform-specific config locations
//! - **Factory Presets**: the gain tables offered by the UI
//!
//! # Example
//!
//! ```rust
//! use eqsplice_config::{ChannelMessage, Settings};
//!
//! let json = r#"{
//!     "type": "EQUALIZER_SETTINGS_CHANGED",
//!     "settings": { "equalizerEnabled": true, "equalizerSettings": { "gains": [6, 6, 5] } }
//! }"#;
//!
//! let mut settings = Settings::default();
//! settings.merge(&ChannelMessage::from_json(json).unwrap().into_settings());
//! assert!(settings.enabled);
//! assert_eq!(settings.gains[2], 5.0);
//! assert_eq!(settings.gains[3], 0.0);
//! ```

mod engine_config;
mod error;
mod persisted;
mod settings;

/// Platform-specific paths for settings and configuration.
pub mod paths;

/// Range checks for engine tuning and gain tables.
pub mod validation;

/// Factory presets offered by the settings UI.
pub mod factory_presets;

pub use engine_config::{CompensationConfig, EngineConfig, RetryPolicy};
pub use error::ConfigError;
pub use factory_presets::{
    CUSTOM_PRESET_ID, DEFAULT_PRESET_ID, EqPreset, FACTORY_PRESETS, factory_gains,
    factory_preset_ids, get_factory_preset, is_factory_preset, is_reserved_preset_name,
};
pub use paths::{engine_config_path, ensure_user_config_dir, settings_path, user_config_dir};
pub use persisted::{CustomPreset, PersistedSettings};
pub use settings::{
    ChannelMessage, EqualizerSettings, SETTINGS_CHANGED, Settings, SettingsMessage,
};
pub use validation::{ValidationError, ValidationResult, validate_engine_config, validate_gains};

//! The settings record kept in the extension's local store.
//!
//! Stored as JSON with the same camelCase shape the UI writes, plus the map of
//! user-saved presets.

use std::collections::BTreeMap;
use std::path::Path;

use eqsplice_core::BAND_COUNT;
use serde::{Deserialize, Serialize};

use crate::factory_presets::{DEFAULT_PRESET_ID, get_factory_preset, is_reserved_preset_name};
use crate::validation::ValidationError;
use crate::{ConfigError, EqualizerSettings, Settings, SettingsMessage};

/// A user-saved gain table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPreset {
    /// Name as typed by the user.
    pub name: String,
    /// Band gains in dB.
    #[serde(default)]
    pub gains: Vec<f32>,
}

/// Everything the settings UI persists between sessions.
///
/// # Example
///
/// ```rust
/// use eqsplice_config::PersistedSettings;
///
/// let mut stored = PersistedSettings::first_run();
/// assert_eq!(stored.preset(), "flat");
///
/// stored.apply_preset("bass").unwrap();
/// stored.equalizer_enabled = true;
/// let settings = stored.settings();
/// assert!(settings.enabled);
/// assert_eq!(settings.gains[0], 6.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSettings {
    /// Whether the equalizer is on. Off unless the user turned it on.
    #[serde(default)]
    pub equalizer_enabled: bool,
    /// Last gains and preset; absent before the first run completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equalizer_settings: Option<EqualizerSettings>,
    /// User presets keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_presets: BTreeMap<String, CustomPreset>,
}

impl PersistedSettings {
    /// The record written on first launch: flat, disabled.
    pub fn first_run() -> Self {
        Self {
            equalizer_enabled: false,
            equalizer_settings: Some(EqualizerSettings {
                gains: vec![0.0; BAND_COUNT],
                preset: Some(DEFAULT_PRESET_ID.to_string()),
            }),
            custom_presets: BTreeMap::new(),
        }
    }

    /// Load the record from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_json(&content)
    }

    /// Load the record, or the first-run record if the file does not exist.
    pub fn load_or_first_run(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::first_run())
        }
    }

    /// Save the record to a JSON file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Parse the record from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the record to JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Current preset id, `flat` when none was stored.
    pub fn preset(&self) -> &str {
        self.equalizer_settings
            .as_ref()
            .and_then(|eq| eq.preset.as_deref())
            .unwrap_or(DEFAULT_PRESET_ID)
    }

    /// The message announcing this record to the page on startup.
    pub fn message(&self) -> SettingsMessage {
        SettingsMessage {
            equalizer_enabled: Some(self.equalizer_enabled),
            equalizer_settings: Some(self.equalizer_settings.clone().unwrap_or_default()),
        }
    }

    /// Normalized settings described by this record.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.merge(&self.message());
        settings
    }

    /// Replaces the stored state.
    pub fn record(&mut self, settings: &Settings, preset: Option<&str>) {
        self.equalizer_enabled = settings.enabled;
        self.equalizer_settings = Some(EqualizerSettings {
            gains: settings.gains.to_vec(),
            preset: preset.map(str::to_owned),
        });
    }

    /// Selects a factory or custom preset, replacing the stored gains.
    pub fn apply_preset(&mut self, id: &str) -> Result<(), ConfigError> {
        let gains = if let Some(preset) = get_factory_preset(id) {
            preset.gains.to_vec()
        } else if let Some(custom) = self.custom_presets.get(id) {
            custom.gains.clone()
        } else {
            return Err(ConfigError::UnknownPreset(id.to_string()));
        };

        self.equalizer_settings = Some(EqualizerSettings {
            gains: Settings::normalize_gains(&gains).to_vec(),
            preset: Some(id.to_string()),
        });
        Ok(())
    }

    /// Saves `gains` as a user preset and selects it.
    ///
    /// Returns `true` when an existing preset of that name was overwritten.
    pub fn save_custom_preset(&mut self, name: &str, gains: &[f32]) -> Result<bool, ConfigError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidFormat {
                param: "name".to_string(),
                reason: "preset name is empty".to_string(),
            }
            .into());
        }
        if is_reserved_preset_name(name) {
            return Err(ConfigError::ReservedPresetName(name.to_string()));
        }

        let gains = Settings::normalize_gains(gains).to_vec();
        let replaced = self
            .custom_presets
            .insert(
                name.to_string(),
                CustomPreset {
                    name: name.to_string(),
                    gains: gains.clone(),
                },
            )
            .is_some();

        self.equalizer_settings = Some(EqualizerSettings {
            gains,
            preset: Some(name.to_string()),
        });
        Ok(replaced)
    }

    /// Deletes a user preset. Selecting it afterwards falls back to flat.
    pub fn delete_custom_preset(&mut self, name: &str) -> Result<(), ConfigError> {
        if is_reserved_preset_name(name) {
            return Err(ConfigError::ReservedPresetName(name.to_string()));
        }
        if self.custom_presets.remove(name).is_none() {
            return Err(ConfigError::UnknownPreset(name.to_string()));
        }
        if self.preset() == name {
            self.apply_preset(DEFAULT_PRESET_ID)?;
        }
        Ok(())
    }
}

//! Settings state and the messages that carry it.
//!
//! Three shapes are involved:
//!
//! - [`Settings`]: the normalized state every engine converges to. Always
//!   ten clamped gains plus an enabled flag.
//! - [`SettingsMessage`]: what the settings UI sends. Every field is
//!   optional and the gains array may have any length.
//! - [`ChannelMessage`]: the envelope a message travels in, tagged with
//!   `"type": "EQUALIZER_SETTINGS_CHANGED"`.
//!
//! JSON field names are camelCase to match what the UI side produces:
//!
//! ```json
//! {
//!   "type": "EQUALIZER_SETTINGS_CHANGED",
//!   "settings": {
//!     "equalizerEnabled": true,
//!     "equalizerSettings": { "gains": [6, 6, 5, 4, 3, 2, 1, 0, -1, -1], "preset": "bass" }
//!   }
//! }
//! ```

use eqsplice_core::{BAND_COUNT, clamp_gain};
use serde::{Deserialize, Deserializer, Serialize};

use crate::ConfigError;

/// Envelope tag of a settings change.
pub const SETTINGS_CHANGED: &str = "EQUALIZER_SETTINGS_CHANGED";

/// Normalized equalizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Band gains in dB, each within the band range.
    pub gains: [f32; BAND_COUNT],
    /// Whether the equalizer is applied.
    pub enabled: bool,
}

impl Settings {
    /// Builds settings, clamping every gain.
    pub fn new(gains: [f32; BAND_COUNT], enabled: bool) -> Self {
        Self {
            gains: gains.map(clamp_gain),
            enabled,
        }
    }

    /// Pads or truncates `gains` to [`BAND_COUNT`] and clamps each value.
    ///
    /// ```rust
    /// use eqsplice_config::Settings;
    ///
    /// let gains = Settings::normalize_gains(&[3.0, 40.0]);
    /// assert_eq!(gains[..3], [3.0, 12.0, 0.0]);
    /// ```
    pub fn normalize_gains(gains: &[f32]) -> [f32; BAND_COUNT] {
        let mut normalized = [0.0; BAND_COUNT];
        for (slot, &gain) in normalized.iter_mut().zip(gains) {
            *slot = clamp_gain(gain);
        }
        normalized
    }

    /// Folds a settings message into this state.
    ///
    /// A missing enabled flag keeps the current one. Missing gains mean all
    /// zeros, never "keep the previous gains".
    pub fn merge(&mut self, message: &SettingsMessage) {
        if let Some(enabled) = message.equalizer_enabled {
            self.enabled = enabled;
        }
        self.gains = message
            .equalizer_settings
            .as_ref()
            .map_or([0.0; BAND_COUNT], |eq| Self::normalize_gains(&eq.gains));
    }

    /// Whether every band sits at 0 dB.
    pub fn is_flat(&self) -> bool {
        self.gains.iter().all(|&g| g == 0.0)
    }

    /// The message that would reproduce this state on a receiver.
    pub fn to_message(&self, preset: Option<&str>) -> SettingsMessage {
        SettingsMessage {
            equalizer_enabled: Some(self.enabled),
            equalizer_settings: Some(EqualizerSettings {
                gains: self.gains.to_vec(),
                preset: preset.map(str::to_owned),
            }),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gains: [0.0; BAND_COUNT],
            enabled: false,
        }
    }
}

/// A settings change as sent by the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsMessage {
    /// New enabled flag, if the sender included one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equalizer_enabled: Option<bool>,
    /// New band settings, if the sender included them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equalizer_settings: Option<EqualizerSettings>,
}

impl SettingsMessage {
    /// A message that only toggles the equalizer.
    ///
    /// Gains are absent, so receivers reset them to zero.
    pub fn enabled(enabled: bool) -> Self {
        Self {
            equalizer_enabled: Some(enabled),
            equalizer_settings: None,
        }
    }

    /// A message carrying gains and an optional flag.
    pub fn with_gains(gains: impl Into<Vec<f32>>, enabled: Option<bool>) -> Self {
        Self {
            equalizer_enabled: enabled,
            equalizer_settings: Some(EqualizerSettings {
                gains: gains.into(),
                preset: None,
            }),
        }
    }
}

/// Band settings inside a [`SettingsMessage`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EqualizerSettings {
    /// Requested gains in dB; any length, `null` entries read as 0.
    #[serde(default, deserialize_with = "lenient_gains")]
    pub gains: Vec<f32>,
    /// UI preset id. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

// JSON has no NaN; serializers emit `null` instead.
fn lenient_gains<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<f32>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|g| g.unwrap_or(f32::NAN))
        .collect())
}

/// Tagged envelope exchanged between the UI and the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelMessage {
    /// New settings for every engine on the page.
    #[serde(rename = "EQUALIZER_SETTINGS_CHANGED")]
    SettingsChanged {
        /// The change itself.
        settings: SettingsMessage,
    },
}

impl ChannelMessage {
    /// Wraps a settings change.
    pub fn settings_changed(settings: SettingsMessage) -> Self {
        ChannelMessage::SettingsChanged { settings }
    }

    /// Parses an envelope from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the envelope to JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// The carried settings change.
    pub fn into_settings(self) -> SettingsMessage {
        match self {
            ChannelMessage::SettingsChanged { settings } => settings,
        }
    }
}

//! Factory presets offered by the settings UI.
//!
//! Presets are plain gain tables. The engine never sees a preset id; the UI
//! resolves it to gains and sends those.

use eqsplice_core::BAND_COUNT;

use crate::{ConfigError, Settings};

/// A named gain table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqPreset {
    /// Stable identifier, lowercase.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Band gains in dB.
    pub gains: [f32; BAND_COUNT],
}

impl EqPreset {
    /// Settings with this preset's gains.
    pub fn settings(&self, enabled: bool) -> Settings {
        Settings::new(self.gains, enabled)
    }
}

/// Preset id the UI shows when the user edits a preset by hand.
pub const CUSTOM_PRESET_ID: &str = "custom";

/// Preset id used on first run.
pub const DEFAULT_PRESET_ID: &str = "flat";

/// Every factory preset, in menu order.
pub static FACTORY_PRESETS: &[EqPreset] = &[
    EqPreset {
        id: "flat",
        name: "FLAT",
        gains: [0.0; BAND_COUNT],
    },
    EqPreset {
        id: "perfect",
        name: "PERFECT",
        gains: [3.0, 6.0, 9.0, 7.0, 6.0, 5.0, 7.0, 9.0, 11.0, 8.0],
    },
    EqPreset {
        id: "bass",
        name: "BASS BOOST",
        gains: [6.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0, 0.0, -1.0, -1.0],
    },
    EqPreset {
        id: "treble",
        name: "TREBLE BOOST",
        gains: [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 4.0, 6.0, 6.0],
    },
    EqPreset {
        id: "vocal",
        name: "VOCAL",
        gains: [-2.0, -1.0, 0.0, 1.0, 2.0, 4.0, 5.0, 5.0, 4.0, 2.0],
    },
    EqPreset {
        id: "rock",
        name: "ROCK",
        gains: [4.0, 3.0, 2.0, 1.0, 0.0, -1.0, 0.0, 1.0, 2.0, 3.0],
    },
    EqPreset {
        id: "jazz",
        name: "JAZZ",
        gains: [2.0, 2.0, 1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 1.0],
    },
    EqPreset {
        id: "classical",
        name: "CLASSICAL",
        gains: [0.0; BAND_COUNT],
    },
    EqPreset {
        id: "electronic",
        name: "ELECTRONIC",
        gains: [5.0, 4.0, 3.0, 2.0, 1.0, 0.0, 1.0, 2.0, 4.0, 5.0],
    },
];

/// Looks up a factory preset by id.
pub fn get_factory_preset(id: &str) -> Option<&'static EqPreset> {
    FACTORY_PRESETS.iter().find(|p| p.id == id)
}

/// Factory preset ids in menu order.
pub fn factory_preset_ids() -> Vec<&'static str> {
    FACTORY_PRESETS.iter().map(|p| p.id).collect()
}

/// Whether `id` names a factory preset.
pub fn is_factory_preset(id: &str) -> bool {
    get_factory_preset(id).is_some()
}

/// Whether a user preset may not use `name`.
///
/// Factory ids and the `custom` marker are reserved, compared case-insensitively.
pub fn is_reserved_preset_name(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    lower == CUSTOM_PRESET_ID || is_factory_preset(&lower)
}

/// Gains of a factory preset.
pub fn factory_gains(id: &str) -> Result<[f32; BAND_COUNT], ConfigError> {
    get_factory_preset(id)
        .map(|p| p.gains)
        .ok_or_else(|| ConfigError::UnknownPreset(id.to_string()))
}

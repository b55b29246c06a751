//! A single equalizer band: fixed center frequency, mutable gain.

use crate::graph::NodeId;

/// Number of bands in every equalizer.
pub const BAND_COUNT: usize = 10;

/// Band center frequencies in Hz, ascending.
pub const BAND_FREQUENCIES: [f32; BAND_COUNT] = [
    32.0, 64.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Lowest band gain in dB.
pub const MIN_GAIN_DB: f32 = -12.0;

/// Highest band gain in dB.
pub const MAX_GAIN_DB: f32 = 12.0;

/// Default resonance of each peaking stage.
pub const DEFAULT_Q: f32 = 1.0;

/// Clamps a requested band gain to [`MIN_GAIN_DB`]..=[`MAX_GAIN_DB`].
///
/// NaN maps to 0 dB.
///
/// ```rust
/// use eqsplice_core::clamp_gain;
///
/// assert_eq!(clamp_gain(20.0), 12.0);
/// assert_eq!(clamp_gain(f32::NEG_INFINITY), -12.0);
/// assert_eq!(clamp_gain(f32::NAN), 0.0);
/// ```
#[inline]
pub fn clamp_gain(gain_db: f32) -> f32 {
    if gain_db.is_nan() {
        0.0
    } else {
        gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
    }
}

/// One parametric stage of an equalizer.
///
/// `gain_db` is what the user asked for; `applied_db` is what the host filter
/// currently runs with. They differ only while the engine is bypassed.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    frequency_hz: f32,
    gain_db: f32,
    applied_db: f32,
    filter: NodeId,
}

impl Band {
    pub(crate) fn new(frequency_hz: f32, filter: NodeId) -> Self {
        Self {
            frequency_hz,
            gain_db: 0.0,
            applied_db: 0.0,
            filter,
        }
    }

    /// Center frequency in Hz.
    pub fn frequency_hz(&self) -> f32 {
        self.frequency_hz
    }

    /// Stored gain in dB.
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Gain currently applied to the filter stage, in dB.
    pub fn applied_db(&self) -> f32 {
        self.applied_db
    }

    /// Host filter node.
    pub fn filter(&self) -> NodeId {
        self.filter
    }

    pub(crate) fn set_stored(&mut self, gain_db: f32) {
        self.gain_db = gain_db;
    }

    pub(crate) fn set_applied(&mut self, gain_db: f32) {
        self.applied_db = gain_db;
    }
}

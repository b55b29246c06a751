//! Automatic master-gain compensation.
//!
//! Boosting bands raises overall loudness and eventually clips. The master
//! stage after the band chain pulls the level back down by an amount derived
//! from the stored band gains:
//!
//! ```text
//! P        = { g | g > 0 }                  (boosted bands)
//! comp_a   = -max_band_ratio * max(P)
//! comp_b   = -budget_ratio * (sum(P) - budget_db)   if sum(P) > budget_db, else 0
//! comp_db  = max(comp_a + comp_b, floor_db)          (0 when P is empty)
//! master   = 10^(comp_db / 20)
//! ```
//!
//! This is a static perceptual heuristic, not RMS or LUFS metering. The four
//! constants are empirical and tunable through [`Compensation`].

use crate::math::db_to_linear;

/// Tuning of the compensation heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compensation {
    /// Fraction of the loudest boost removed (default 0.63).
    pub max_band_ratio: f32,
    /// Attenuation per dB of cumulative boost beyond the budget (default 0.21).
    pub budget_ratio: f32,
    /// Cumulative boost allowed before the extra term kicks in (default 29 dB).
    pub budget_db: f32,
    /// Lowest compensation ever applied (default -8.5 dB).
    pub floor_db: f32,
}

impl Compensation {
    /// Default fraction of the loudest boost removed.
    pub const MAX_BAND_RATIO: f32 = 0.63;
    /// Default attenuation per dB over budget.
    pub const BUDGET_RATIO: f32 = 0.21;
    /// Default cumulative boost budget in dB.
    pub const BUDGET_DB: f32 = 29.0;
    /// Default compensation floor in dB.
    pub const FLOOR_DB: f32 = -8.5;

    /// Compensation in dB for the given stored band gains.
    ///
    /// ```rust
    /// use eqsplice_core::Compensation;
    ///
    /// let comp = Compensation::default();
    /// let db = comp.compensation_db([6.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0, 0.0, -1.0, -1.0]);
    /// assert!((db - (-3.78)).abs() < 1e-4);
    /// ```
    pub fn compensation_db(&self, gains: impl IntoIterator<Item = f32>) -> f32 {
        let (max_pos, sum_pos) = gains
            .into_iter()
            .filter(|&g| g > 0.0)
            .fold((0.0_f32, 0.0_f32), |(max, sum), g| (max.max(g), sum + g));

        if sum_pos <= 0.0 {
            return 0.0;
        }

        let comp_a = -self.max_band_ratio * max_pos;
        let comp_b = if sum_pos > self.budget_db {
            -self.budget_ratio * (sum_pos - self.budget_db)
        } else {
            0.0
        };
        (comp_a + comp_b).max(self.floor_db)
    }

    /// Linear master gain for the given stored band gains.
    pub fn master_gain(&self, gains: impl IntoIterator<Item = f32>) -> f32 {
        db_to_linear(self.compensation_db(gains))
    }
}

impl Default for Compensation {
    fn default() -> Self {
        Self {
            max_band_ratio: Self::MAX_BAND_RATIO,
            budget_ratio: Self::BUDGET_RATIO,
            budget_db: Self::BUDGET_DB,
            floor_db: Self::FLOOR_DB,
        }
    }
}

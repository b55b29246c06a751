//! Engine tuning, stored as TOML.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! q = 1.0
//! scan_delays_ms = [500, 2000, 5000]
//!
//! [compensation]
//! max_band_ratio = 0.63
//! budget_ratio = 0.21
//! budget_db = 29.0
//! floor_db = -8.5
//!
//! [retry]
//! load_timeout_ms = 1000
//! initial_delay_ms = 100
//! multiplier = 2.0
//! max_delay_ms = 1000
//! max_attempts = 10
//! ```

use std::path::Path;
use std::time::Duration;

use eqsplice_core::{Compensation, DEFAULT_Q};
use serde::{Deserialize, Serialize};

use crate::ConfigError;
use crate::validation::validate_engine_config;

/// Tuning shared by every engine and by the element watcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Resonance of every band.
    pub q: f32,
    /// Offsets from startup at which the page is rescanned for elements.
    pub scan_delays_ms: Vec<u64>,
    /// Master-gain compensation constants.
    pub compensation: CompensationConfig,
    /// Readiness polling for elements that are not playable yet.
    pub retry: RetryPolicy,
}

impl EngineConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load from `path` if it exists, otherwise return the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse a configuration from a TOML string.
    ///
    /// Parsed values must pass [`validate_engine_config`].
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        validate_engine_config(&config)?;
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rescan offsets as durations.
    pub fn scan_delays(&self) -> Vec<Duration> {
        self.scan_delays_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            q: DEFAULT_Q,
            scan_delays_ms: vec![500, 2000, 5000],
            compensation: CompensationConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Serializable mirror of [`Compensation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensationConfig {
    /// Fraction of the loudest boost removed.
    pub max_band_ratio: f32,
    /// Attenuation per dB of cumulative boost over budget.
    pub budget_ratio: f32,
    /// Cumulative boost budget in dB.
    pub budget_db: f32,
    /// Lowest compensation in dB.
    pub floor_db: f32,
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Compensation::default().into()
    }
}

impl From<Compensation> for CompensationConfig {
    fn from(c: Compensation) -> Self {
        Self {
            max_band_ratio: c.max_band_ratio,
            budget_ratio: c.budget_ratio,
            budget_db: c.budget_db,
            floor_db: c.floor_db,
        }
    }
}

impl From<CompensationConfig> for Compensation {
    fn from(c: CompensationConfig) -> Self {
        Self {
            max_band_ratio: c.max_band_ratio,
            budget_ratio: c.budget_ratio,
            budget_db: c.budget_db,
            floor_db: c.floor_db,
        }
    }
}

/// How long to wait for an element to become playable.
///
/// The first check happens `load_timeout_ms` after the element is seen,
/// unless a load-complete notification arrives earlier. Later checks start
/// at `initial_delay_ms` and grow by `multiplier` up to `max_delay_ms`.
/// After `max_attempts` checks the element is dropped until the next scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Wait before the first readiness check.
    pub load_timeout_ms: u64,
    /// Delay of the first poll after that.
    pub initial_delay_ms: u64,
    /// Growth factor between polls.
    pub multiplier: f32,
    /// Upper bound on the delay between polls.
    pub max_delay_ms: u64,
    /// Readiness checks before giving up.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// [`RetryPolicy::load_timeout_ms`] as a duration.
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// [`RetryPolicy::initial_delay_ms`] as a duration.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// [`RetryPolicy::max_delay_ms`] as a duration.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            load_timeout_ms: 1000,
            initial_delay_ms: 100,
            multiplier: 2.0,
            max_delay_ms: 1000,
            max_attempts: 10,
        }
    }
}

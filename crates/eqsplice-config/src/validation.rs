//! Range checks for engine tuning and gain tables.
//!
//! # Example
//!
//! ```rust
//! use eqsplice_config::{EngineConfig, validate_engine_config, validate_gains};
//!
//! validate_engine_config(&EngineConfig::default()).expect("defaults are valid");
//! assert!(validate_gains(&[0.0, 13.0]).is_err());
//! ```

use eqsplice_core::{MAX_GAIN_DB, MIN_GAIN_DB};
use thiserror::Error;

use crate::EngineConfig;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the parameter.
        param: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Invalid parameter format.
    #[error("invalid format for parameter '{param}': {reason}")]
    InvalidFormat {
        /// Name of the parameter.
        param: String,
        /// Description of the format error.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Band Q bounds accepted by [`validate_engine_config`].
pub const Q_RANGE: (f32, f32) = (0.1, 10.0);

fn check_range(errors: &mut Vec<ValidationError>, param: &str, value: f32, min: f32, max: f32) {
    // NaN is never contained, so it is reported too.
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::OutOfRange {
            param: param.to_string(),
            value,
            min,
            max,
        });
    }
}

fn finish(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Validate engine tuning.
pub fn validate_engine_config(config: &EngineConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    check_range(&mut errors, "q", config.q, Q_RANGE.0, Q_RANGE.1);

    let comp = &config.compensation;
    check_range(&mut errors, "compensation.max_band_ratio", comp.max_band_ratio, 0.0, 1.0);
    check_range(&mut errors, "compensation.budget_ratio", comp.budget_ratio, 0.0, 1.0);
    check_range(&mut errors, "compensation.budget_db", comp.budget_db, 0.0, 120.0);
    check_range(&mut errors, "compensation.floor_db", comp.floor_db, -60.0, 0.0);

    let retry = &config.retry;
    check_range(&mut errors, "retry.multiplier", retry.multiplier, 1.0, 10.0);
    if retry.initial_delay_ms == 0 {
        errors.push(ValidationError::InvalidFormat {
            param: "retry.initial_delay_ms".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    if retry.max_delay_ms < retry.initial_delay_ms {
        errors.push(ValidationError::InvalidFormat {
            param: "retry.max_delay_ms".to_string(),
            reason: format!(
                "{} is below initial_delay_ms {}",
                retry.max_delay_ms, retry.initial_delay_ms
            ),
        });
    }
    if retry.max_attempts == 0 {
        errors.push(ValidationError::InvalidFormat {
            param: "retry.max_attempts".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    if !config.scan_delays_ms.windows(2).all(|w| w[0] < w[1]) {
        errors.push(ValidationError::InvalidFormat {
            param: "scan_delays_ms".to_string(),
            reason: "offsets must be strictly increasing".to_string(),
        });
    }

    finish(errors)
}

/// Validate a gain table as sent by a UI.
///
/// Lengths other than ten are accepted (they are padded or truncated on
/// merge); each value must be within the band range.
pub fn validate_gains(gains: &[f32]) -> ValidationResult<()> {
    let mut errors = Vec::new();
    for (i, &gain) in gains.iter().enumerate() {
        check_range(&mut errors, &format!("gains[{i}]"), gain, MIN_GAIN_DB, MAX_GAIN_DB);
    }
    finish(errors)
}

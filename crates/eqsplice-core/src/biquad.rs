//! Biquad (bi-quadratic) filter stage.
//!
//! A second-order IIR section configured by [`FilterSpec`]. Coefficients come
//! from the RBJ Audio EQ Cookbook. The equalizer bands are all
//! [`FilterType::Peaking`]; the other responses exist because the host filter
//! capability is a general frequency-selective stage.

use core::f32::consts::PI;
use libm::{cosf, powf, sinf};

use crate::effect::Effect;
use crate::math::flush_denormal;

/// Normalizable coefficient set `(b0, b1, b2, a0, a1, a2)`.
pub type Coefficients = (f32, f32, f32, f32, f32, f32);

/// Frequency response of a filter stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    /// Second-order low-pass.
    Lowpass,
    /// Second-order high-pass.
    Highpass,
    /// Band-pass with constant 0 dB peak gain.
    Bandpass,
    /// Band-reject.
    Notch,
    /// Bell boost/cut around the center frequency. Only this type uses `gain_db`.
    Peaking,
}

impl FilterType {
    /// Computes cookbook coefficients for this response.
    pub fn coefficients(self, frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Coefficients {
        match self {
            FilterType::Lowpass => lowpass_coefficients(frequency, q, sample_rate),
            FilterType::Highpass => highpass_coefficients(frequency, q, sample_rate),
            FilterType::Bandpass => bandpass_coefficients(frequency, q, sample_rate),
            FilterType::Notch => notch_coefficients(frequency, q, sample_rate),
            FilterType::Peaking => peaking_eq_coefficients(frequency, q, gain_db, sample_rate),
        }
    }
}

/// Configuration of a host filter stage: type, center frequency, resonance, gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    /// Response shape.
    pub filter_type: FilterType,
    /// Center/cutoff frequency in Hz.
    pub frequency: f32,
    /// Resonance (bandwidth = frequency / Q).
    pub q: f32,
    /// Gain in dB (peaking only).
    pub gain_db: f32,
}

impl FilterSpec {
    /// A peaking stage at `frequency` with the given Q and 0 dB gain.
    pub fn peaking(frequency: f32, q: f32) -> Self {
        Self {
            filter_type: FilterType::Peaking,
            frequency,
            q,
            gain_db: 0.0,
        }
    }
}

/// Generic biquad filter coefficients and state.
///
/// Implements the Direct Form I structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Sets the coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, (b0, b1, b2, a0, a1, a2): Coefficients) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = flush_denormal(output);

        output
    }

    /// Clears the delay lines without touching the coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`Biquad`] bound to a [`FilterSpec`] and a sample rate.
///
/// This is the stateful filter behind a host filter node. Changing the gain
/// recomputes coefficients but keeps the delay lines, so a live stream does
/// not click on every slider move.
#[derive(Debug, Clone)]
pub struct FilterStage {
    spec: FilterSpec,
    sample_rate: f32,
    biquad: Biquad,
}

impl FilterStage {
    /// Creates a stage with coefficients computed for `spec`.
    pub fn new(spec: FilterSpec, sample_rate: f32) -> Self {
        let mut stage = Self {
            spec,
            sample_rate,
            biquad: Biquad::new(),
        };
        stage.update_coefficients();
        stage
    }

    /// Current configuration.
    pub fn spec(&self) -> FilterSpec {
        self.spec
    }

    /// Sets the peaking gain in dB and recomputes coefficients.
    pub fn set_gain_db(&mut self, gain_db: f32) {
        self.spec.gain_db = gain_db;
        self.update_coefficients();
    }

    /// Current gain in dB.
    pub fn gain_db(&self) -> f32 {
        self.spec.gain_db
    }

    fn update_coefficients(&mut self) {
        let coeffs = self.spec.filter_type.coefficients(
            self.spec.frequency,
            self.spec.q,
            self.spec.gain_db,
            self.sample_rate,
        );
        self.biquad.set_coefficients(coeffs);
    }
}

impl Effect for FilterStage {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.biquad.process(input)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
    }

    fn reset(&mut self) {
        self.biquad.clear();
    }
}

/// Calculates low-pass coefficients (RBJ cookbook).
pub fn lowpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> Coefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = (1.0 - cos_omega) / 2.0;
    let b1 = 1.0 - cos_omega;
    let b2 = (1.0 - cos_omega) / 2.0;
    (b0, b1, b2, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// Calculates high-pass coefficients (RBJ cookbook).
pub fn highpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> Coefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = (1.0 + cos_omega) / 2.0;
    let b1 = -(1.0 + cos_omega);
    let b2 = (1.0 + cos_omega) / 2.0;
    (b0, b1, b2, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// Calculates band-pass coefficients with constant 0 dB peak gain (RBJ cookbook).
pub fn bandpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> Coefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// Calculates notch coefficients (RBJ cookbook).
pub fn notch_coefficients(frequency: f32, q: f32, sample_rate: f32) -> Coefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    (1.0, -2.0 * cos_omega, 1.0, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// Calculates peaking EQ coefficients (RBJ cookbook).
///
/// Boosts or cuts around `frequency` by `gain_db`; at 0 dB the stage is an
/// exact passthrough.
pub fn peaking_eq_coefficients(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Coefficients {
    let a = powf(10.0, gain_db / 40.0); // sqrt(10^(dB/20))
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = 1.0 + alpha * a;
    let b1 = -2.0 * cos_omega;
    let b2 = 1.0 - alpha * a;
    let a0 = 1.0 + alpha / a;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha / a;
    (b0, b1, b2, a0, a1, a2)
}

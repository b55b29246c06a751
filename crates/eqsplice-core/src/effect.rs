//! Core processing trait shared by every stage in the reference host.
//!
//! A host node that transforms audio (filter, gain) implements [`Effect`].
//! Mono `f32` in, `f32` out; the trait stays object-safe so the host can keep
//! heterogeneous stages behind one enum or `dyn Effect`.

/// Sample-by-sample audio processor.
///
/// # Example
///
/// ```rust
/// use eqsplice_core::Effect;
///
/// struct Halve;
///
/// impl Effect for Halve {
///     fn process(&mut self, input: f32) -> f32 {
///         input * 0.5
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f32) {}
///
///     fn reset(&mut self) {}
/// }
///
/// let mut halve = Halve;
/// assert_eq!(halve.process(1.0), 0.5);
/// ```
pub trait Effect {
    /// Process a single sample, advancing any internal state by one step.
    fn process(&mut self, input: f32) -> f32;

    /// Process a block of samples.
    ///
    /// # Panics
    /// Debug builds panic if `input.len() != output.len()`.
    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(
            input.len(),
            output.len(),
            "Input and output buffers must have same length"
        );
        for (inp, out) in input.iter().zip(output.iter_mut()) {
            *out = self.process(*inp);
        }
    }

    /// Process a block in place.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Recalculate sample-rate-dependent state.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear internal state without touching parameters.
    fn reset(&mut self);
}

/// Linear gain stage. The master-gain node of an equalizer is one of these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainStage {
    gain: f32,
}

impl GainStage {
    /// Creates a stage with the given linear gain.
    pub fn new(gain: f32) -> Self {
        Self { gain }
    }

    /// Current linear gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Sets the linear gain.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }
}

impl Default for GainStage {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Effect for GainStage {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * self.gain
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {}

    fn reset(&mut self) {}
}

//! The 10-band equalizer engine.
//!
//! An [`EqualizerEngine`] owns a chain of ten peaking filter stages followed
//! by a master gain stage, all living in one host context:
//!
//! ```text
//! input -> band[0] -> band[1] -> ... -> band[9] -> master -> (destination)
//! ```
//!
//! The engine keeps two gains per band. The *stored* gain is what the user
//! asked for. The *applied* gain is what the filter currently runs with: equal
//! to the stored gain while active, 0 dB while bypassed. Toggling the engine
//! therefore never loses settings.
//!
//! Every gain or mode mutation re-runs [`Compensation`] and pushes the result
//! into the master stage.
//!
//! The engine holds only host handles, so each mutating call receives the
//! host explicitly.

pub mod band;
pub mod compensation;

use crate::biquad::FilterSpec;
use crate::graph::{AudioGraph, ContextId, GraphError, NodeId};
use crate::math::db_to_linear;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

pub use band::{
    BAND_COUNT, BAND_FREQUENCIES, Band, DEFAULT_Q, MAX_GAIN_DB, MIN_GAIN_DB, clamp_gain,
};
pub use compensation::Compensation;

/// Operating mode of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Built, never switched on or off. Behaves like [`EngineState::Bypassed`].
    Uninitialized,
    /// Filters run flat and the master stage is at unity.
    Bypassed,
    /// Stored gains and compensation are applied.
    Active,
}

/// Ten peaking bands plus a compensating master stage in one host context.
#[derive(Debug, Clone)]
pub struct EqualizerEngine {
    context: ContextId,
    bands: Vec<Band>,
    master: NodeId,
    state: EngineState,
    compensation: Compensation,
    compensation_db: f32,
}

impl EqualizerEngine {
    /// Builds the band chain in `context` with default Q and compensation.
    ///
    /// The master stage is left unconnected; wiring it to the destination is
    /// the caller's decision.
    pub fn new<G>(graph: &mut G, context: ContextId) -> Result<Self, GraphError>
    where
        G: AudioGraph + ?Sized,
    {
        Self::with_config(graph, context, DEFAULT_Q, Compensation::default())
    }

    /// Builds the band chain with an explicit Q and compensation tuning.
    pub fn with_config<G>(
        graph: &mut G,
        context: ContextId,
        q: f32,
        compensation: Compensation,
    ) -> Result<Self, GraphError>
    where
        G: AudioGraph + ?Sized,
    {
        let mut bands = Vec::with_capacity(BAND_COUNT);
        for &frequency in &BAND_FREQUENCIES {
            let filter = graph.create_filter(context, FilterSpec::peaking(frequency, q))?;
            bands.push(Band::new(frequency, filter));
        }
        let master = graph.create_gain(context, 1.0)?;

        for pair in bands.windows(2) {
            graph.connect(pair[0].filter(), pair[1].filter())?;
        }
        graph.connect(bands[BAND_COUNT - 1].filter(), master)?;

        Ok(Self {
            context,
            bands,
            master,
            state: EngineState::Uninitialized,
            compensation,
            compensation_db: 0.0,
        })
    }

    // --- Gain control ---

    /// Stores a clamped gain for band `index` and applies it if active.
    ///
    /// Indices outside `0..BAND_COUNT` are ignored.
    pub fn set_band_gain<G>(&mut self, graph: &mut G, index: usize, gain_db: f32) -> Result<(), GraphError>
    where
        G: AudioGraph + ?Sized,
    {
        let enabled = self.is_enabled();
        let Some(band) = self.bands.get_mut(index) else {
            return Ok(());
        };
        let gain_db = clamp_gain(gain_db);
        band.set_stored(gain_db);

        let applied = if enabled { gain_db } else { 0.0 };
        graph.set_filter_gain(band.filter(), applied)?;
        band.set_applied(applied);

        self.update_master_gain(graph)
    }

    /// Stored gain of band `index`, or 0 when out of range.
    pub fn band_gain(&self, index: usize) -> f32 {
        self.bands.get(index).map_or(0.0, Band::gain_db)
    }

    /// Gain currently applied to band `index`'s filter, or 0 when out of range.
    pub fn applied_gain(&self, index: usize) -> f32 {
        self.bands.get(index).map_or(0.0, Band::applied_db)
    }

    /// Switches between active and bypassed.
    ///
    /// Turning on re-applies every stored gain; turning off applies 0 dB to
    /// every filter and leaves stored gains untouched.
    pub fn set_enabled<G>(&mut self, graph: &mut G, enabled: bool) -> Result<(), GraphError>
    where
        G: AudioGraph + ?Sized,
    {
        self.state = if enabled {
            EngineState::Active
        } else {
            EngineState::Bypassed
        };

        for band in &mut self.bands {
            let applied = if enabled { band.gain_db() } else { 0.0 };
            graph.set_filter_gain(band.filter(), applied)?;
            band.set_applied(applied);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(context = %self.context, enabled, "equalizer mode changed");

        self.update_master_gain(graph)
    }

    /// Whether stored gains are applied.
    pub fn is_enabled(&self) -> bool {
        self.state == EngineState::Active
    }

    /// Current operating mode.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Zeroes every stored and applied gain and puts the master at unity.
    ///
    /// The operating mode is unchanged.
    pub fn reset<G>(&mut self, graph: &mut G) -> Result<(), GraphError>
    where
        G: AudioGraph + ?Sized,
    {
        for band in &mut self.bands {
            graph.set_filter_gain(band.filter(), 0.0)?;
            band.set_stored(0.0);
            band.set_applied(0.0);
        }
        graph.set_gain(self.master, 1.0)?;
        self.compensation_db = 0.0;
        Ok(())
    }

    fn update_master_gain<G>(&mut self, graph: &mut G) -> Result<(), GraphError>
    where
        G: AudioGraph + ?Sized,
    {
        let db = if self.is_enabled() {
            self.compensation
                .compensation_db(self.bands.iter().map(Band::gain_db))
        } else {
            0.0
        };
        graph.set_gain(self.master, db_to_linear(db))?;

        #[cfg(feature = "tracing")]
        if db != self.compensation_db {
            tracing::trace!(context = %self.context, compensation_db = db, "master gain updated");
        }

        self.compensation_db = db;
        Ok(())
    }

    // --- Introspection ---

    /// The fixed center frequencies, ascending.
    pub fn frequencies(&self) -> [f32; BAND_COUNT] {
        BAND_FREQUENCIES
    }

    /// Always [`BAND_COUNT`].
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// The bands in chain order.
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Current compensation in dB (0 while bypassed).
    pub fn compensation_db(&self) -> f32 {
        self.compensation_db
    }

    /// Current master gain as a linear factor.
    pub fn master_gain(&self) -> f32 {
        db_to_linear(self.compensation_db)
    }

    /// Compensation tuning in use.
    pub fn compensation(&self) -> Compensation {
        self.compensation
    }

    /// The context this engine lives in.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Where upstream audio enters the chain (band 0).
    pub fn input(&self) -> NodeId {
        self.bands[0].filter()
    }

    /// The master gain stage, the chain's last node.
    pub fn output(&self) -> NodeId {
        self.master
    }

    /// Whether `node` is one of this engine's own stages.
    pub fn owns(&self, node: NodeId) -> bool {
        node == self.master || self.bands.iter().any(|b| b.filter() == node)
    }
}

//! eqsplice Core - 10-band equalizer engine and host audio-graph contract
//!
//! This crate holds everything that does not depend on how audio reaches the
//! equalizer: the DSP stages, the engine that owns them, and the capability
//! trait a host audio platform has to provide.
//!
//! # Core Abstractions
//!
//! ## Engine
//!
//! - [`EqualizerEngine`] - Ten peaking bands plus a compensating master stage
//! - [`Compensation`] - Static auto-gain heuristic driving the master stage
//! - [`EngineState`] - Uninitialized, bypassed, or active
//!
//! ## Host Graph
//!
//! - [`AudioGraph`] - Contexts, nodes, edges, and playback elements
//! - [`MemoryGraph`] - In-memory reference host that can render audio
//! - [`GraphError`] - Failures reported by a host
//!
//! ## DSP
//!
//! - [`Biquad`] / [`FilterStage`] - RBJ cookbook second-order sections
//! - [`GainStage`] - Linear gain
//! - [`Effect`] - Object-safe per-sample processing trait
//!
//! # no_std Support
//!
//! The engine and DSP stages are `no_std` compatible. Disable the default
//! `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! eqsplice-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use eqsplice_core::{AudioGraph, EqualizerEngine, MemoryGraph};
//!
//! let mut host = MemoryGraph::new(48000.0);
//! let ctx = host.create_context();
//! let mut eq = EqualizerEngine::new(&mut host, ctx).unwrap();
//!
//! let dest = host.destination(ctx).unwrap();
//! host.connect(eq.output(), dest).unwrap();
//!
//! eq.set_enabled(&mut host, true).unwrap();
//! eq.set_band_gain(&mut host, 0, 6.0).unwrap();
//! assert!(eq.master_gain() < 1.0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod effect;
pub mod engine;
pub mod graph;
pub mod math;

pub use biquad::{
    Biquad, Coefficients, FilterSpec, FilterStage, FilterType, bandpass_coefficients,
    highpass_coefficients, lowpass_coefficients, notch_coefficients, peaking_eq_coefficients,
};
pub use effect::{Effect, GainStage};
pub use engine::{
    BAND_COUNT, BAND_FREQUENCIES, Band, Compensation, DEFAULT_Q, EngineState, EqualizerEngine,
    MAX_GAIN_DB, MIN_GAIN_DB, clamp_gain,
};
pub use graph::{
    AudioGraph, ContextId, ElementId, GraphError, MemoryGraph, NodeId, NodeKind, ReadyState,
    SourceKind,
};
pub use math::{db_to_linear, flush_denormal, linear_to_db};

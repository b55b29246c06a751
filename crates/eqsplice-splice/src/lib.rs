//! eqsplice Splice - transparent equalizer insertion into a host audio graph
//!
//! Page code builds its audio graph without knowing about the equalizer.
//! This crate sits between that code and the host and makes sure every path
//! to a destination runs through one [`EqualizerEngine`](eqsplice_core::EqualizerEngine)
//! per context.
//!
//! # Components
//!
//! - [`SplicingGraph`] - [`AudioGraph`](eqsplice_core::AudioGraph) decorator
//!   intercepting element attachment and destination connects
//! - [`EngineRegistry`] - At most one engine per context
//! - [`MediaElementWatcher`] - Scans for playback elements and retries until they can play
//! - [`SettingsChannel`] - Ordered delivery of settings changes to every engine
//! - [`Processed`] - Idempotence marks for elements, nodes, and contexts
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use eqsplice_config::{EngineConfig, SettingsMessage};
//! use eqsplice_core::MemoryGraph;
//! use eqsplice_splice::{MediaElementWatcher, SettingsChannel, SplicingGraph};
//!
//! let config = EngineConfig::default();
//! let mut graph = SplicingGraph::with_config(MemoryGraph::new(48000.0), &config);
//! let mut watcher = MediaElementWatcher::new(&config);
//! let mut channel = SettingsChannel::new();
//!
//! let element = graph.inner_mut().add_element(vec![0.25; 64]);
//! let spliced = watcher.tick(&mut graph, Duration::from_millis(500));
//! assert!(spliced[0].1.is_spliced());
//!
//! channel.post(SettingsMessage::with_gains(vec![6.0; 10], Some(true)));
//! channel.deliver(&mut graph);
//! let ctx = spliced[0].1.context().unwrap();
//! assert!(graph.engine(ctx).unwrap().is_enabled());
//! # let _ = element;
//! ```

mod backoff;
mod channel;
mod error;
mod interceptor;
mod processed;
mod registry;
mod watcher;

pub use backoff::Backoff;
pub use channel::SettingsChannel;
pub use error::{SpliceError, SpliceResult};
pub use interceptor::{SpliceOutcome, SplicingGraph};
pub use processed::{Processed, ProcessedSet};
pub use registry::EngineRegistry;
pub use watcher::MediaElementWatcher;

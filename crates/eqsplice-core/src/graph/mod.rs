//! Host audio-graph abstraction.
//!
//! The equalizer never touches platform primitives directly. It depends on the
//! [`AudioGraph`] trait, which names exactly the capabilities it needs:
//! contexts with a real destination, filter and gain stages, ordered
//! connections, and two ways of turning a playback element into a source.
//!
//! # Handles
//!
//! [`ContextId`], [`NodeId`] and [`ElementId`] are arena indices. They are
//! assigned sequentially and never reused, so identity-keyed bookkeeping
//! (registries, processed sets) can key on them directly.
//!
//! # Reference host
//!
//! [`MemoryGraph`] is a complete in-memory implementation that renders mono
//! audio. It backs the test suites and doubles as a headless host.
//!
//! ```rust
//! use eqsplice_core::graph::{AudioGraph, MemoryGraph, NodeKind};
//!
//! let mut host = MemoryGraph::new(48000.0);
//! let ctx = host.create_context();
//! let dest = host.destination(ctx).unwrap();
//! assert_eq!(host.node_kind(dest), Some(NodeKind::Destination));
//! ```

pub mod host;
pub mod memory;
pub mod node;

pub use host::{AudioGraph, GraphError};
pub use memory::MemoryGraph;
pub use node::{ContextId, ElementId, NodeId, NodeKind, ReadyState, SourceKind};

//! The host audio-platform capability contract.
//!
//! Everything above this trait (the equalizer engine, the splicing proxy)
//! talks to the audio platform only through [`AudioGraph`]. A browser binding,
//! a native backend, or the in-memory [`MemoryGraph`](super::MemoryGraph) can
//! sit underneath.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::biquad::FilterSpec;

use super::node::{ContextId, ElementId, NodeId, NodeKind, ReadyState};

/// Errors reported by a host audio graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The context does not exist.
    ContextNotFound(ContextId),
    /// The context has been closed by its owner.
    ContextClosed(ContextId),
    /// The node does not exist (or its context was closed).
    NodeNotFound(NodeId),
    /// The playback element does not exist.
    ElementNotFound(ElementId),
    /// The element is already attached to a context and cannot be attached again.
    AlreadyAttached(ElementId),
    /// The host lacks the requested capability.
    Unsupported(&'static str),
    /// The operation does not apply to this kind of node.
    WrongNodeKind(NodeId),
    /// Adding this edge would create a cycle.
    CycleDetected,
    /// The connection is structurally invalid.
    InvalidConnection(String),
}

impl core::fmt::Display for GraphError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ContextNotFound(id) => write!(f, "context {id} not found"),
            Self::ContextClosed(id) => write!(f, "context {id} is closed"),
            Self::NodeNotFound(id) => write!(f, "node {id} not found"),
            Self::ElementNotFound(id) => write!(f, "element {id} not found"),
            Self::AlreadyAttached(id) => {
                write!(f, "element {id} is already attached to a context")
            }
            Self::Unsupported(what) => write!(f, "unsupported capability: {what}"),
            Self::WrongNodeKind(id) => write!(f, "operation not valid for node {id}"),
            Self::CycleDetected => write!(f, "adding this edge would create a cycle"),
            Self::InvalidConnection(msg) => write!(f, "invalid connection: {msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GraphError {}

/// Capabilities the equalizer needs from the audio platform.
///
/// Mirrors the platform's own primitives: contexts own nodes, nodes are
/// connected in an ordered topology, playback elements can be turned into
/// source nodes in two ways.
pub trait AudioGraph {
    /// Creates a new processing context with its own destination node.
    fn create_context(&mut self) -> ContextId;

    /// Discards a context and every node in it.
    fn close_context(&mut self, context: ContextId) -> Result<(), GraphError>;

    /// The context's real output device.
    fn destination(&self, context: ContextId) -> Result<NodeId, GraphError>;

    /// Creates a stateful frequency-selective filter stage.
    fn create_filter(&mut self, context: ContextId, spec: FilterSpec) -> Result<NodeId, GraphError>;

    /// Creates a linear gain stage.
    fn create_gain(&mut self, context: ContextId, gain: f32) -> Result<NodeId, GraphError>;

    /// Creates a page-owned source playing `samples`.
    fn create_buffer_source(
        &mut self,
        context: ContextId,
        samples: Vec<f32>,
    ) -> Result<NodeId, GraphError>;

    /// Attaches a playback element directly to a context.
    ///
    /// Fails with [`GraphError::AlreadyAttached`] when the element was attached before.
    fn create_element_source(
        &mut self,
        context: ContextId,
        element: ElementId,
    ) -> Result<NodeId, GraphError>;

    /// Captures a stream from a playback element and wraps it in a source node.
    ///
    /// Fails with [`GraphError::Unsupported`] when the element cannot capture.
    fn create_stream_source(
        &mut self,
        context: ContextId,
        element: ElementId,
    ) -> Result<NodeId, GraphError>;

    /// Sets the gain of a filter stage in dB.
    fn set_filter_gain(&mut self, node: NodeId, gain_db: f32) -> Result<(), GraphError>;

    /// Sets the linear gain of a gain stage.
    fn set_gain(&mut self, node: NodeId, gain: f32) -> Result<(), GraphError>;

    /// Connects `from`'s output to `to`'s input and returns `to`.
    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<NodeId, GraphError>;

    /// Removes every outgoing connection of `node`.
    fn disconnect(&mut self, node: NodeId) -> Result<(), GraphError>;

    /// Classifies a node, or `None` if it does not exist.
    fn node_kind(&self, node: NodeId) -> Option<NodeKind>;

    /// The context owning a node, or `None` if it does not exist.
    fn node_context(&self, node: NodeId) -> Option<ContextId>;

    /// All playback elements currently present in the document.
    fn media_elements(&self) -> Vec<ElementId>;

    /// Readiness of a playback element.
    fn ready_state(&self, element: ElementId) -> Option<ReadyState>;

    /// Whether the element has media assigned (a URL or a stream object).
    fn has_source(&self, element: ElementId) -> bool;
}

//! In-memory reference host.
//!
//! [`MemoryGraph`] implements [`AudioGraph`] over plain arenas and can render
//! a context's output, which makes the splicing logic testable end to end:
//! build a page's graph, let the proxy rewrite it, then listen to the result.
//!
//! Rendering is mono and pull-free: nodes are evaluated once per sample in
//! topological order, each node's output is added into the inputs of its
//! successors, and the destination's summed input is the rendered sample.

#[cfg(not(feature = "std"))]
use alloc::{format, vec, vec::Vec};

use crate::biquad::{FilterSpec, FilterStage};
use crate::effect::{Effect, GainStage};

use super::host::{AudioGraph, GraphError};
use super::node::{ContextId, ElementId, NodeId, NodeKind, ReadyState, SourceKind};

/// Plays a fixed buffer once, then silence.
#[derive(Debug, Clone)]
struct SampleSource {
    samples: Vec<f32>,
    position: usize,
}

impl SampleSource {
    fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            position: 0,
        }
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        let sample = self.samples.get(self.position).copied().unwrap_or(0.0);
        self.position = self.position.saturating_add(1);
        sample
    }
}

#[derive(Debug, Clone)]
enum Stage {
    Source(SampleSource),
    Filter(FilterStage),
    Gain(GainStage),
    Destination,
}

#[derive(Debug)]
struct NodeData {
    context: ContextId,
    kind: NodeKind,
    stage: Stage,
    outgoing: Vec<NodeId>,
}

#[derive(Debug)]
struct ContextData {
    destination: NodeId,
}

#[derive(Debug)]
struct ElementData {
    samples: Vec<f32>,
    ready: ReadyState,
    has_source: bool,
    capture_supported: bool,
    attached: bool,
    removed: bool,
}

/// Arena-backed [`AudioGraph`] that renders audio.
///
/// # Example
///
/// ```rust
/// use eqsplice_core::graph::{AudioGraph, MemoryGraph};
///
/// let mut host = MemoryGraph::new(48000.0);
/// let ctx = host.create_context();
/// let src = host.create_buffer_source(ctx, vec![0.5; 4]).unwrap();
/// let dest = host.destination(ctx).unwrap();
/// host.connect(src, dest).unwrap();
///
/// assert_eq!(host.render(ctx, 4).unwrap(), vec![0.5; 4]);
/// ```
#[derive(Debug)]
pub struct MemoryGraph {
    sample_rate: f32,
    contexts: Vec<Option<ContextData>>,
    nodes: Vec<Option<NodeData>>,
    elements: Vec<ElementData>,
}

impl MemoryGraph {
    /// Creates an empty host running at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            contexts: Vec::new(),
            nodes: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// Sample rate shared by every context.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    // --- Playback elements ---

    /// Adds a fully buffered playback element that plays `samples`.
    pub fn add_element(&mut self, samples: Vec<f32>) -> ElementId {
        let id = ElementId(self.elements.len() as u32);
        self.elements.push(ElementData {
            samples,
            ready: ReadyState::HaveEnoughData,
            has_source: true,
            capture_supported: true,
            attached: false,
            removed: false,
        });
        id
    }

    /// Updates an element's readiness.
    pub fn set_ready_state(&mut self, element: ElementId, ready: ReadyState) -> Result<(), GraphError> {
        self.element_mut(element)?.ready = ready;
        Ok(())
    }

    /// Enables or disables stream capture for an element.
    pub fn set_capture_supported(&mut self, element: ElementId, supported: bool) -> Result<(), GraphError> {
        self.element_mut(element)?.capture_supported = supported;
        Ok(())
    }

    /// Assigns or clears the element's media.
    pub fn set_has_source(&mut self, element: ElementId, has_source: bool) -> Result<(), GraphError> {
        self.element_mut(element)?.has_source = has_source;
        Ok(())
    }

    /// Removes the element from the document. Its handle stays invalid afterwards.
    pub fn remove_element(&mut self, element: ElementId) -> Result<(), GraphError> {
        self.element_mut(element)?.removed = true;
        Ok(())
    }

    // --- Introspection ---

    /// Nodes that `node` currently feeds.
    pub fn outgoing(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(|n| n.outgoing.as_slice()).unwrap_or(&[])
    }

    /// Number of edges arriving at `node`.
    pub fn incoming_count(&self, node: NodeId) -> usize {
        self.nodes
            .iter()
            .flatten()
            .filter(|n| n.outgoing.contains(&node))
            .count()
    }

    /// Current dB gain of a filter node.
    pub fn filter_gain(&self, node: NodeId) -> Option<f32> {
        match &self.node(node).ok()?.stage {
            Stage::Filter(filter) => Some(filter.gain_db()),
            _ => None,
        }
    }

    /// Current filter configuration of a filter node.
    pub fn filter_spec(&self, node: NodeId) -> Option<FilterSpec> {
        match &self.node(node).ok()?.stage {
            Stage::Filter(filter) => Some(filter.spec()),
            _ => None,
        }
    }

    /// Current linear gain of a gain node.
    pub fn stage_gain(&self, node: NodeId) -> Option<f32> {
        match &self.node(node).ok()?.stage {
            Stage::Gain(gain) => Some(gain.gain()),
            _ => None,
        }
    }

    /// Number of contexts ever created and still open.
    pub fn open_contexts(&self) -> usize {
        self.contexts.iter().flatten().count()
    }

    /// Whether `context` exists and has not been closed.
    pub fn is_open(&self, context: ContextId) -> bool {
        matches!(self.contexts.get(context.0 as usize), Some(Some(_)))
    }

    /// Live nodes in `context`, destination included.
    pub fn node_count(&self, context: ContextId) -> usize {
        self.nodes
            .iter()
            .flatten()
            .filter(|n| n.context == context)
            .count()
    }

    // --- Rendering ---

    /// Renders `frames` samples of `context`'s destination output.
    pub fn render(&mut self, context: ContextId, frames: usize) -> Result<Vec<f32>, GraphError> {
        self.context(context)?;
        let order = self.topological_order(context);
        let mut inputs = vec![0.0_f32; self.nodes.len()];
        let mut rendered = Vec::with_capacity(frames);

        for _ in 0..frames {
            inputs.iter_mut().for_each(|s| *s = 0.0);
            let mut frame = 0.0;

            for &idx in &order {
                let input = inputs[idx];
                let Some(node) = self.nodes[idx].as_mut() else {
                    continue;
                };
                let output = match &mut node.stage {
                    Stage::Source(source) => source.next_sample(),
                    Stage::Filter(filter) => filter.process(input),
                    Stage::Gain(gain) => gain.process(input),
                    Stage::Destination => {
                        frame += input;
                        input
                    }
                };
                for next in &node.outgoing {
                    inputs[next.0 as usize] += output;
                }
            }
            rendered.push(frame);
        }
        Ok(rendered)
    }

    // --- Internals ---

    fn context(&self, id: ContextId) -> Result<&ContextData, GraphError> {
        match self.contexts.get(id.0 as usize) {
            Some(Some(ctx)) => Ok(ctx),
            Some(None) => Err(GraphError::ContextClosed(id)),
            None => Err(GraphError::ContextNotFound(id)),
        }
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, GraphError> {
        self.nodes
            .get(id.0 as usize)
            .and_then(|n| n.as_ref())
            .ok_or(GraphError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, GraphError> {
        self.nodes
            .get_mut(id.0 as usize)
            .and_then(|n| n.as_mut())
            .ok_or(GraphError::NodeNotFound(id))
    }

    fn element(&self, id: ElementId) -> Result<&ElementData, GraphError> {
        self.elements
            .get(id.0 as usize)
            .filter(|e| !e.removed)
            .ok_or(GraphError::ElementNotFound(id))
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut ElementData, GraphError> {
        self.elements
            .get_mut(id.0 as usize)
            .filter(|e| !e.removed)
            .ok_or(GraphError::ElementNotFound(id))
    }

    fn add_node(&mut self, context: ContextId, kind: NodeKind, stage: Stage) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(NodeData {
            context,
            kind,
            stage,
            outgoing: Vec::new(),
        }));
        id
    }

    /// DFS reachability check: can `from` reach `to` via existing edges?
    fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            let idx = current.0 as usize;
            if idx >= visited.len() || visited[idx] {
                continue;
            }
            visited[idx] = true;
            if let Some(Some(node)) = self.nodes.get(idx) {
                stack.extend(node.outgoing.iter().copied());
            }
        }
        false
    }

    /// Kahn's algorithm restricted to one context's nodes.
    fn topological_order(&self, context: ContextId) -> Vec<usize> {
        let n = self.nodes.len();
        let mut in_degree = vec![0u32; n];
        for node in self.nodes.iter().flatten().filter(|n| n.context == context) {
            for next in &node.outgoing {
                in_degree[next.0 as usize] += 1;
            }
        }

        let mut queue: Vec<usize> = (0..n)
            .filter(|&i| matches!(&self.nodes[i], Some(node) if node.context == context))
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut sorted = Vec::with_capacity(queue.len());

        while let Some(idx) = queue.pop() {
            sorted.push(idx);
            if let Some(node) = &self.nodes[idx] {
                for next in &node.outgoing {
                    let next = next.0 as usize;
                    in_degree[next] -= 1;
                    if in_degree[next] == 0 {
                        queue.push(next);
                    }
                }
            }
        }
        sorted
    }

    fn create_source(
        &mut self,
        context: ContextId,
        kind: SourceKind,
        samples: Vec<f32>,
    ) -> NodeId {
        self.add_node(
            context,
            NodeKind::Source(kind),
            Stage::Source(SampleSource::new(samples)),
        )
    }
}

impl AudioGraph for MemoryGraph {
    fn create_context(&mut self) -> ContextId {
        let id = ContextId(self.contexts.len() as u32);
        // Reserve the slot before the destination node references it.
        self.contexts.push(None);
        let destination = self.add_node(id, NodeKind::Destination, Stage::Destination);
        self.contexts[id.0 as usize] = Some(ContextData { destination });
        id
    }

    fn close_context(&mut self, context: ContextId) -> Result<(), GraphError> {
        self.context(context)?;
        for slot in &mut self.nodes {
            if matches!(slot, Some(node) if node.context == context) {
                *slot = None;
            }
        }
        // Edges from other contexts cannot exist, so no dangling cleanup is needed.
        self.contexts[context.0 as usize] = None;
        Ok(())
    }

    fn destination(&self, context: ContextId) -> Result<NodeId, GraphError> {
        Ok(self.context(context)?.destination)
    }

    fn create_filter(&mut self, context: ContextId, spec: FilterSpec) -> Result<NodeId, GraphError> {
        self.context(context)?;
        let stage = FilterStage::new(spec, self.sample_rate);
        Ok(self.add_node(context, NodeKind::Filter, Stage::Filter(stage)))
    }

    fn create_gain(&mut self, context: ContextId, gain: f32) -> Result<NodeId, GraphError> {
        self.context(context)?;
        Ok(self.add_node(context, NodeKind::Gain, Stage::Gain(GainStage::new(gain))))
    }

    fn create_buffer_source(
        &mut self,
        context: ContextId,
        samples: Vec<f32>,
    ) -> Result<NodeId, GraphError> {
        self.context(context)?;
        Ok(self.create_source(context, SourceKind::Buffer, samples))
    }

    fn create_element_source(
        &mut self,
        context: ContextId,
        element: ElementId,
    ) -> Result<NodeId, GraphError> {
        self.context(context)?;
        let data = self.element_mut(element)?;
        if data.attached {
            return Err(GraphError::AlreadyAttached(element));
        }
        data.attached = true;
        let samples = data.samples.clone();
        Ok(self.create_source(context, SourceKind::Element, samples))
    }

    fn create_stream_source(
        &mut self,
        context: ContextId,
        element: ElementId,
    ) -> Result<NodeId, GraphError> {
        self.context(context)?;
        let data = self.element(element)?;
        if !data.capture_supported {
            return Err(GraphError::Unsupported("stream capture"));
        }
        let samples = data.samples.clone();
        Ok(self.create_source(context, SourceKind::Stream, samples))
    }

    fn set_filter_gain(&mut self, node: NodeId, gain_db: f32) -> Result<(), GraphError> {
        match &mut self.node_mut(node)?.stage {
            Stage::Filter(filter) => {
                filter.set_gain_db(gain_db);
                Ok(())
            }
            _ => Err(GraphError::WrongNodeKind(node)),
        }
    }

    fn set_gain(&mut self, node: NodeId, gain: f32) -> Result<(), GraphError> {
        match &mut self.node_mut(node)?.stage {
            Stage::Gain(stage) => {
                stage.set_gain(gain);
                Ok(())
            }
            _ => Err(GraphError::WrongNodeKind(node)),
        }
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<NodeId, GraphError> {
        let from_node = self.node(from)?;
        let to_node = self.node(to)?;

        if from_node.context != to_node.context {
            return Err(GraphError::InvalidConnection(format!(
                "{from} and {to} belong to different contexts"
            )));
        }
        if from_node.kind.is_destination() {
            return Err(GraphError::InvalidConnection(format!(
                "cannot connect from destination {from}"
            )));
        }
        if matches!(to_node.kind, NodeKind::Source(_)) {
            return Err(GraphError::InvalidConnection(format!(
                "cannot connect into source {to}"
            )));
        }
        // Connecting an existing edge again is a no-op, as on the platform.
        if from_node.outgoing.contains(&to) {
            return Ok(to);
        }
        if self.can_reach(to, from) {
            return Err(GraphError::CycleDetected);
        }

        self.node_mut(from)?.outgoing.push(to);
        Ok(to)
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.node_mut(node)?.outgoing.clear();
        Ok(())
    }

    fn node_kind(&self, node: NodeId) -> Option<NodeKind> {
        self.node(node).ok().map(|n| n.kind)
    }

    fn node_context(&self, node: NodeId) -> Option<ContextId> {
        self.node(node).ok().map(|n| n.context)
    }

    fn media_elements(&self) -> Vec<ElementId> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.removed)
            .map(|(i, _)| ElementId(i as u32))
            .collect()
    }

    fn ready_state(&self, element: ElementId) -> Option<ReadyState> {
        self.element(element).ok().map(|e| e.ready)
    }

    fn has_source(&self, element: ElementId) -> bool {
        self.element(element).is_ok_and(|e| e.has_source)
    }
}

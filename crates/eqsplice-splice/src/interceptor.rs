//! The splicing proxy.
//!
//! [`SplicingGraph`] wraps a host [`AudioGraph`] and implements the same
//! trait, so page code written against the trait gets the equalizer without
//! knowing about it. Three ways of producing audio are covered:
//!
//! 1. **Direct element attachment.** `create_element_source` on the proxy
//!    attaches the element, then routes the new source into the context's
//!    engine and marks the context as wired.
//! 2. **Stream capture.** When the host refuses a second direct attachment,
//!    the proxy captures the element's stream instead and routes that.
//! 3. **Generic destination connect.** `connect(node, destination)` is taken
//!    over: the node is disconnected and fed into the engine's first band,
//!    and the call reports the destination as if nothing happened. Wired
//!    contexts and the engine's own stages pass straight through.
//!
//! Engine wiring always uses the inner graph, never the proxy, so the proxy
//! never sees its own connections.
//!
//! ```text
//! page source ──x──> destination          (requested)
//! page source ─────> band[0] ... band[9] -> master -> destination   (actual)
//! ```
//!
//! Every failure inside the proxy falls back to the unmodified behavior.
//! Playing unfiltered audio beats playing nothing.

use std::collections::HashMap;

use eqsplice_config::{EngineConfig, Settings, validate_engine_config};
use eqsplice_core::{
    AudioGraph, Compensation, ContextId, ElementId, EqualizerEngine, FilterSpec, GraphError,
    NodeId, NodeKind, ReadyState,
};

use crate::{EngineRegistry, Processed, SpliceError, SpliceResult};

/// Result of [`SplicingGraph::splice_element`].
#[derive(Debug)]
pub enum SpliceOutcome {
    /// The element was spliced before; nothing was done.
    AlreadyProcessed,
    /// The element has not buffered enough yet; try again later.
    NotReady,
    /// Attached directly into a new context.
    Direct(ContextId),
    /// Attached through stream capture into a new context.
    Captured(ContextId),
    /// Both strategies failed. The element stays eligible for a retry.
    Failed(SpliceError),
}

impl SpliceOutcome {
    /// Whether the element now plays through an equalizer.
    pub fn is_spliced(&self) -> bool {
        matches!(self, Self::Direct(_) | Self::Captured(_))
    }

    /// The context created for the element, if splicing succeeded.
    pub fn context(&self) -> Option<ContextId> {
        match self {
            Self::Direct(ctx) | Self::Captured(ctx) => Some(*ctx),
            _ => None,
        }
    }
}

/// [`AudioGraph`] decorator that routes every output path through an equalizer.
///
/// # Example
///
/// ```rust
/// use eqsplice_core::{AudioGraph, MemoryGraph};
/// use eqsplice_splice::SplicingGraph;
///
/// let mut graph = SplicingGraph::new(MemoryGraph::new(48000.0));
///
/// // Page code, unaware of the equalizer.
/// let ctx = graph.create_context();
/// let src = graph.create_buffer_source(ctx, vec![0.5; 8]).unwrap();
/// let dest = graph.destination(ctx).unwrap();
/// assert_eq!(graph.connect(src, dest).unwrap(), dest);
///
/// let engine = graph.engine(ctx).unwrap();
/// assert_eq!(graph.inner().outgoing(src), &[engine.input()]);
/// ```
#[derive(Debug)]
pub struct SplicingGraph<G> {
    inner: G,
    registry: EngineRegistry,
    processed: Processed,
    /// Nodes currently feeding an engine, and the context of that engine.
    routed: HashMap<NodeId, ContextId>,
    /// Source node created for each element in each context.
    element_sources: HashMap<(ElementId, ContextId), NodeId>,
    settings: Option<Settings>,
    q: f32,
    compensation: Compensation,
}

impl<G: AudioGraph> SplicingGraph<G> {
    /// Wraps `inner` with default engine tuning.
    pub fn new(inner: G) -> Self {
        Self::with_config(inner, &EngineConfig::default())
    }

    /// Wraps `inner`, building engines with the given tuning.
    ///
    /// Tuning that fails [`validate_engine_config`] is replaced by the
    /// defaults, so a bad file cannot make the engines silence the page.
    pub fn with_config(inner: G, config: &EngineConfig) -> Self {
        let defaults = EngineConfig::default();
        let config = match validate_engine_config(config) {
            Ok(()) => config,
            Err(err) => {
                tracing::warn!(error = %err, "invalid engine tuning, using defaults");
                &defaults
            }
        };

        Self {
            inner,
            registry: EngineRegistry::new(),
            processed: Processed::default(),
            routed: HashMap::new(),
            element_sources: HashMap::new(),
            settings: None,
            q: config.q,
            compensation: config.compensation.into(),
        }
    }

    /// The wrapped host. Calls made here are never intercepted.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Mutable access to the wrapped host, bypassing interception.
    pub fn inner_mut(&mut self) -> &mut G {
        &mut self.inner
    }

    /// Unwraps the host.
    pub fn into_inner(self) -> G {
        self.inner
    }

    /// Live engines.
    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    /// The engine of `context`, if one was created.
    pub fn engine(&self, context: ContextId) -> Option<&EqualizerEngine> {
        self.registry.get(context)
    }

    /// Runs `f` on the engine of `context` with the host it lives in.
    pub fn with_engine<R>(
        &mut self,
        context: ContextId,
        f: impl FnOnce(&mut EqualizerEngine, &mut G) -> R,
    ) -> Option<R> {
        let engine = self.registry.get_mut(context)?;
        Some(f(engine, &mut self.inner))
    }

    /// What has been spliced so far.
    pub fn processed(&self) -> &Processed {
        &self.processed
    }

    /// The last settings broadcast, applied to every new engine.
    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    /// Whether `node` currently feeds an engine because of this proxy.
    pub fn is_routed(&self, node: NodeId) -> bool {
        self.routed.contains_key(&node)
    }

    /// Whether `context` was wired through an element source.
    pub fn is_wired(&self, context: ContextId) -> bool {
        self.processed.contexts.contains(context)
    }

    // --- Element splicing (watcher path) ---

    /// Splices a playback element into a fresh context.
    ///
    /// Tries direct attachment, then stream capture. On success the element
    /// stays marked forever; on failure the mark is rolled back and the
    /// created context is closed again.
    pub fn splice_element(&mut self, element: ElementId) -> SpliceOutcome {
        if self.processed.elements.contains(element) {
            tracing::debug!(%element, "element already processed");
            return SpliceOutcome::AlreadyProcessed;
        }

        match self.inner.ready_state(element) {
            Some(state) if state.is_playable() => {}
            Some(state) => {
                tracing::debug!(%element, ?state, "element not ready");
                return SpliceOutcome::NotReady;
            }
            None => return SpliceOutcome::Failed(GraphError::ElementNotFound(element).into()),
        }

        self.processed.elements.mark(element);
        let context = self.inner.create_context();

        match self.attach_element(context, element) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(%element, %context, error = %err, "equalizer not applied to element");
                self.processed.elements.unmark(element);
                self.forget_context(context);
                if let Err(close_err) = self.inner.close_context(context) {
                    tracing::debug!(%context, error = %close_err, "could not close unused context");
                }
                SpliceOutcome::Failed(err)
            }
        }
    }

    fn attach_element(
        &mut self,
        context: ContextId,
        element: ElementId,
    ) -> SpliceResult<SpliceOutcome> {
        self.ensure_engine(context)?;

        let direct = match self.inner.create_element_source(context, element) {
            Ok(source) => {
                self.element_sources.insert((element, context), source);
                self.route_source(context, source)?;
                tracing::info!(%element, %context, "equalizer attached to element");
                return Ok(SpliceOutcome::Direct(context));
            }
            Err(err) => err,
        };

        tracing::warn!(%element, error = %direct, "direct attachment failed, capturing stream");
        let source = self
            .inner
            .create_stream_source(context, element)
            .map_err(|capture| SpliceError::AttachFailed {
                element,
                direct,
                capture,
            })?;
        self.element_sources.insert((element, context), source);
        self.route_source(context, source)?;
        tracing::info!(%element, %context, "equalizer attached to captured stream");
        Ok(SpliceOutcome::Captured(context))
    }

    // --- Settings ---

    /// Applies `settings` to every live engine and remembers them for new ones.
    ///
    /// The enabled flag goes first, then each band. Returns how many engines
    /// took the update; a host failure on one engine does not stop the others.
    pub fn apply_settings(&mut self, settings: &Settings) -> usize {
        self.settings = Some(*settings);

        let mut updated = 0;
        for engine in self.registry.iter_mut() {
            match apply_to_engine(engine, &mut self.inner, settings) {
                Ok(()) => updated += 1,
                Err(err) => {
                    tracing::warn!(context = %engine.context(), error = %err, "settings not applied");
                }
            }
        }
        tracing::debug!(engines = updated, enabled = settings.enabled, "settings broadcast");
        updated
    }

    // --- Internals ---

    /// Returns the input of `context`'s engine, creating and wiring it first if needed.
    fn ensure_engine(&mut self, context: ContextId) -> SpliceResult<NodeId> {
        if let Some(engine) = self.registry.get(context) {
            return Ok(engine.input());
        }

        let mut engine =
            EqualizerEngine::with_config(&mut self.inner, context, self.q, self.compensation)?;
        if let Some(settings) = &self.settings {
            apply_to_engine(&mut engine, &mut self.inner, settings)?;
        }
        // Connected last: a chain that failed to configure stays off the destination.
        let destination = self.inner.destination(context)?;
        self.inner.connect(engine.output(), destination)?;

        let input = engine.input();
        self.registry.insert(engine)?;
        tracing::info!(%context, engines = self.registry.len(), "equalizer created");
        Ok(input)
    }

    /// Feeds `node` into the engine of `context` instead of wherever it went.
    fn route_into_engine(&mut self, context: ContextId, node: NodeId) -> SpliceResult<()> {
        let input = self.ensure_engine(context)?;
        self.inner.disconnect(node)?;
        self.inner.connect(node, input)?;
        self.routed.insert(node, context);
        Ok(())
    }

    /// Routes a freshly created element or stream source and wires its context.
    fn route_source(&mut self, context: ContextId, source: NodeId) -> SpliceResult<()> {
        self.processed.nodes.mark(source);
        self.route_into_engine(context, source)?;
        self.processed.contexts.mark(context);
        Ok(())
    }

    /// Drops every record tied to `context`. Must run before the host closes it.
    fn forget_context(&mut self, context: ContextId) {
        if self.registry.remove(context).is_some() {
            tracing::debug!(%context, "equalizer dropped with its context");
        }
        self.processed.contexts.unmark(context);
        self.routed.retain(|_, owner| *owner != context);
        self.element_sources.retain(|&(_, owner), _| owner != context);
        let inner = &self.inner;
        self.processed
            .nodes
            .forget_where(|node| inner.node_context(node) != Some(context));
    }
}

fn apply_to_engine<G>(
    engine: &mut EqualizerEngine,
    graph: &mut G,
    settings: &Settings,
) -> Result<(), GraphError>
where
    G: AudioGraph + ?Sized,
{
    engine.set_enabled(graph, settings.enabled)?;
    for (index, &gain) in settings.gains.iter().enumerate() {
        engine.set_band_gain(graph, index, gain)?;
    }
    Ok(())
}

impl<G: AudioGraph> AudioGraph for SplicingGraph<G> {
    fn create_context(&mut self) -> ContextId {
        self.inner.create_context()
    }

    fn close_context(&mut self, context: ContextId) -> Result<(), GraphError> {
        self.forget_context(context);
        self.inner.close_context(context)
    }

    fn destination(&self, context: ContextId) -> Result<NodeId, GraphError> {
        self.inner.destination(context)
    }

    fn create_filter(&mut self, context: ContextId, spec: FilterSpec) -> Result<NodeId, GraphError> {
        self.inner.create_filter(context, spec)
    }

    fn create_gain(&mut self, context: ContextId, gain: f32) -> Result<NodeId, GraphError> {
        self.inner.create_gain(context, gain)
    }

    fn create_buffer_source(
        &mut self,
        context: ContextId,
        samples: Vec<f32>,
    ) -> Result<NodeId, GraphError> {
        self.inner.create_buffer_source(context, samples)
    }

    /// Attaches the element and routes it through `context`'s engine.
    ///
    /// If the element was attached elsewhere already, its stream is captured
    /// instead and the page gets that source. If capture fails too, the
    /// page sees the host's original error. Attaching an element to the same
    /// context again returns the source created the first time.
    fn create_element_source(
        &mut self,
        context: ContextId,
        element: ElementId,
    ) -> Result<NodeId, GraphError> {
        if let Some(&source) = self.element_sources.get(&(element, context)) {
            tracing::debug!(%element, %context, "element already attached to this context");
            return Ok(source);
        }

        let source = match self.inner.create_element_source(context, element) {
            Ok(source) => source,
            Err(direct @ GraphError::AlreadyAttached(_)) => {
                tracing::warn!(%element, %context, "element attached elsewhere, capturing stream");
                self.inner
                    .create_stream_source(context, element)
                    .map_err(|capture| {
                        tracing::warn!(%element, error = %capture, "stream capture failed");
                        direct
                    })?
            }
            Err(err) => return Err(err),
        };

        self.processed.elements.mark(element);
        self.element_sources.insert((element, context), source);
        match self.route_source(context, source) {
            Ok(()) => tracing::info!(%element, %context, "equalizer attached to element"),
            Err(err) => {
                tracing::error!(%element, %context, error = %err, "element source left unfiltered");
            }
        }
        Ok(source)
    }

    fn create_stream_source(
        &mut self,
        context: ContextId,
        element: ElementId,
    ) -> Result<NodeId, GraphError> {
        self.inner.create_stream_source(context, element)
    }

    fn set_filter_gain(&mut self, node: NodeId, gain_db: f32) -> Result<(), GraphError> {
        self.inner.set_filter_gain(node, gain_db)
    }

    fn set_gain(&mut self, node: NodeId, gain: f32) -> Result<(), GraphError> {
        self.inner.set_gain(node, gain)
    }

    /// Takes over connections into a destination; everything else passes through.
    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<NodeId, GraphError> {
        if !self.inner.node_kind(to).is_some_and(NodeKind::is_destination) {
            return self.inner.connect(from, to);
        }
        let Some(context) = self.inner.node_context(to) else {
            return self.inner.connect(from, to);
        };
        // Only producers can be routed; the host judges everything else.
        if self.inner.node_kind(from).is_none_or(NodeKind::is_destination) {
            return self.inner.connect(from, to);
        }

        if self.routed.contains_key(&from) {
            tracing::debug!(node = %from, "already routed through equalizer");
            return Ok(to);
        }
        if self.processed.contexts.contains(context)
            || self.registry.owns_stage(context, from)
            || self.inner.node_context(from) != Some(context)
        {
            return self.inner.connect(from, to);
        }
        if !self.processed.nodes.mark(from) {
            tracing::debug!(node = %from, "node processed before, connecting unfiltered");
            return self.inner.connect(from, to);
        }

        match self.route_into_engine(context, from) {
            Ok(()) => {
                tracing::info!(node = %from, %context, "destination connection routed through equalizer");
                Ok(to)
            }
            Err(err) => {
                tracing::warn!(node = %from, error = %err, "routing failed, connecting unfiltered");
                self.inner.connect(from, to)
            }
        }
    }

    /// Disconnects a node. A routed node leaves its engine and is not routed again.
    fn disconnect(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.inner.disconnect(node)?;
        if self.routed.remove(&node).is_some() {
            tracing::debug!(%node, "routed node disconnected by page");
        }
        Ok(())
    }

    fn node_kind(&self, node: NodeId) -> Option<NodeKind> {
        self.inner.node_kind(node)
    }

    fn node_context(&self, node: NodeId) -> Option<ContextId> {
        self.inner.node_context(node)
    }

    fn media_elements(&self) -> Vec<ElementId> {
        self.inner.media_elements()
    }

    fn ready_state(&self, element: ElementId) -> Option<ReadyState> {
        self.inner.ready_state(element)
    }

    fn has_source(&self, element: ElementId) -> bool {
        self.inner.has_source(element)
    }
}

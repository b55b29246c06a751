//! One equalizer per processing context.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use eqsplice_core::{ContextId, EqualizerEngine, NodeId};

use crate::{SpliceError, SpliceResult};

/// Owns every live engine, keyed by the context it lives in.
#[derive(Debug, Default)]
pub struct EngineRegistry {
    engines: HashMap<ContextId, EqualizerEngine>,
    created: u64,
}

impl EngineRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `context` has an engine.
    pub fn contains(&self, context: ContextId) -> bool {
        self.engines.contains_key(&context)
    }

    /// The engine of `context`.
    pub fn get(&self, context: ContextId) -> Option<&EqualizerEngine> {
        self.engines.get(&context)
    }

    /// Mutable access to the engine of `context`.
    pub fn get_mut(&mut self, context: ContextId) -> Option<&mut EqualizerEngine> {
        self.engines.get_mut(&context)
    }

    /// Registers `engine` under its own context.
    ///
    /// A context that already has an engine keeps it; the offered one is
    /// rejected with [`SpliceError::DuplicateEngine`].
    pub fn insert(&mut self, engine: EqualizerEngine) -> SpliceResult<&mut EqualizerEngine> {
        let context = engine.context();
        match self.engines.entry(context) {
            Entry::Occupied(_) => Err(SpliceError::DuplicateEngine(context)),
            Entry::Vacant(slot) => {
                self.created += 1;
                Ok(slot.insert(engine))
            }
        }
    }

    /// Drops the engine of `context`, e.g. when the context is closed.
    pub fn remove(&mut self, context: ContextId) -> Option<EqualizerEngine> {
        self.engines.remove(&context)
    }

    /// Every engine, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &EqualizerEngine> {
        self.engines.values()
    }

    /// Every engine, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut EqualizerEngine> {
        self.engines.values_mut()
    }

    /// Whether `node` is a band or master stage of `context`'s engine.
    pub fn owns_stage(&self, context: ContextId, node: NodeId) -> bool {
        self.engines.get(&context).is_some_and(|e| e.owns(node))
    }

    /// Number of live engines.
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Whether no engine is live.
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Engines ever created, including removed ones.
    pub fn created(&self) -> u64 {
        self.created
    }
}

//! "Already handled" bookkeeping.
//!
//! Each unit is marked before work on it starts, so a re-entrant or repeated
//! request sees the mark and backs off. A failed attempt unmarks the unit to
//! allow a later retry. Host handles are never reused, so forgetting a mark
//! only matters for memory once the owning context is gone.

use std::collections::HashSet;
use std::hash::Hash;

use eqsplice_core::{ContextId, ElementId, NodeId};

/// Membership set with check-then-mark semantics.
#[derive(Debug, Clone)]
pub struct ProcessedSet<T> {
    members: HashSet<T>,
}

impl<T: Copy + Eq + Hash> ProcessedSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            members: HashSet::new(),
        }
    }

    /// Marks `item`. Returns `true` if it was not marked before.
    pub fn mark(&mut self, item: T) -> bool {
        self.members.insert(item)
    }

    /// Rolls back a mark after a failed attempt.
    pub fn unmark(&mut self, item: T) -> bool {
        self.members.remove(&item)
    }

    /// Whether `item` is marked.
    pub fn contains(&self, item: T) -> bool {
        self.members.contains(&item)
    }

    /// Drops every mark for which `keep` returns `false`.
    pub fn forget_where(&mut self, mut keep: impl FnMut(T) -> bool) {
        self.members.retain(|&item| keep(item));
    }

    /// Number of marked items.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing is marked.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T: Copy + Eq + Hash> Default for ProcessedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The three independent sets the splicing proxy keeps.
#[derive(Debug, Clone, Default)]
pub struct Processed {
    /// Playback elements spliced (or being spliced).
    pub elements: ProcessedSet<ElementId>,
    /// Nodes whose destination connection was taken over.
    pub nodes: ProcessedSet<NodeId>,
    /// Contexts wired through an element source; the generic connect path leaves them alone.
    pub contexts: ProcessedSet<ContextId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_is_check_then_insert() {
        let mut set = ProcessedSet::new();
        assert!(set.mark(ElementId::from_raw(1)));
        assert!(!set.mark(ElementId::from_raw(1)));
        assert!(set.contains(ElementId::from_raw(1)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn unmark_allows_retry() {
        let mut set = ProcessedSet::new();
        set.mark(NodeId::from_raw(7));
        assert!(set.unmark(NodeId::from_raw(7)));
        assert!(!set.unmark(NodeId::from_raw(7)));
        assert!(set.mark(NodeId::from_raw(7)));
    }

    #[test]
    fn forget_where_filters() {
        let mut set = ProcessedSet::new();
        for i in 0..6 {
            set.mark(ContextId::from_raw(i));
        }
        set.forget_where(|ctx| ctx.index() % 2 == 0);
        assert_eq!(set.len(), 3);
        assert!(!set.contains(ContextId::from_raw(1)));
    }
}

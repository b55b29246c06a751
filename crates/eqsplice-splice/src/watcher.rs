//! Finds playback elements and splices them once they can play.
//!
//! The watcher does not own a clock. The host loop passes the time since
//! startup into every call and asks [`MediaElementWatcher::next_deadline`]
//! when to call [`MediaElementWatcher::tick`] next.
//!
//! An element moves through three states:
//!
//! ```text
//! unseen ──scan──> pending ──ready──> spliced
//!                     │
//!                     └─ attempts used up / removed / failed ──> unseen
//! ```
//!
//! A pending element is checked when its backoff delay expires or when the
//! host reports that its data finished loading, whichever comes first.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use eqsplice_config::{EngineConfig, RetryPolicy};
use eqsplice_core::{AudioGraph, ElementId};

use crate::{Backoff, SpliceOutcome, SplicingGraph};

#[derive(Debug)]
struct PendingElement {
    backoff: Backoff,
    due: Duration,
}

/// Schedules element scans and readiness retries.
#[derive(Debug)]
pub struct MediaElementWatcher {
    policy: RetryPolicy,
    scans: VecDeque<Duration>,
    pending: HashMap<ElementId, PendingElement>,
}

impl MediaElementWatcher {
    /// Watcher with the scan offsets and retry policy from `config`.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_schedule(config.retry, config.scan_delays())
    }

    /// Watcher with an explicit retry policy and scan offsets.
    pub fn with_schedule(policy: RetryPolicy, scans: impl IntoIterator<Item = Duration>) -> Self {
        let mut scans: Vec<Duration> = scans.into_iter().collect();
        scans.sort_unstable();
        Self {
            policy,
            scans: scans.into(),
            pending: HashMap::new(),
        }
    }

    /// Looks at every element with media and splices or schedules it.
    ///
    /// Spliced and already pending elements are skipped.
    pub fn scan<G: AudioGraph>(
        &mut self,
        graph: &mut SplicingGraph<G>,
        now: Duration,
    ) -> Vec<(ElementId, SpliceOutcome)> {
        let mut results = Vec::new();
        for element in graph.media_elements() {
            if graph.processed().elements.contains(element)
                || self.pending.contains_key(&element)
                || !graph.has_source(element)
            {
                continue;
            }
            let outcome = self.attempt(graph, element, now);
            results.push((element, outcome));
        }
        if !results.is_empty() {
            tracing::debug!(found = results.len(), "element scan");
        }
        results
    }

    /// The host finished loading `element`'s data.
    pub fn on_loaded_data<G: AudioGraph>(
        &mut self,
        graph: &mut SplicingGraph<G>,
        element: ElementId,
        now: Duration,
    ) -> SpliceOutcome {
        self.attempt(graph, element, now)
    }

    /// `element` left the document. Returns whether a retry was cancelled.
    pub fn on_removed(&mut self, element: ElementId) -> bool {
        self.pending.remove(&element).is_some()
    }

    /// Runs every scan and retry that is due at `now`.
    pub fn tick<G: AudioGraph>(
        &mut self,
        graph: &mut SplicingGraph<G>,
        now: Duration,
    ) -> Vec<(ElementId, SpliceOutcome)> {
        let mut results = Vec::new();

        while self.scans.front().is_some_and(|&at| at <= now) {
            self.scans.pop_front();
            results.extend(self.scan(graph, now));
        }

        let mut due: Vec<ElementId> = self
            .pending
            .iter()
            .filter(|(_, p)| p.due <= now)
            .map(|(&element, _)| element)
            .collect();
        due.sort_unstable();

        for element in due {
            let outcome = self.attempt(graph, element, now);
            results.push((element, outcome));
        }
        results
    }

    /// When [`MediaElementWatcher::tick`] has work next, if ever.
    pub fn next_deadline(&self) -> Option<Duration> {
        let next_retry = self.pending.values().map(|p| p.due).min();
        match (self.scans.front().copied(), next_retry) {
            (Some(scan), Some(retry)) => Some(scan.min(retry)),
            (scan, retry) => scan.or(retry),
        }
    }

    /// Number of elements waiting to become playable.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Whether `element` is waiting to become playable.
    pub fn is_pending(&self, element: ElementId) -> bool {
        self.pending.contains_key(&element)
    }

    /// Scheduled scans not yet run.
    pub fn remaining_scans(&self) -> usize {
        self.scans.len()
    }

    fn attempt<G: AudioGraph>(
        &mut self,
        graph: &mut SplicingGraph<G>,
        element: ElementId,
        now: Duration,
    ) -> SpliceOutcome {
        let outcome = graph.splice_element(element);
        if matches!(outcome, SpliceOutcome::NotReady) {
            self.schedule_retry(element, now);
        } else {
            self.pending.remove(&element);
        }
        outcome
    }

    fn schedule_retry(&mut self, element: ElementId, now: Duration) {
        let policy = self.policy;
        let entry = self.pending.entry(element).or_insert_with(|| PendingElement {
            backoff: Backoff::new(policy),
            due: now,
        });

        match entry.backoff.next_delay() {
            Some(delay) => {
                entry.due = now + delay;
                tracing::debug!(%element, attempt = entry.backoff.attempts(), ?delay, "readiness retry scheduled");
            }
            None => {
                self.pending.remove(&element);
                tracing::debug!(%element, "element never became ready, waiting for next scan");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqsplice_core::{MemoryGraph, ReadyState};

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn setup() -> (SplicingGraph<MemoryGraph>, MediaElementWatcher) {
        let graph = SplicingGraph::new(MemoryGraph::new(48000.0));
        let watcher = MediaElementWatcher::new(&EngineConfig::default());
        (graph, watcher)
    }

    #[test]
    fn ready_element_is_spliced_on_scan() {
        let (mut graph, mut watcher) = setup();
        let el = graph.inner_mut().add_element(vec![1.0]);

        let results = watcher.scan(&mut graph, ms(0));
        assert_eq!(results.len(), 1);
        assert!(results[0].1.is_spliced());
        assert!(watcher.scan(&mut graph, ms(10)).is_empty());
        assert!(!watcher.is_pending(el));
    }

    #[test]
    fn elements_without_media_are_skipped() {
        let (mut graph, mut watcher) = setup();
        let el = graph.inner_mut().add_element(vec![1.0]);
        graph.inner_mut().set_has_source(el, false).unwrap();

        assert!(watcher.scan(&mut graph, ms(0)).is_empty());
        assert!(graph.registry().is_empty());
    }

    #[test]
    fn first_retry_waits_for_load_timeout() {
        let (mut graph, mut watcher) = setup();
        let el = graph.inner_mut().add_element(vec![1.0]);
        graph.inner_mut().set_ready_state(el, ReadyState::HaveNothing).unwrap();

        watcher.scan(&mut graph, ms(0));
        assert!(watcher.is_pending(el));
        assert_eq!(watcher.next_deadline(), Some(ms(500)));

        // The 500 ms scan skips the pending element.
        assert!(watcher.tick(&mut graph, ms(500)).is_empty());
        assert_eq!(watcher.next_deadline(), Some(ms(1000)));

        graph.inner_mut().set_ready_state(el, ReadyState::HaveCurrentData).unwrap();
        let results = watcher.tick(&mut graph, ms(1000));
        assert!(matches!(results.as_slice(), [(e, SpliceOutcome::Direct(_))] if *e == el));
        assert_eq!(watcher.pending(), 0);
    }

    #[test]
    fn loaded_data_wins_over_timeout() {
        let (mut graph, mut watcher) = setup();
        let el = graph.inner_mut().add_element(vec![1.0]);
        graph.inner_mut().set_ready_state(el, ReadyState::HaveMetadata).unwrap();
        watcher.scan(&mut graph, ms(0));

        graph.inner_mut().set_ready_state(el, ReadyState::HaveEnoughData).unwrap();
        assert!(watcher.on_loaded_data(&mut graph, el, ms(300)).is_spliced());
        assert!(!watcher.is_pending(el));

        // The timeout firing later is a no-op.
        assert!(watcher.tick(&mut graph, ms(1000)).is_empty());
        assert_eq!(graph.registry().created(), 1);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        };
        let mut graph = SplicingGraph::new(MemoryGraph::new(48000.0));
        let mut watcher = MediaElementWatcher::with_schedule(policy, []);
        let el = graph.inner_mut().add_element(vec![1.0]);
        graph.inner_mut().set_ready_state(el, ReadyState::HaveNothing).unwrap();

        watcher.scan(&mut graph, ms(0));
        let mut now = ms(0);
        while let Some(deadline) = watcher.next_deadline() {
            now = deadline;
            watcher.tick(&mut graph, now);
        }
        // 1000 + 100 + 200
        assert_eq!(now, ms(1300));
        assert!(!watcher.is_pending(el));

        // A later scan picks it up again.
        graph.inner_mut().set_ready_state(el, ReadyState::HaveCurrentData).unwrap();
        assert!(watcher.scan(&mut graph, now)[0].1.is_spliced());
    }

    #[test]
    fn removal_cancels_retries() {
        let (mut graph, mut watcher) = setup();
        let el = graph.inner_mut().add_element(vec![1.0]);
        graph.inner_mut().set_ready_state(el, ReadyState::HaveNothing).unwrap();
        watcher.scan(&mut graph, ms(0));

        graph.inner_mut().remove_element(el).unwrap();
        assert!(watcher.on_removed(el));
        assert!(!watcher.on_removed(el));
        assert_eq!(watcher.pending(), 0);
    }

    #[test]
    fn scheduled_scans_run_once_each() {
        let (mut graph, mut watcher) = setup();
        assert_eq!(watcher.remaining_scans(), 3);
        watcher.tick(&mut graph, ms(2500));
        assert_eq!(watcher.remaining_scans(), 1);
        assert_eq!(watcher.next_deadline(), Some(ms(5000)));
        watcher.tick(&mut graph, ms(5000));
        assert_eq!(watcher.next_deadline(), None);
    }
}

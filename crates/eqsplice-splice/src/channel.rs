//! Delivery of settings changes to every engine.
//!
//! Messages queue up in arrival order and are folded into one
//! [`Settings`] value on delivery; each folded state is broadcast through
//! [`SplicingGraph::apply_settings`].

use std::collections::VecDeque;

use eqsplice_config::{ChannelMessage, PersistedSettings, Settings, SettingsMessage};
use eqsplice_core::AudioGraph;

use crate::{SpliceResult, SplicingGraph};

/// FIFO of settings messages bound for the splicing proxy.
#[derive(Debug, Clone, Default)]
pub struct SettingsChannel {
    queue: VecDeque<SettingsMessage>,
    current: Settings,
    delivered: u64,
}

impl SettingsChannel {
    /// Empty channel starting from flat, disabled settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty channel starting from `settings`.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            current: settings,
            ..Self::default()
        }
    }

    /// Queues a message.
    pub fn post(&mut self, message: SettingsMessage) {
        self.queue.push_back(message);
    }

    /// Queues a JSON envelope as posted by the UI side.
    pub fn post_json(&mut self, json: &str) -> SpliceResult<()> {
        let message = ChannelMessage::from_json(json)?;
        self.post(message.into_settings());
        Ok(())
    }

    /// Queues the startup announcement of a persisted record.
    pub fn post_record(&mut self, record: &PersistedSettings) {
        self.post(record.message());
    }

    /// Delivers every queued message in order. Returns how many were delivered.
    pub fn deliver<G: AudioGraph>(&mut self, graph: &mut SplicingGraph<G>) -> usize {
        let mut count = 0;
        while let Some(message) = self.queue.pop_front() {
            self.current.merge(&message);
            let engines = graph.apply_settings(&self.current);
            self.delivered += 1;
            count += 1;
            tracing::debug!(engines, enabled = self.current.enabled, "settings delivered");
        }
        count
    }

    /// Settings after the last delivered message.
    pub fn settings(&self) -> &Settings {
        &self.current
    }

    /// Messages waiting for delivery.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Messages delivered since creation.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqsplice_core::MemoryGraph;

    #[test]
    fn messages_fold_in_order() {
        let mut graph = SplicingGraph::new(MemoryGraph::new(48000.0));
        let mut channel = SettingsChannel::new();
        channel.post(SettingsMessage::with_gains(vec![3.0; 10], Some(true)));
        channel.post(SettingsMessage::with_gains(vec![1.0], None));
        assert_eq!(channel.pending(), 2);

        assert_eq!(channel.deliver(&mut graph), 2);
        assert!(channel.settings().enabled);
        assert_eq!(channel.settings().gains[0], 1.0);
        assert_eq!(channel.settings().gains[1], 0.0);
        assert_eq!(graph.settings(), Some(channel.settings()));
        assert_eq!(channel.delivered(), 2);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let mut channel = SettingsChannel::new();
        assert!(channel.post_json("{\"type\":\"NOPE\"}").is_err());
        assert!(channel.post_json("not json").is_err());
        assert_eq!(channel.pending(), 0);
    }

    #[test]
    fn startup_record_is_announced() {
        let mut graph = SplicingGraph::new(MemoryGraph::new(48000.0));
        let mut record = PersistedSettings::first_run();
        record.apply_preset("rock").unwrap();
        record.equalizer_enabled = true;

        let mut channel = SettingsChannel::new();
        channel.post_record(&record);
        channel.deliver(&mut graph);
        assert_eq!(channel.settings().gains[0], 4.0);
        assert!(channel.settings().enabled);
    }
}

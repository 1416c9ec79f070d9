//! Per-session registry of resolved channels.

use logweave_handlers::Logger;
use logweave_types::{LogweaveError, Result};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
enum Slot {
    Building,
    Built(Arc<Logger>),
}

/// Channels resolved (or being resolved) in one session.
///
/// A channel is marked building for the whole of its resolution; a second
/// request for it in that window is an extends cycle. Failed resolutions
/// leave no trace, so a later request retries from scratch.
#[derive(Debug, Default)]
pub struct ResolutionSession {
    loggers: HashMap<String, Slot>,
    in_progress: Vec<String>,
}

impl ResolutionSession {
    /// Start an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger already built for `channel`.
    pub fn lookup(&self, channel: &str) -> Option<Arc<Logger>> {
        match self.loggers.get(channel) {
            Some(Slot::Built(logger)) => Some(Arc::clone(logger)),
            _ => None,
        }
    }

    /// Whether `channel` is currently being resolved.
    pub fn is_building(&self, channel: &str) -> bool {
        matches!(self.loggers.get(channel), Some(Slot::Building))
    }

    /// Mark `channel` as building.
    pub fn begin(&mut self, channel: &str) -> Result<()> {
        if self.is_building(channel) {
            let mut chain = self.in_progress.clone();
            chain.push(channel.to_string());
            return Err(LogweaveError::CyclicChannelDependency {
                channel: channel.to_string(),
                requested_by: self.in_progress.last().cloned().unwrap_or_default(),
                chain,
            });
        }

        self.loggers.insert(channel.to_string(), Slot::Building);
        self.in_progress.push(channel.to_string());
        Ok(())
    }

    /// Store the built logger for `channel`.
    pub fn complete(&mut self, channel: &str, logger: Arc<Logger>) {
        self.in_progress.retain(|c| c != channel);
        self.loggers.insert(channel.to_string(), Slot::Built(logger));
    }

    /// Drop the building marker of a failed resolution.
    pub fn abandon(&mut self, channel: &str) {
        self.in_progress.retain(|c| c != channel);
        if self.is_building(channel) {
            self.loggers.remove(channel);
        }
    }

    /// Channels currently being resolved, outermost first.
    pub fn in_progress(&self) -> &[String] {
        &self.in_progress
    }

    /// Number of built loggers.
    pub fn len(&self) -> usize {
        self.loggers
            .values()
            .filter(|slot| matches!(slot, Slot::Built(_)))
            .count()
    }

    /// Whether no logger has been built.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_twice_is_a_cycle() {
        let mut session = ResolutionSession::new();
        session.begin("a").unwrap();
        session.begin("b").unwrap();

        match session.begin("a") {
            Err(LogweaveError::CyclicChannelDependency { channel, requested_by, chain }) => {
                assert_eq!(channel, "a");
                assert_eq!(requested_by, "b");
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_complete_and_lookup() {
        let mut session = ResolutionSession::new();
        session.begin("app").unwrap();
        assert!(session.lookup("app").is_none());

        let logger = Arc::new(Logger::new("app"));
        session.complete("app", Arc::clone(&logger));
        assert!(Arc::ptr_eq(&session.lookup("app").unwrap(), &logger));
        assert!(session.in_progress().is_empty());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_abandon_allows_retry() {
        let mut session = ResolutionSession::new();
        session.begin("app").unwrap();
        session.abandon("app");

        assert!(!session.is_building("app"));
        assert!(session.is_empty());
        session.begin("app").unwrap();
    }
}

//! Tag → recorder registry
//!
//! Recorders are created once per tag at setup and live for the lifetime of
//! the monitored endpoint. Hot-path lookups take only the read lock.

use super::{Recorder, RecorderSettings};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

pub struct Recorders {
    settings: RecorderSettings,
    by_tag: RwLock<FxHashMap<String, Arc<dyn Recorder>>>,
}

impl Recorders {
    pub fn new(settings: RecorderSettings) -> Self {
        Self { settings, by_tag: RwLock::new(FxHashMap::default()) }
    }

    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }

    /// Get or create the recorder for `tag`
    pub fn register(&self, tag: &str) -> Arc<dyn Recorder> {
        if let Some(existing) = self.get(tag) {
            return existing;
        }

        let mut by_tag = self.by_tag.write();
        by_tag
            .entry(tag.to_string())
            .or_insert_with(|| {
                debug!(tag = %tag, mode = self.settings.mode.as_str(), "recorder_registered");
                self.settings.build(tag)
            })
            .clone()
    }

    #[inline]
    pub fn get(&self, tag: &str) -> Option<Arc<dyn Recorder>> {
        self.by_tag.read().get(tag).cloned()
    }

    /// Record a sample for `tag`; unknown tags are dropped and return false
    #[inline]
    pub fn record_time(&self, tag: &str, start_nanos: i64, end_nanos: i64) -> bool {
        match self.by_tag.read().get(tag) {
            Some(recorder) => {
                recorder.record_time(start_nanos, end_nanos);
                true
            }
            None => false,
        }
    }

    /// All recorders, sorted by tag
    pub fn recorders(&self) -> Vec<Arc<dyn Recorder>> {
        let by_tag = self.by_tag.read();
        let mut all: Vec<_> = by_tag.values().cloned().collect();
        all.sort_by(|a, b| a.tag().cmp(b.tag()));
        all
    }

    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.by_tag.read().keys().cloned().collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        self.by_tag.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{Record, RecorderMode};

    #[test]
    fn test_register_is_idempotent() {
        let registry = Recorders::new(RecorderSettings::default());
        let a = registry.register("GET /users");
        let b = registry.register("GET /users");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_record_unknown_tag_dropped() {
        let registry = Recorders::new(RecorderSettings::default());
        assert!(!registry.record_time("missing", 0, 1_000_000));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_record_routes_by_tag() {
        let registry = Recorders::new(RecorderSettings::default());
        registry.register("a");
        registry.register("b");

        assert!(registry.record_time("a", 0, 3_000_000));
        assert!(registry.record_time("b", 0, 4_000_000));
        assert!(registry.record_time("b", 0, 4_000_000));

        assert_eq!(registry.get("a").unwrap().snapshot(), vec![Record { value: 3, count: 1 }]);
        assert_eq!(registry.get("b").unwrap().snapshot(), vec![Record { value: 4, count: 2 }]);
    }

    #[test]
    fn test_recorders_sorted_by_tag() {
        let registry = Recorders::new(RecorderSettings { mode: RecorderMode::Rough, ..Default::default() });
        for tag in ["z", "m", "a"] {
            registry.register(tag);
        }
        let tags: Vec<String> = registry.recorders().iter().map(|r| r.tag().to_string()).collect();
        assert_eq!(tags, vec!["a", "m", "z"]);
        assert_eq!(registry.tags(), vec!["a", "m", "z"]);
    }
}

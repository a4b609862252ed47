//! Window reporter: snapshot, hand off, reset
//!
//! Runs on a single reporting task. Each window cycle stamps the stop time,
//! extracts every recorder's sorted records into one reused buffer, resets
//! the recorder, and opens the next window.

use crate::infra::error::RecorderError;
use crate::recorder::snapshot::decode_records;
use crate::recorder::{Record, Recorder, Recorders};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Wall-clock milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// One recorder's distribution for one closed window
#[derive(Debug, Clone, Serialize)]
pub struct WindowSnapshot {
    pub tag: String,
    pub start_time: i64,
    pub stop_time: i64,
    pub threshold_ms: usize,
    pub out_threshold_cardinality: usize,
    /// Ascending by value
    pub records: Vec<Record>,
}

impl WindowSnapshot {
    /// Number of distinct values observed
    pub fn effective_count(&self) -> usize {
        self.records.len()
    }

    pub fn total_count(&self) -> u64 {
        self.records.iter().map(|r| r.count).sum()
    }

    pub fn min_ms(&self) -> Option<u64> {
        self.records.first().map(|r| r.value)
    }

    pub fn max_ms(&self) -> Option<u64> {
        self.records.last().map(|r| r.value)
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn log(&self) {
        info!(
            tag = %self.tag,
            window_start = self.start_time,
            window_stop = self.stop_time,
            samples = self.total_count(),
            distinct = self.effective_count(),
            min_ms = ?self.min_ms(),
            max_ms = ?self.max_ms(),
            out_threshold = self.out_threshold_cardinality,
            "window_report"
        );
    }
}

/// Drives snapshot+reset cycles, reusing one scratch buffer across recorders
#[derive(Default)]
pub struct Reporter {
    buf: Vec<u64>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the start of a window on every registered recorder
    pub fn open_window(&self, registry: &Recorders, now: i64) {
        for recorder in registry.recorders() {
            recorder.set_start_time(now);
        }
    }

    /// Close the current window on every recorder and open the next one
    pub fn run_window(&mut self, registry: &Recorders, now: i64) -> Vec<WindowSnapshot> {
        registry
            .recorders()
            .iter()
            .map(|recorder| {
                let snapshot = self.close_window(recorder.as_ref(), now);
                recorder.reset();
                recorder.set_start_time(now);
                snapshot
            })
            .collect()
    }

    fn close_window(&mut self, recorder: &dyn Recorder, now: i64) -> WindowSnapshot {
        recorder.set_stop_time(now);

        let needed = recorder.effective_count() * 2;
        if self.buf.len() < needed {
            self.buf.resize(needed, 0);
        }

        // Samples landing between the count and the fill can outgrow the
        // buffer; grow to what the fill observed and go again.
        let len = loop {
            match recorder.fill_sorted_records(&mut self.buf) {
                Ok(len) => break len,
                Err(RecorderError::BufferTooSmall { required, capacity }) => {
                    debug!(tag = %recorder.tag(), required, capacity, "snapshot_buffer_grown");
                    self.buf.resize(required, 0);
                }
            }
        };

        WindowSnapshot {
            tag: recorder.tag().to_string(),
            start_time: recorder.start_time(),
            stop_time: recorder.stop_time(),
            threshold_ms: recorder.threshold(),
            out_threshold_cardinality: recorder.out_threshold_cardinality(),
            records: decode_records(&self.buf, len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{RecorderMode, RecorderSettings};

    const MS: i64 = 1_000_000;

    fn registry(mode: RecorderMode) -> Recorders {
        Recorders::new(RecorderSettings { mode, threshold_ms: 100, ..Default::default() })
    }

    #[test]
    fn test_run_window_snapshots_and_resets() {
        let registry = registry(RecorderMode::Accurate);
        registry.register("b");
        registry.register("a");
        let mut reporter = Reporter::new();
        reporter.open_window(&registry, 1_000);

        registry.record_time("a", 0, 50 * MS);
        registry.record_time("a", 0, 100 * MS);
        registry.record_time("a", 10, 5);
        registry.record_time("b", 0, 7 * MS);

        let snapshots = reporter.run_window(&registry, 2_000);
        assert_eq!(snapshots.len(), 2);

        let a = &snapshots[0];
        assert_eq!(a.tag, "a");
        assert_eq!(a.start_time, 1_000);
        assert_eq!(a.stop_time, 2_000);
        assert_eq!(a.threshold_ms, 100);
        assert_eq!(a.out_threshold_cardinality, 1);
        assert_eq!(a.records, vec![Record { value: 50, count: 1 }, Record { value: 100, count: 1 }]);
        assert_eq!(a.total_count(), 2);
        assert_eq!(a.min_ms(), Some(50));
        assert_eq!(a.max_ms(), Some(100));

        assert_eq!(snapshots[1].records, vec![Record { value: 7, count: 1 }]);

        // Next window is open and empty
        let recorder = registry.get("a").unwrap();
        assert_eq!(recorder.effective_count(), 0);
        assert_eq!(recorder.start_time(), 2_000);
        assert_eq!(recorder.stop_time(), 0);
    }

    #[test]
    fn test_buffer_reused_across_windows() {
        let registry = registry(RecorderMode::Rough);
        registry.register("a");
        let mut reporter = Reporter::new();

        for ms in 0..10 {
            registry.record_time("a", 0, ms * MS);
        }
        let first = reporter.run_window(&registry, 1);
        assert_eq!(first[0].effective_count(), 10);
        assert_eq!(reporter.buf.len(), 20);

        registry.record_time("a", 0, 3 * MS);
        let second = reporter.run_window(&registry, 2);
        // Larger leftover buffer must not leak stale pairs
        assert_eq!(second[0].records, vec![Record { value: 3, count: 1 }]);
        assert_eq!(reporter.buf.len(), 20);
    }

    #[test]
    fn test_empty_window() {
        let registry = registry(RecorderMode::Accurate);
        registry.register("idle");
        let snapshots = Reporter::new().run_window(&registry, 5);
        assert!(snapshots[0].records.is_empty());
        assert_eq!(snapshots[0].max_ms(), None);
    }

    #[test]
    fn test_snapshot_json() {
        let snapshot = WindowSnapshot {
            tag: "GET /x".to_string(),
            start_time: 1,
            stop_time: 2,
            threshold_ms: 100,
            out_threshold_cardinality: 0,
            records: vec![Record { value: 5, count: 3 }],
        };
        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json_line().unwrap()).unwrap();
        assert_eq!(json["tag"], "GET /x");
        assert_eq!(json["records"][0]["value"], 5);
        assert_eq!(json["records"][0]["count"], 3);
    }
}

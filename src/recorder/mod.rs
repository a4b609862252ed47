//! Per-tag latency recorders
//!
//! A recorder accumulates request durations for one monitored endpoint into
//! exact per-millisecond counts and hands them to the reporter as a sorted
//! snapshot once per window.
//!
//! - `accurate` - exact counts for every value (array below threshold, map above)
//! - `rough` - exact counts below threshold, one shared slot for everything above
//! - `store` - the lock-free bucketed counter store behind `AccurateRecorder`
//! - `snapshot` - bounded writer for interleaved `(value, count)` buffers
//! - `registry` - one recorder per tag
//!
//! Snapshots race benignly with in-flight `record_time` calls: a sample that
//! completes exactly at the window boundary may or may not be included.

pub mod accurate;
pub mod registry;
pub mod rough;
pub mod snapshot;
pub mod store;
pub mod window;

pub use accurate::AccurateRecorder;
pub use registry::Recorders;
pub use rough::RoughRecorder;
pub use snapshot::Record;
pub use window::Window;

use crate::infra::error::RecorderError;
use serde::Deserialize;
use std::sync::Arc;

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Whole milliseconds between two nanosecond timestamps, truncated
///
/// Returns `None` when `start_nanos > end_nanos`; such samples come from clock
/// adjustments and are dropped.
#[inline]
pub fn elapsed_ms(start_nanos: i64, end_nanos: i64) -> Option<u64> {
    if start_nanos > end_nanos {
        return None;
    }
    Some(end_nanos.abs_diff(start_nanos) / NANOS_PER_MILLI)
}

/// Common interface of all recorder kinds
pub trait Recorder: Send + Sync {
    fn window(&self) -> &Window;

    /// Boundary between exact array slots and overflow storage (ms)
    fn threshold(&self) -> usize;

    /// Count one already-converted sample
    fn record_elapsed(&self, elapsed_ms: u64);

    /// Write ascending `(value, count)` pairs interleaved into `buf`
    ///
    /// `buf` must hold at least `2 * effective_count()` slots.
    fn fill_sorted_records(&self, buf: &mut [u64]) -> Result<usize, RecorderError>;

    /// Number of distinct values with a non-zero count this window
    fn effective_count(&self) -> usize;

    /// Approximate number of distinct values at or above the threshold
    fn out_threshold_cardinality(&self) -> usize;

    /// Zero all counts and clear the window timestamps
    fn reset(&self);

    /// Record a request that ran from `start_nanos` to `end_nanos`
    #[inline]
    fn record_time(&self, start_nanos: i64, end_nanos: i64) {
        if let Some(ms) = elapsed_ms(start_nanos, end_nanos) {
            self.record_elapsed(ms);
        }
    }

    /// Allocating snapshot, sized from `effective_count()` and grown if
    /// samples land between the count and the fill
    fn snapshot(&self) -> Vec<Record> {
        let mut buf = vec![0u64; self.effective_count() * 2];
        loop {
            match self.fill_sorted_records(&mut buf) {
                Ok(len) => return snapshot::decode_records(&buf, len),
                Err(RecorderError::BufferTooSmall { required, .. }) => buf.resize(required, 0),
            }
        }
    }

    fn tag(&self) -> &str {
        self.window().tag()
    }

    fn start_time(&self) -> i64 {
        self.window().start_time()
    }

    fn stop_time(&self) -> i64 {
        self.window().stop_time()
    }

    fn set_start_time(&self, t: i64) {
        self.window().set_start_time(t);
    }

    fn set_stop_time(&self, t: i64) {
        self.window().set_stop_time(t);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderMode {
    Rough,
    Accurate,
}

impl RecorderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecorderMode::Rough => "rough",
            RecorderMode::Accurate => "accurate",
        }
    }
}

/// Everything needed to build a recorder for a new tag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecorderSettings {
    pub mode: RecorderMode,
    /// Values below this (ms) get a dedicated counter slot
    pub threshold_ms: usize,
    /// Expected number of distinct values above threshold per window
    pub out_threshold_count: usize,
    /// Overflow keys above `decay_ratio × threshold_ms` are evicted on reset
    pub decay_ratio: f64,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            mode: RecorderMode::Accurate,
            threshold_ms: 1000,
            out_threshold_count: 64,
            decay_ratio: store::DEFAULT_DECAY_RATIO,
        }
    }
}

impl RecorderSettings {
    pub fn build(&self, tag: impl Into<String>) -> Arc<dyn Recorder> {
        match self.mode {
            RecorderMode::Accurate => Arc::new(AccurateRecorder::with_settings(tag, self)),
            RecorderMode::Rough => Arc::new(RoughRecorder::new(tag, self.threshold_ms)),
        }
    }
}

//! Exact recorder: one counter per observed millisecond value

use super::store::{BucketedCounterStore, DEFAULT_DECAY_RATIO};
use super::window::Window;
use super::{Recorder, RecorderSettings};
use crate::infra::error::RecorderError;

/// Records every distinct elapsed value exactly
///
/// Values below `threshold` hit a fixed array slot; values at or above it go
/// to an overflow map sized from `out_threshold_count`.
pub struct AccurateRecorder {
    window: Window,
    store: BucketedCounterStore,
}

impl AccurateRecorder {
    pub fn new(tag: impl Into<String>, threshold: usize, out_threshold_count: usize) -> Self {
        Self::with_decay_ratio(tag, threshold, out_threshold_count, DEFAULT_DECAY_RATIO)
    }

    /// Build from registry settings, honouring the configured decay ratio
    pub fn with_settings(tag: impl Into<String>, settings: &RecorderSettings) -> Self {
        Self::with_decay_ratio(
            tag,
            settings.threshold_ms,
            settings.out_threshold_count,
            settings.decay_ratio,
        )
    }

    fn with_decay_ratio(
        tag: impl Into<String>,
        threshold: usize,
        out_threshold_count: usize,
        decay_ratio: f64,
    ) -> Self {
        Self {
            window: Window::new(tag),
            store: BucketedCounterStore::with_decay_ratio(threshold, out_threshold_count, decay_ratio),
        }
    }

    pub fn store(&self) -> &BucketedCounterStore {
        &self.store
    }
}

impl Recorder for AccurateRecorder {
    fn window(&self) -> &Window {
        &self.window
    }

    fn threshold(&self) -> usize {
        self.store.threshold()
    }

    #[inline]
    fn record_elapsed(&self, elapsed_ms: u64) {
        self.store.record(elapsed_ms);
    }

    fn fill_sorted_records(&self, buf: &mut [u64]) -> Result<usize, RecorderError> {
        self.store.fill_sorted_records(buf)
    }

    fn effective_count(&self) -> usize {
        self.store.effective_count()
    }

    fn out_threshold_cardinality(&self) -> usize {
        self.store.out_threshold_cardinality()
    }

    fn reset(&self) {
        self.store.reset();
        self.window.clear();
    }
}

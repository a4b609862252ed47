//! Cheap recorder: exact below threshold, one saturating slot above
//!
//! Everything at or above the threshold lands in a single slot reported with
//! value `threshold`, read as "threshold ms or more". No map and no
//! allocation after construction.

use super::snapshot::RecordWriter;
use super::window::Window;
use super::Recorder;
use crate::infra::error::RecorderError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct RoughRecorder {
    window: Window,
    /// `threshold + 1` slots; the last one collects all values `>= threshold`
    slots: Box<[AtomicU64]>,
    reset_lock: Mutex<()>,
}

impl RoughRecorder {
    pub fn new(tag: impl Into<String>, threshold: usize) -> Self {
        debug_assert!(threshold > 0, "threshold must be positive");
        Self {
            window: Window::new(tag),
            slots: (0..=threshold).map(|_| AtomicU64::new(0)).collect(),
            reset_lock: Mutex::new(()),
        }
    }

    #[inline]
    fn saturated_slot(&self) -> usize {
        self.slots.len() - 1
    }
}

impl Recorder for RoughRecorder {
    fn window(&self) -> &Window {
        &self.window
    }

    fn threshold(&self) -> usize {
        self.saturated_slot()
    }

    #[inline]
    fn record_elapsed(&self, elapsed_ms: u64) {
        let idx = usize::try_from(elapsed_ms)
            .map_or(self.saturated_slot(), |i| i.min(self.saturated_slot()));
        self.slots[idx].fetch_add(1, Ordering::Relaxed);
    }

    fn fill_sorted_records(&self, buf: &mut [u64]) -> Result<usize, RecorderError> {
        let mut writer = RecordWriter::new(buf);
        for (value, slot) in self.slots.iter().enumerate() {
            let count = slot.load(Ordering::Relaxed);
            if count > 0 {
                writer.push(value as u64, count);
            }
        }
        writer.finish()
    }

    /// Scanned from the slots, so it stays exact across a record racing `reset`
    fn effective_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.load(Ordering::Relaxed) > 0).count()
    }

    fn out_threshold_cardinality(&self) -> usize {
        usize::from(self.slots[self.saturated_slot()].load(Ordering::Relaxed) > 0)
    }

    fn reset(&self) {
        let _guard = self.reset_lock.lock();
        for slot in self.slots.iter() {
            slot.store(0, Ordering::Relaxed);
        }
        self.window.clear();
    }
}

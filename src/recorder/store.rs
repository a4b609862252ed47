//! Bucketed counter store: exact per-millisecond counts
//!
//! Values below the threshold live in a fixed array of atomics, one slot per
//! millisecond. Values at or above the threshold go to a sharded map keyed by
//! millisecond value, so only rare tail latencies pay for a hash lookup.
//!
//! NOTE: All atomics use Relaxed ordering. These are statistical counters;
//! reads during a concurrent `record` may or may not observe that sample.

use super::snapshot::RecordWriter;
use crate::infra::error::RecorderError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default decay ratio: overflow keys above `1.5 × threshold` are evicted on reset
pub const DEFAULT_DECAY_RATIO: f64 = 1.5;

/// Capacity that holds `expected` entries without a resize at a 0.75 load factor
#[inline]
pub fn fit_capacity(expected: usize) -> usize {
    (expected as f64 / 0.75) as usize + 1
}

pub struct BucketedCounterStore {
    /// One counter per millisecond in `0..threshold`
    buckets: Box<[AtomicU64]>,
    /// Counters for values `>= threshold`
    overflow: DashMap<u64, AtomicU64, FxBuildHasher>,
    /// Overflow keys strictly above this are dropped on reset
    decay_cutoff: f64,
    /// Serializes `reset`; never taken by `record`
    reset_lock: Mutex<()>,
}

impl BucketedCounterStore {
    pub fn new(threshold: usize, overflow_capacity_hint: usize) -> Self {
        Self::with_decay_ratio(threshold, overflow_capacity_hint, DEFAULT_DECAY_RATIO)
    }

    pub fn with_decay_ratio(threshold: usize, overflow_capacity_hint: usize, decay_ratio: f64) -> Self {
        debug_assert!(threshold > 0, "threshold must be positive");
        Self {
            buckets: (0..threshold).map(|_| AtomicU64::new(0)).collect(),
            overflow: DashMap::with_capacity_and_hasher(
                fit_capacity(overflow_capacity_hint),
                FxBuildHasher,
            ),
            decay_cutoff: decay_ratio * threshold as f64,
            reset_lock: Mutex::new(()),
        }
    }

    #[inline]
    pub fn threshold(&self) -> usize {
        self.buckets.len()
    }

    /// Count one sample of `elapsed_ms` (lock-free for values below threshold)
    #[inline]
    pub fn record(&self, elapsed_ms: u64) {
        if let Some(bucket) = usize::try_from(elapsed_ms).ok().and_then(|i| self.buckets.get(i)) {
            bucket.fetch_add(1, Ordering::Relaxed);
            return;
        }

        if let Some(counter) = self.overflow.get(&elapsed_ms) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }

        // Insert-if-absent under the shard write lock; a racing writer that got
        // there first leaves an occupied entry we increment instead.
        match self.overflow.entry(elapsed_ms) {
            Entry::Occupied(entry) => {
                entry.get().fetch_add(1, Ordering::Relaxed);
            }
            Entry::Vacant(entry) => {
                entry.insert(AtomicU64::new(1));
            }
        }
    }

    /// Count of a single value in the current window
    pub fn count_of(&self, elapsed_ms: u64) -> u64 {
        match usize::try_from(elapsed_ms).ok().and_then(|i| self.buckets.get(i)) {
            Some(bucket) => bucket.load(Ordering::Relaxed),
            None => self
                .overflow
                .get(&elapsed_ms)
                .map(|c| c.load(Ordering::Relaxed))
                .unwrap_or(0),
        }
    }

    /// Whether an overflow slot exists for `key`, including zeroed survivors of a reset
    pub fn has_overflow_entry(&self, key: u64) -> bool {
        self.overflow.contains_key(&key)
    }

    /// Number of distinct values with a non-zero count
    pub fn effective_count(&self) -> usize {
        let in_array = self.buckets.iter().filter(|b| b.load(Ordering::Relaxed) > 0).count();
        let in_map = self.overflow.iter().filter(|e| e.value().load(Ordering::Relaxed) > 0).count();
        in_array + in_map
    }

    /// Rough estimate of distinct out-of-threshold values
    ///
    /// This is the raw map size, so entries zeroed by the last reset and not
    /// yet recorded again are still counted.
    pub fn out_threshold_cardinality(&self) -> usize {
        self.overflow.len()
    }

    /// Write ascending `(value, count)` pairs into `buf`, interleaved
    ///
    /// Returns the number of slots written. Fails without touching memory past
    /// `buf.len()` when the buffer cannot hold every non-zero pair seen.
    pub fn fill_sorted_records(&self, buf: &mut [u64]) -> Result<usize, RecorderError> {
        let mut writer = RecordWriter::new(buf);

        for (value, bucket) in self.buckets.iter().enumerate() {
            let count = bucket.load(Ordering::Relaxed);
            if count > 0 {
                writer.push(value as u64, count);
            }
        }

        let mut tail: Vec<(u64, u64)> = self
            .overflow
            .iter()
            .filter_map(|e| {
                let count = e.value().load(Ordering::Relaxed);
                (count > 0).then_some((*e.key(), count))
            })
            .collect();
        tail.sort_unstable_by_key(|&(value, _)| value);
        for (value, count) in tail {
            writer.push(value, count);
        }

        writer.finish()
    }

    /// Zero all counters and apply the overflow decay policy
    ///
    /// Concurrent `record` calls are not blocked; increments landing while the
    /// reset sweeps past their slot may be zeroed.
    pub fn reset(&self) {
        let _guard = self.reset_lock.lock();

        for bucket in self.buckets.iter() {
            bucket.store(0, Ordering::Relaxed);
        }

        let cutoff = self.decay_cutoff;
        self.overflow.retain(|&key, counter| {
            if key as f64 > cutoff || counter.load(Ordering::Relaxed) == 0 {
                return false;
            }
            counter.store(0, Ordering::Relaxed);
            true
        });
    }
}

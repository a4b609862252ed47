//! Synthetic request load for exercising recorders end to end
//!
//! Worker threads draw latencies from a seeded RNG and push them through the
//! registry exactly like request handlers would: as start/end nanosecond
//! timestamps. A small share of samples lands in the slow tail above the
//! recorder threshold, and a few are deliberately inverted to exercise the
//! discard path.

use crate::infra::Config;
use crate::recorder::Recorders;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

const NANOS_PER_MILLI: i64 = 1_000_000;

/// The synthetic clock restarts at zero once it passes this
const CLOCK_RESTART_NANOS: i64 = i64::MAX / 2;

/// Share of samples generated with start after end (clock step)
const INVERTED_PCT: f64 = 0.1;

/// Workers sleep briefly every this many samples so the demo doesn't pin a core
const PAUSE_EVERY: u64 = 256;
const PAUSE: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct LoadProfile {
    pub workers: usize,
    pub tags: Vec<String>,
    pub base_latency_ms: u64,
    pub jitter_ms: u64,
    /// Percentage of samples drawn from the tail (0-100)
    pub outlier_pct: f64,
    /// Recorder threshold; tail samples fall between 1× and 3× of it
    pub threshold_ms: u64,
    pub seed: u64,
}

impl LoadProfile {
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.load_workers(),
            tags: config.load_tags().to_vec(),
            base_latency_ms: config.load_base_latency_ms(),
            jitter_ms: config.load_jitter_ms(),
            outlier_pct: config.load_outlier_pct(),
            threshold_ms: config.most_time_threshold_ms() as u64,
            seed: config.load_seed(),
        }
    }
}

/// One synthetic completed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub tag_index: usize,
    pub start_nanos: i64,
    pub end_nanos: i64,
}

impl Sample {
    pub fn is_valid(&self) -> bool {
        self.start_nanos <= self.end_nanos
    }
}

/// Draw the next sample, advancing the worker's synthetic clock
pub fn next_sample(rng: &mut StdRng, profile: &LoadProfile, clock_nanos: &mut i64) -> Sample {
    let tag_index = rng.gen_range(0..profile.tags.len().max(1));

    let latency_ms = if rng.gen_bool(profile.outlier_pct / 100.0) {
        let factor: f64 = rng.gen_range(1.0..3.0);
        (profile.threshold_ms as f64 * factor) as u64
    } else {
        profile.base_latency_ms + rng.gen_range(0..=profile.jitter_ms)
    };
    let latency_nanos = latency_ms as i64 * NANOS_PER_MILLI + rng.gen_range(0..NANOS_PER_MILLI);

    if *clock_nanos > CLOCK_RESTART_NANOS {
        *clock_nanos = 0;
    }
    let start_nanos = *clock_nanos;
    *clock_nanos += latency_nanos;

    if rng.gen_bool(INVERTED_PCT / 100.0) {
        return Sample { tag_index, start_nanos: start_nanos + latency_nanos, end_nanos: start_nanos };
    }
    Sample { tag_index, start_nanos, end_nanos: start_nanos + latency_nanos }
}

/// Spawn one thread per worker; each returns the number of valid samples it recorded
///
/// Every profile tag is registered before the workers start. Workers stop
/// once `running` is cleared.
pub fn run(
    registry: Arc<Recorders>,
    profile: LoadProfile,
    running: Arc<AtomicBool>,
) -> Vec<JoinHandle<u64>> {
    for tag in &profile.tags {
        registry.register(tag);
    }

    let profile = Arc::new(profile);
    (0..profile.workers)
        .map(|worker_id| {
            let registry = registry.clone();
            let profile = profile.clone();
            let running = running.clone();
            thread::spawn(move || worker(worker_id, &registry, &profile, &running))
        })
        .collect()
}

fn worker(id: usize, registry: &Recorders, profile: &LoadProfile, running: &AtomicBool) -> u64 {
    // Each worker gets its own deterministic RNG seeded uniquely.
    let mut rng = StdRng::seed_from_u64(profile.seed + id as u64);
    let mut clock_nanos = 0i64;
    let mut generated = 0u64;
    let mut recorded = 0u64;

    while running.load(Ordering::Relaxed) && !profile.tags.is_empty() {
        let sample = next_sample(&mut rng, profile, &mut clock_nanos);
        let tag = &profile.tags[sample.tag_index];
        if registry.record_time(tag, sample.start_nanos, sample.end_nanos) && sample.is_valid() {
            recorded += 1;
        }

        generated += 1;
        if generated % PAUSE_EVERY == 0 {
            thread::sleep(PAUSE);
        }
    }

    debug!(worker = id, generated, recorded, "load_worker_stopped");
    recorded
}

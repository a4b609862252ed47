//! Window metadata shared by all recorder kinds

use std::sync::atomic::{AtomicI64, Ordering};

/// Timestamp value meaning "not set"
pub const UNSET_TIME: i64 = 0;

/// Tag plus the start/stop timestamps of the current reporting window
#[derive(Debug)]
pub struct Window {
    tag: String,
    start_time: AtomicI64,
    stop_time: AtomicI64,
}

impl Window {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            start_time: AtomicI64::new(UNSET_TIME),
            stop_time: AtomicI64::new(UNSET_TIME),
        }
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    pub fn start_time(&self) -> i64 {
        self.start_time.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn stop_time(&self) -> i64 {
        self.stop_time.load(Ordering::Relaxed)
    }

    pub fn set_start_time(&self, t: i64) {
        self.start_time.store(t, Ordering::Relaxed);
    }

    pub fn set_stop_time(&self, t: i64) {
        self.stop_time.store(t, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.set_start_time(UNSET_TIME);
        self.set_stop_time(UNSET_TIME);
    }
}

//! Recorder contract errors

use thiserror::Error;

/// Errors surfaced by recorder operations
///
/// The hot path never fails; the only reportable failure is a caller handing
/// `fill_sorted_records` a buffer that cannot hold the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    /// Destination buffer is shorter than 2 × the number of observed records
    #[error("buffer too small: snapshot needs {required} slots, buffer has {capacity}")]
    BufferTooSmall { required: usize, capacity: usize },
}

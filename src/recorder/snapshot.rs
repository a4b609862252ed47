//! Snapshot extraction into caller-provided buffers
//!
//! Snapshots are flat `[value, count, value, count, ...]` slices so the
//! reporter can reuse one buffer across windows. `RecordWriter` enforces the
//! buffer bound: it never writes past the end, and when it runs out of room it
//! keeps counting so the error can say how much space was actually needed.

use crate::infra::error::RecorderError;
use serde::Serialize;

/// One `(elapsed ms, count)` pair of a window snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Record {
    pub value: u64,
    pub count: u64,
}

/// Bounded sequential writer over an interleaved pair buffer
pub(crate) struct RecordWriter<'a> {
    buf: &'a mut [u64],
    pos: usize,
    pairs: usize,
}

impl<'a> RecordWriter<'a> {
    pub(crate) fn new(buf: &'a mut [u64]) -> Self {
        Self { buf, pos: 0, pairs: 0 }
    }

    /// Append a pair; pairs that no longer fit are only counted
    #[inline]
    pub(crate) fn push(&mut self, value: u64, count: u64) {
        self.pairs += 1;
        if self.pos + 2 <= self.buf.len() {
            self.buf[self.pos] = value;
            self.buf[self.pos + 1] = count;
            self.pos += 2;
        }
    }

    /// Slots written, or `BufferTooSmall` if any pair was dropped
    pub(crate) fn finish(self) -> Result<usize, RecorderError> {
        let required = self.pairs * 2;
        if required > self.buf.len() {
            return Err(RecorderError::BufferTooSmall { required, capacity: self.buf.len() });
        }
        Ok(self.pos)
    }
}

/// Decode the first `len` slots of an interleaved buffer into typed records
pub fn decode_records(buf: &[u64], len: usize) -> Vec<Record> {
    buf[..len.min(buf.len())]
        .chunks_exact(2)
        .map(|pair| Record { value: pair[0], count: pair[1] })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_fills_in_order() {
        let mut buf = [0u64; 4];
        let mut writer = RecordWriter::new(&mut buf);
        writer.push(3, 10);
        writer.push(120, 1);
        assert_eq!(writer.finish(), Ok(4));
        assert_eq!(buf, [3, 10, 120, 1]);
    }

    #[test]
    fn test_writer_counts_past_capacity() {
        let mut buf = [0u64; 3];
        let mut writer = RecordWriter::new(&mut buf);
        writer.push(1, 1);
        writer.push(2, 1);
        writer.push(3, 1);
        assert_eq!(
            writer.finish(),
            Err(RecorderError::BufferTooSmall { required: 6, capacity: 3 })
        );
        // Only the first complete pair fit
        assert_eq!(buf, [1, 1, 0]);
    }

    #[test]
    fn test_decode_records() {
        let buf = [50, 1, 100, 1, 0, 0];
        assert_eq!(
            decode_records(&buf, 4),
            vec![Record { value: 50, count: 1 }, Record { value: 100, count: 1 }]
        );
        assert!(decode_records(&buf, 0).is_empty());
    }
}

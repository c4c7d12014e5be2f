//! In-memory series entities
//!
//! A `MemSeries` is the record the head index hands out for one unique
//! label set. Its identity (reference, labels, label hash) is fixed at
//! construction and never changes; the ingestion-path state (last-seen
//! timestamp, open chunk boundaries) is the only mutable part.

use crate::labels::Labels;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// Process-lifetime-unique series identifier
///
/// Assigned monotonically at creation and never reused while the
/// process runs, so a dangling reference can only ever resolve to
/// "gone", not to a different series.
pub type SeriesRef = u64;

/// State of the chunk currently open for appends
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkBounds {
    /// Timestamp of the first sample in the open chunk
    pub min_time: i64,
    /// Timestamp of the latest sample in the open chunk
    pub max_time: i64,
    /// Samples appended to the open chunk so far
    pub samples: u64,
    /// Value of the latest sample
    pub last_value: f64,
}

#[derive(Debug, Default)]
struct OpenChunk {
    bounds: ChunkBounds,
    /// Aligned timestamp at which the open chunk ends and a new one is cut
    cut_at: i64,
}

/// One unique series owned by the head index
///
/// Structural operations (lookup, insert, remove) only read the
/// immutable identity and the last-seen timestamp; the open chunk state
/// belongs to the ingestion path, which is expected to serialize its own
/// appends to a single series.
#[derive(Debug)]
pub struct MemSeries {
    reference: SeriesRef,
    labels: Labels,
    label_hash: u64,
    chunk_range: i64,
    /// Millisecond timestamp of the last observed sample; `i64::MIN`
    /// until the first append, so a series that never saw a sample is
    /// older than every retention boundary
    last_seen: AtomicI64,
    chunk: Mutex<OpenChunk>,
}

impl MemSeries {
    pub(crate) fn new(
        reference: SeriesRef,
        labels: Labels,
        label_hash: u64,
        chunk_range: i64,
    ) -> Self {
        Self {
            reference,
            labels,
            label_hash,
            chunk_range,
            last_seen: AtomicI64::new(i64::MIN),
            chunk: Mutex::new(OpenChunk::default()),
        }
    }

    /// The unique reference assigned at creation
    pub fn reference(&self) -> SeriesRef {
        self.reference
    }

    /// The canonical label set identifying this series
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Hash of the label set, as used for stripe placement
    pub fn label_hash(&self) -> u64 {
        self.label_hash
    }

    /// Timestamp of the most recent sample, or `i64::MIN` before any append
    pub fn last_seen(&self) -> i64 {
        self.last_seen.load(Ordering::Acquire)
    }

    /// Record one sample arrival
    ///
    /// Extends the open chunk, cutting a new one when the timestamp
    /// crosses the chunk-range boundary. Returns true when a new chunk
    /// was cut (including for the very first sample).
    pub fn append(&self, timestamp: i64, value: f64) -> bool {
        self.last_seen.fetch_max(timestamp, Ordering::AcqRel);

        let mut chunk = self.chunk.lock().unwrap();
        let cut = chunk.bounds.samples == 0 || timestamp >= chunk.cut_at;
        if cut {
            chunk.bounds.min_time = timestamp;
            chunk.bounds.max_time = timestamp;
            chunk.bounds.samples = 0;
            chunk.cut_at = chunk_boundary(timestamp, self.chunk_range);
        }
        chunk.bounds.max_time = chunk.bounds.max_time.max(timestamp);
        chunk.bounds.last_value = value;
        chunk.bounds.samples += 1;
        cut
    }

    /// Snapshot of the open chunk state
    pub fn open_chunk(&self) -> ChunkBounds {
        self.chunk.lock().unwrap().bounds
    }
}

/// First chunk-range multiple strictly greater than `timestamp`
///
/// Chunks are aligned to absolute multiples of the range rather than
/// sliding from the first append, so all series cut at the same walls.
fn chunk_boundary(timestamp: i64, chunk_range: i64) -> i64 {
    timestamp - timestamp.rem_euclid(chunk_range) + chunk_range
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::Labels;

    fn test_series(chunk_range: i64) -> MemSeries {
        let labels = Labels::from_pairs([("__name__", "test")]);
        let hash = labels.hash();
        MemSeries::new(1, labels, hash, chunk_range)
    }

    #[test]
    fn test_identity_is_fixed() {
        let series = test_series(1000);

        assert_eq!(series.reference(), 1);
        assert_eq!(series.labels().metric_name(), Some("test"));
        assert_eq!(series.label_hash(), series.labels().hash());
    }

    #[test]
    fn test_append_updates_last_seen() {
        let series = test_series(1000);
        assert_eq!(series.last_seen(), i64::MIN);

        series.append(500, 1.0);
        assert_eq!(series.last_seen(), 500);

        // An older sample never moves last_seen backwards
        series.append(300, 2.0);
        assert_eq!(series.last_seen(), 500);
    }

    #[test]
    fn test_chunk_cut_on_range_boundary() {
        let series = test_series(1000);

        assert!(series.append(100, 1.0)); // first sample always cuts
        assert!(!series.append(900, 2.0)); // same chunk
        assert!(series.append(1000, 3.0)); // crosses the 1000 wall

        let bounds = series.open_chunk();
        assert_eq!(bounds.min_time, 1000);
        assert_eq!(bounds.samples, 1);
        assert_eq!(bounds.last_value, 3.0);
    }

    #[test]
    fn test_chunk_boundary_alignment() {
        assert_eq!(chunk_boundary(0, 1000), 1000);
        assert_eq!(chunk_boundary(999, 1000), 1000);
        assert_eq!(chunk_boundary(1000, 1000), 2000);
        assert_eq!(chunk_boundary(-1, 1000), 0);
    }
}

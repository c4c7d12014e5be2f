//! Head engine - orchestrates the stripe map and lifecycle hooks
//!
//! `Head` is the entry point of the crate: the write path hands it a
//! label set (plus its precomputed hash) and gets back the one canonical
//! `MemSeries` for that label set, creating it exactly once under any
//! number of concurrent callers. Stale series are reclaimed by `gc`,
//! with the configured lifecycle hooks notified in batch.

use crate::head::error::{HeadError, HeadResult};
use crate::head::lifecycle::{NoopLifecycle, SeriesLifecycle};
use crate::head::series::{MemSeries, SeriesRef};
use crate::head::stripes::StripeSeries;
use crate::labels::Labels;
use chrono::Utc;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default chunk range: two hours of samples per chunk
pub const DEFAULT_CHUNK_RANGE_MS: i64 = 2 * 60 * 60 * 1000;

/// Default number of stripes per view of the series map
pub const DEFAULT_STRIPE_COUNT: usize = 16384;

/// Configuration for the head index
///
/// Passive value object consumed once at construction; the head never
/// mutates it afterwards.
#[derive(Clone)]
pub struct HeadOptions {
    /// Root directory handed to the chunk subsystem
    pub data_dir: PathBuf,
    /// Width of one chunk in milliseconds; cut points align to multiples
    pub chunk_range: i64,
    /// Number of stripes per view; must be a power of two
    pub stripe_count: usize,
    /// Admission/notification hooks
    pub lifecycle: Arc<dyn SeriesLifecycle>,
}

impl Default for HeadOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("headwater_data"),
            chunk_range: DEFAULT_CHUNK_RANGE_MS,
            stripe_count: DEFAULT_STRIPE_COUNT,
            lifecycle: Arc::new(NoopLifecycle),
        }
    }
}

impl HeadOptions {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Builder: set the lifecycle hooks
    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn SeriesLifecycle>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Get path to the chunk directory root
    pub fn chunk_dir(&self) -> PathBuf {
        self.data_dir.join("chunks")
    }

    fn validate(&self) -> HeadResult<()> {
        if self.chunk_range <= 0 {
            return Err(HeadError::Config(format!(
                "chunk_range must be positive, got {}",
                self.chunk_range
            )));
        }
        if self.stripe_count == 0 || !self.stripe_count.is_power_of_two() {
            return Err(HeadError::Config(format!(
                "stripe_count must be a power of two, got {}",
                self.stripe_count
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for HeadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadOptions")
            .field("data_dir", &self.data_dir)
            .field("chunk_range", &self.chunk_range)
            .field("stripe_count", &self.stripe_count)
            .finish_non_exhaustive()
    }
}

/// Counters describing the head's series population
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadStats {
    /// Series currently reachable in the index
    pub active_series: u64,
    /// Series created since the head was opened
    pub series_created: u64,
    /// Series removed by garbage collection since the head was opened
    pub series_removed: u64,
}

/// The series index of the write head
pub struct Head {
    options: HeadOptions,
    series: StripeSeries,
    /// Next reference to hand out; references start at 1 and are never
    /// reused within a process run
    next_ref: AtomicU64,
    created: AtomicU64,
    removed: AtomicU64,
}

impl Head {
    /// Open a head with the given options
    ///
    /// Creates the chunk directory root so the chunk subsystem can rely
    /// on it existing.
    pub fn new(options: HeadOptions) -> HeadResult<Self> {
        options.validate()?;
        std::fs::create_dir_all(options.chunk_dir())?;

        tracing::info!(
            stripes = options.stripe_count,
            chunk_range = options.chunk_range,
            "Head index initialized"
        );

        let stripe_count = options.stripe_count;
        Ok(Self {
            options,
            series: StripeSeries::new(stripe_count),
            next_ref: AtomicU64::new(1),
            created: AtomicU64::new(0),
            removed: AtomicU64::new(0),
        })
    }

    /// Resolve a label set to its canonical series, creating it if absent
    ///
    /// `hash` is the caller-precomputed `labels.hash()`; the hot
    /// ingestion path computes it once per scrape and passes it down.
    ///
    /// On a miss the configured `pre_creation` hook is consulted while
    /// the owning stripe lock is held; a veto fails the call with the
    /// hook's error and leaves the index untouched - no series, no
    /// reference consumed. Vetoes are re-evaluated on every call.
    pub fn get_or_create(&self, hash: u64, labels: Labels) -> HeadResult<Arc<MemSeries>> {
        let (series, created) = self.series.get_or_insert_with(hash, labels, |labels| {
            self.options.lifecycle.pre_creation(&labels)?;

            // Reference allocation is a lone atomic increment, shared by
            // all stripes but independent of every stripe lock.
            let reference = self.next_ref.fetch_add(1, Ordering::Relaxed);
            Ok(Arc::new(MemSeries::new(
                reference,
                labels,
                hash,
                self.options.chunk_range,
            )))
        })?;

        if created {
            self.created.fetch_add(1, Ordering::Relaxed);
            // The series is fully visible by now; the hook runs outside
            // every stripe lock so it cannot stall other creations.
            self.options.lifecycle.post_creation(series.labels());
        }
        Ok(series)
    }

    /// `get_or_create` for callers that have not precomputed the hash
    pub fn get_or_create_by_labels(&self, labels: Labels) -> HeadResult<Arc<MemSeries>> {
        let hash = labels.hash();
        self.get_or_create(hash, labels)
    }

    /// Look up an existing series by label hash and label set
    pub fn get(&self, hash: u64, labels: &Labels) -> Option<Arc<MemSeries>> {
        self.series.get_by_hash(hash, labels)
    }

    /// Look up an existing series by reference
    ///
    /// `None` means the series no longer exists (or never did); callers
    /// on the ingestion path re-resolve by labels in that case.
    pub fn get_by_ref(&self, reference: SeriesRef) -> Option<Arc<MemSeries>> {
        self.series.get_by_ref(reference)
    }

    /// Garbage-collect series whose last-seen timestamp is older than
    /// `boundary`, returning how many were removed
    ///
    /// Series that never saw a sample count as older than any boundary.
    /// Stripes are swept independently under their own locks. The
    /// `post_deletion` hook is invoked exactly once per pass with the
    /// full batch of removed series, and not at all for an empty sweep.
    pub fn gc(&self, boundary: i64) -> usize {
        let removed = self.series.gc(boundary);
        let count = removed.len();

        if count > 0 {
            self.removed.fetch_add(count as u64, Ordering::Relaxed);
            self.options.lifecycle.post_deletion(&removed);
        }

        tracing::debug!(removed = count, boundary, "Series garbage collection finished");
        count
    }

    /// Garbage-collect series not seen for at least `max_age`
    ///
    /// Convenience over [`Head::gc`] for wall-clock retention windows.
    pub fn gc_older_than(&self, max_age: std::time::Duration) -> usize {
        let boundary = Utc::now().timestamp_millis() - max_age.as_millis() as i64;
        self.gc(boundary)
    }

    /// Number of series currently in the index
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Snapshot of the head's population counters
    pub fn stats(&self) -> HeadStats {
        HeadStats {
            active_series: self.series.len() as u64,
            series_created: self.created.load(Ordering::Relaxed),
            series_removed: self.removed.load(Ordering::Relaxed),
        }
    }

    /// The options this head was opened with
    pub fn options(&self) -> &HeadOptions {
        &self.options
    }

    /// The chunk directory root prepared at construction
    pub fn chunk_dir(&self) -> PathBuf {
        self.options.chunk_dir()
    }
}

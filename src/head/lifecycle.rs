//! Series lifecycle hooks
//!
//! The head consults a `SeriesLifecycle` implementation at the three
//! points where the series population changes: before a creation (which
//! the hook may veto), after a creation, and after a garbage-collection
//! pass. Hooks are how collaborators enforce admission policy and keep
//! secondary indexes or counters in step with the head, without the head
//! knowing anything about them.

use crate::head::error::{HeadError, HeadResult};
use crate::head::series::SeriesRef;
use crate::labels::Labels;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hooks into the life of a series
///
/// Implementations are shared across all stripes of one head and must be
/// safe for concurrent invocation.
pub trait SeriesLifecycle: Send + Sync {
    /// Admission check for a new label set
    ///
    /// Called while the owning hash-stripe lock is held, so it gates the
    /// hot path under contention: it must be fast and must never block on
    /// I/O. An error vetoes the creation; the head inserts nothing and
    /// consumes no reference. Rejections are re-evaluated on every call -
    /// there is no negative caching.
    fn pre_creation(&self, labels: &Labels) -> HeadResult<()>;

    /// Notification that a series was created and is fully visible
    ///
    /// Called outside the creating stripe's lock; side effects only.
    fn post_creation(&self, labels: &Labels);

    /// Notification of one garbage-collection pass
    ///
    /// Called exactly once per pass with every removed series, and not at
    /// all when nothing was removed.
    fn post_deletion(&self, removed: &HashMap<SeriesRef, Labels>);
}

/// Default policy: unconditionally allow creation, ignore notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLifecycle;

impl SeriesLifecycle for NoopLifecycle {
    fn pre_creation(&self, _labels: &Labels) -> HeadResult<()> {
        Ok(())
    }

    fn post_creation(&self, _labels: &Labels) {}

    fn post_deletion(&self, _removed: &HashMap<SeriesRef, Labels>) {}
}

/// Admission policy capping the number of active series
///
/// Vetoes creation once the active count reaches the limit; slots freed
/// by garbage collection become available again. The rejection counter is
/// how the owner observes vetoed creations - the head itself does not
/// count them.
#[derive(Debug)]
pub struct CardinalityLimiter {
    limit: u64,
    active: AtomicU64,
    rejected: AtomicU64,
}

impl CardinalityLimiter {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            active: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Series currently admitted
    pub fn active(&self) -> u64 {
        self.active.load(Ordering::Relaxed)
    }

    /// Creations vetoed so far
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl SeriesLifecycle for CardinalityLimiter {
    fn pre_creation(&self, _labels: &Labels) -> HeadResult<()> {
        // Reserve a slot up front: once admission succeeds the insert
        // cannot fail, so the reservation is never rolled back.
        let mut current = self.active.load(Ordering::Relaxed);
        loop {
            if current >= self.limit {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                return Err(HeadError::SeriesLimitReached(self.limit));
            }
            match self.active.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(()),
                Err(observed) => current = observed,
            }
        }
    }

    fn post_creation(&self, _labels: &Labels) {}

    fn post_deletion(&self, removed: &HashMap<SeriesRef, Labels>) {
        self.active.fetch_sub(removed.len() as u64, Ordering::Relaxed);
    }
}

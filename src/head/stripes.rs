//! Striped series map - two lock-sharded views of the same series set
//!
//! A single map guarded by a single lock would serialize every series
//! creation in the process. `StripeSeries` splits the series set across a
//! fixed number of independently-locked shards, twice over:
//!
//! - **hash-stripes**, keyed by the 64-bit label hash, serve the
//!   label-based lookup on the ingestion path;
//! - **reference-stripes**, keyed by the assigned series reference,
//!   serve reference-based lookups without contending with them.
//!
//! ```text
//! label hash  % N → hash-stripe  → hash → [series, ...] (conflict chain)
//! reference   % N → ref-stripe   → ref  → series
//! ```
//!
//! Lock order is fixed: a reference-stripe lock is only ever acquired
//! while holding a hash-stripe lock, never the other way around, so the
//! two lock families cannot deadlock against each other.

use crate::head::error::HeadResult;
use crate::head::series::{MemSeries, SeriesRef};
use crate::labels::Labels;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One hash-keyed shard: label hash → chain of series with that hash
///
/// Chains are nearly always a single entry; longer chains only appear on
/// genuine 64-bit hash collisions and are resolved by full label
/// comparison.
#[derive(Default)]
struct HashShard {
    series: HashMap<u64, Vec<Arc<MemSeries>>>,
}

impl HashShard {
    fn get(&self, hash: u64, labels: &Labels) -> Option<&Arc<MemSeries>> {
        self.series
            .get(&hash)?
            .iter()
            .find(|s| s.labels() == labels)
    }
}

/// One reference-keyed shard
#[derive(Default)]
struct RefShard {
    series: HashMap<SeriesRef, Arc<MemSeries>>,
}

/// The sharded two-map series index
pub struct StripeSeries {
    /// `stripe_count - 1`; stripe count is a power of two
    mask: usize,
    hash_shards: Vec<Mutex<HashShard>>,
    ref_shards: Vec<Mutex<RefShard>>,
}

impl StripeSeries {
    /// Create an empty striped map with `stripe_count` shards per view
    ///
    /// `stripe_count` must be a power of two (validated by `HeadOptions`).
    pub fn new(stripe_count: usize) -> Self {
        debug_assert!(stripe_count.is_power_of_two());
        Self {
            mask: stripe_count - 1,
            hash_shards: (0..stripe_count).map(|_| Mutex::default()).collect(),
            ref_shards: (0..stripe_count).map(|_| Mutex::default()).collect(),
        }
    }

    #[inline]
    fn stripe_for(&self, key: u64) -> usize {
        key as usize & self.mask
    }

    /// Look up a series by label hash and full label set
    pub fn get_by_hash(&self, hash: u64, labels: &Labels) -> Option<Arc<MemSeries>> {
        let shard = self.hash_shards[self.stripe_for(hash)].lock().unwrap();
        shard.get(hash, labels).cloned()
    }

    /// Look up a series by its reference
    pub fn get_by_ref(&self, reference: SeriesRef) -> Option<Arc<MemSeries>> {
        let shard = self.ref_shards[self.stripe_for(reference)].lock().unwrap();
        shard.series.get(&reference).cloned()
    }

    /// Return the series for `labels`, creating it if absent
    ///
    /// The whole miss-check-construct-insert sequence runs under the
    /// owning hash-stripe lock, which is what makes creation exactly-once:
    /// a racing caller for the same label set blocks on the same stripe
    /// and finds the finished entry on the fast path. `create` is invoked
    /// only on a miss; an error from it (an admission veto) leaves the
    /// map untouched. The boolean is true when a new series was inserted.
    pub fn get_or_insert_with<F>(
        &self,
        hash: u64,
        labels: Labels,
        create: F,
    ) -> HeadResult<(Arc<MemSeries>, bool)>
    where
        F: FnOnce(Labels) -> HeadResult<Arc<MemSeries>>,
    {
        let mut shard = self.hash_shards[self.stripe_for(hash)].lock().unwrap();
        if let Some(series) = shard.get(hash, &labels) {
            return Ok((Arc::clone(series), false));
        }

        let series = create(labels)?;

        // The series is fully constructed before it is linked anywhere,
        // and both links happen under the hash-stripe lock: hash first,
        // then reference, the one permitted order.
        shard
            .series
            .entry(hash)
            .or_default()
            .push(Arc::clone(&series));
        let mut refs = self.ref_shards[self.stripe_for(series.reference())].lock().unwrap();
        refs.series.insert(series.reference(), Arc::clone(&series));
        drop(refs);

        Ok((series, true))
    }

    /// Unlink one series from both views
    ///
    /// Both removals happen under the hash-stripe lock, so by-hash
    /// readers cannot observe the intermediate state and by-ref readers
    /// see the series either fully present or already gone. Returns false
    /// if the series was not present (already collected).
    pub fn remove(&self, series: &MemSeries) -> bool {
        let hash = series.label_hash();
        let mut shard = self.hash_shards[self.stripe_for(hash)].lock().unwrap();

        let Some(chain) = shard.series.get_mut(&hash) else {
            return false;
        };
        let Some(pos) = chain.iter().position(|s| s.reference() == series.reference()) else {
            return false;
        };
        chain.swap_remove(pos);
        if chain.is_empty() {
            shard.series.remove(&hash);
        }

        let mut refs = self.ref_shards[self.stripe_for(series.reference())].lock().unwrap();
        refs.series.remove(&series.reference());
        true
    }

    /// Sweep out every series whose last-seen timestamp is older than
    /// `boundary`, returning the removed `reference → labels` pairs
    ///
    /// Each stripe is collected under its own lock; there is no global
    /// pause. A series being created concurrently is either not yet
    /// linked (the creator holds its stripe lock) or fully linked, so the
    /// sweep never observes a half-inserted entry.
    pub fn gc(&self, boundary: i64) -> HashMap<SeriesRef, Labels> {
        let mut removed = HashMap::new();

        for shard in &self.hash_shards {
            let mut shard = shard.lock().unwrap();
            shard.series.retain(|_, chain| {
                chain.retain(|series| {
                    if series.last_seen() >= boundary {
                        return true;
                    }
                    let mut refs =
                        self.ref_shards[self.stripe_for(series.reference())].lock().unwrap();
                    refs.series.remove(&series.reference());
                    drop(refs);
                    removed.insert(series.reference(), series.labels().clone());
                    false
                });
                !chain.is_empty()
            });
        }

        removed
    }

    /// Number of live series across all stripes
    pub fn len(&self) -> usize {
        self.ref_shards
            .iter()
            .map(|shard| shard.lock().unwrap().series.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! The write-head series index
//!
//! This module maps incoming samples to series identities and manages
//! their lifetime:
//!
//! - **series**: `MemSeries`, the per-series record owned by the index
//! - **stripes**: lock-sharded two-map index (by label hash, by reference)
//! - **lifecycle**: pluggable admission and notification hooks
//! - **engine**: the `Head` itself - get-or-create, lookup, GC
//! - **error**: error types
//!
//! # Architecture
//!
//! ```text
//! Ingestion Path:
//!   labels → hash → Head::get_or_create → stripe lock → hit? return
//!                                                     → miss? pre_creation → insert both views → post_creation
//!
//! Reclamation:
//!   Head::gc(boundary) → sweep stripes independently → post_deletion(batch)
//! ```

pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod series;
pub mod stripes;

// Re-export commonly used types
pub use engine::{Head, HeadOptions, HeadStats, DEFAULT_CHUNK_RANGE_MS, DEFAULT_STRIPE_COUNT};
pub use error::{HeadError, HeadResult};
pub use lifecycle::{CardinalityLimiter, NoopLifecycle, SeriesLifecycle};
pub use series::{ChunkBounds, MemSeries, SeriesRef};
pub use stripes::StripeSeries;

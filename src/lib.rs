//! # Headwater
//!
//! In-memory series index and lifecycle manager for the mutable write
//! head of a time-series database.
//!
//! ## Features
//!
//! - **Exactly-once creation**: concurrent writers racing on the same
//!   label set always resolve to one series with one reference
//! - **Lock striping**: the series map is sharded across independently
//!   locked stripes, twice - by label hash and by reference - so
//!   creation and reference lookups contend only within their stripe
//! - **Pluggable admission**: a lifecycle hook can veto series creation
//!   (cardinality limiting) without any index mutation
//! - **Batched reclamation**: garbage collection sweeps stripes
//!   independently and notifies downstream consumers once per pass
//!
//! ## Modules
//!
//! - [`labels`]: Canonical label sets and their identity hash
//! - [`head`]: The series index - entities, stripes, hooks, engine
//! - [`config`]: TOML/environment configuration loading
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use headwater::{Head, HeadOptions, Labels};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let head = Head::new(HeadOptions::new("./headwater_data"))?;
//!
//!     // Resolve a sample's labels to its series, creating it once
//!     let labels = Labels::from_pairs([("__name__", "cpu_seconds"), ("core", "0")]);
//!     let series = head.get_or_create(labels.hash(), labels)?;
//!     series.append(1_700_000_000_000, 0.42);
//!
//!     // Later: reclaim series not seen since the retention boundary
//!     let removed = head.gc(1_700_000_000_000 - 3_600_000);
//!     println!("collected {} stale series", removed);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod head;
pub mod labels;

// Re-export top-level types for convenience
pub use head::{
    CardinalityLimiter, Head, HeadError, HeadOptions, HeadResult, HeadStats, MemSeries,
    NoopLifecycle, SeriesLifecycle, SeriesRef,
};

pub use labels::{Label, Labels, METRIC_NAME_LABEL};

pub use config::{Config, ConfigError};

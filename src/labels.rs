//! Label sets - the identity of a series
//!
//! A series is identified by its set of `name=value` labels. This module
//! provides the canonical representation used throughout the head:
//! labels are sorted by name, deduplicated, and immutable once built,
//! so two series are the same series iff their `Labels` compare equal.
//!
//! The 64-bit label hash computed here drives stripe placement in the
//! head index. It is a content hash, not a guarantee of uniqueness:
//! colliding label sets are disambiguated by full comparison.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

/// Reserved label name carrying the metric name
///
/// For `http_requests_total{method="POST"}` the `__name__` label holds
/// `http_requests_total` and `method` is an ordinary label.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// A single `name=value` label pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An immutable, canonically ordered label set
///
/// Construction sorts labels by name and drops duplicate names, so any
/// two `Labels` built from the same logical set are byte-for-byte equal
/// regardless of input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Labels(Vec<Label>);

impl Labels {
    /// Build a canonical label set from `(name, value)` pairs
    ///
    /// Later pairs with an already-seen name are ignored.
    pub fn from_pairs<N, V, I>(pairs: I) -> Self
    where
        N: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (N, V)>,
    {
        let mut labels: Vec<Label> = pairs
            .into_iter()
            .map(|(n, v)| Label::new(n, v))
            .collect();
        // Stable sort keeps the first occurrence of a duplicated name
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        labels.dedup_by(|b, a| a.name == b.name);
        Self(labels)
    }

    /// Number of labels in the set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a label value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .binary_search_by(|l| l.name.as_str().cmp(name))
            .ok()
            .map(|idx| self.0[idx].value.as_str())
    }

    /// The metric name, if the set carries a `__name__` label
    pub fn metric_name(&self) -> Option<&str> {
        self.get(METRIC_NAME_LABEL)
    }

    /// Iterate labels in canonical (name-sorted) order
    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.0.iter()
    }

    /// 64-bit identity hash of the canonical label sequence
    ///
    /// Length-prefixes every name and value so that no crafted label
    /// content can produce the same byte stream as a different set.
    pub fn hash(&self) -> u64 {
        let mut buf = Vec::with_capacity(self.0.len() * 32);
        for label in &self.0 {
            buf.extend_from_slice(&(label.name.len() as u32).to_le_bytes());
            buf.extend_from_slice(label.name.as_bytes());
            buf.extend_from_slice(&(label.value.len() as u32).to_le_bytes());
            buf.extend_from_slice(label.value.as_bytes());
        }
        xxh3_64(&buf)
    }
}

impl fmt::Display for Labels {
    /// Render in the usual exposition format: `name{a="1", b="2"}`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.metric_name() {
            write!(f, "{}", name)?;
        }
        write!(f, "{{")?;
        let mut first = true;
        for label in &self.0 {
            if label.name == METRIC_NAME_LABEL {
                continue;
            }
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}=\"{}\"", label.name, label.value)?;
            first = false;
        }
        write!(f, "}}")
    }
}

impl<'a> IntoIterator for &'a Labels {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

use cells::{FamilyName, Row};

use crate::StoreError;

/// Rows fetched per round trip by a scanner unless overridden.
pub const DEFAULT_SCAN_BATCH: usize = 100;

/// A lazily produced, finite, non-restartable sequence of rows in ascending
/// key order.
pub type RowStream = Box<dyn Iterator<Item = Result<Row, StoreError>> + Send>;

/// Server-side row key predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFilter {
    KeyEquals(Vec<u8>),
    KeyPrefix(Vec<u8>),
    /// Key contains the given bytes anywhere.
    KeyContains(Vec<u8>),
}

impl RowFilter {
    pub fn matches(&self, key: &[u8]) -> bool {
        match self {
            RowFilter::KeyEquals(k) => key == k.as_slice(),
            RowFilter::KeyPrefix(p) => key.starts_with(p),
            RowFilter::KeyContains(needle) => {
                needle.is_empty() || key.windows(needle.len()).any(|w| w == needle.as_slice())
            }
        }
    }
}

/// A range read request.
///
/// `start` is inclusive, `stop` is exclusive; an empty bound is unbounded on
/// that side. An empty `families` list selects every family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub start: Vec<u8>,
    pub stop: Vec<u8>,
    pub families: Vec<FamilyName>,
    /// Versions returned per cell, further capped by each family's schema.
    pub max_versions: usize,
    pub filter: Option<RowFilter>,
    /// Rows fetched per round trip.
    pub batch_size: usize,
}

impl Default for Scan {
    fn default() -> Self {
        Self {
            start: Vec::new(),
            stop: Vec::new(),
            families: Vec::new(),
            max_versions: 1,
            filter: None,
            batch_size: DEFAULT_SCAN_BATCH,
        }
    }
}

impl Scan {
    /// A full-table scan.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(start: impl Into<Vec<u8>>, stop: impl Into<Vec<u8>>) -> Self {
        Self {
            start: start.into(),
            stop: stop.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_family(mut self, family: FamilyName) -> Self {
        if !self.families.contains(&family) {
            self.families.push(family);
        }
        self
    }

    #[must_use]
    pub fn with_max_versions(mut self, max_versions: usize) -> Self {
        self.max_versions = max_versions.max(1);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// `true` if `key` lies within `[start, stop)`.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        key_in_range(key, &self.start, &self.stop)
    }

    /// `true` if the row key passes the range and the row filter.
    pub fn accepts(&self, key: &[u8]) -> bool {
        self.contains_key(key) && self.filter.as_ref().map_or(true, |f| f.matches(key))
    }
}

/// `start <= key < end`, with empty bounds meaning unbounded.
pub fn key_in_range(key: &[u8], start: &[u8], end: &[u8]) -> bool {
    let lower_ok = start.is_empty() || key >= start;
    let upper_ok = end.is_empty() || key < end;
    lower_ok && upper_ok
}

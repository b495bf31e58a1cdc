//! Region layout of a table.
//!
//! A table created with `k` split keys is served by `k + 1` regions. Region
//! `i` holds every row key in `[splits[i-1], splits[i])`, with the first region
//! unbounded below and the last one unbounded above.
//!
//! ```text
//!  splits:     "000|"      "001|"
//!  regions: [ 0 ] ───────── [ 1 ] ───────── [ 2 ]
//!         ""  .. "000|"  "000|" .. "001|"  "001|" .. ""
//! ```
use std::collections::BTreeMap;
use std::ops::Bound;

use cells::Row;

use crate::scan::key_in_range;
use crate::StoreError;

/// Read-only summary of one region, as returned by
/// [`Store::regions`](crate::Store::regions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    pub index: usize,
    /// Inclusive lower bound; empty means unbounded.
    pub start: Vec<u8>,
    /// Exclusive upper bound; empty means unbounded.
    pub end: Vec<u8>,
    /// Rows currently stored in the region.
    pub rows: usize,
}

impl RegionInfo {
    pub fn contains(&self, key: &[u8]) -> bool {
        key_in_range(key, &self.start, &self.end)
    }
}

/// Checks that split keys are non-empty and strictly increasing.
pub fn validate_splits(splits: &[Vec<u8>]) -> Result<(), StoreError> {
    for (i, split) in splits.iter().enumerate() {
        if split.is_empty() {
            return Err(StoreError::InvalidSplits(format!(
                "split key {i} is empty"
            )));
        }
        if i > 0 && splits[i - 1] >= *split {
            return Err(StoreError::InvalidSplits(format!(
                "split key {i} is not greater than split key {}",
                i - 1
            )));
        }
    }
    Ok(())
}

/// Index of the region that owns `key`.
pub fn locate(splits: &[Vec<u8>], key: &[u8]) -> usize {
    splits.partition_point(|s| s.as_slice() <= key)
}

/// One key range of a table and the rows stored in it.
#[derive(Debug, Clone, Default)]
pub(crate) struct Region {
    pub start: Vec<u8>,
    pub end: Vec<u8>,
    pub rows: BTreeMap<Vec<u8>, Row>,
}

impl Region {
    /// Builds the `splits.len() + 1` empty regions for a split list.
    pub fn layout(splits: &[Vec<u8>]) -> Vec<Region> {
        let mut regions = Vec::with_capacity(splits.len() + 1);
        let mut start = Vec::new();
        for split in splits {
            regions.push(Region {
                start: std::mem::replace(&mut start, split.clone()),
                end: split.clone(),
                rows: BTreeMap::new(),
            });
        }
        regions.push(Region {
            start,
            end: Vec::new(),
            rows: BTreeMap::new(),
        });
        regions
    }

    pub fn info(&self, index: usize) -> RegionInfo {
        RegionInfo {
            index,
            start: self.start.clone(),
            end: self.end.clone(),
            rows: self.rows.len(),
        }
    }

    /// Rows with keys `>= from` (and `< stop` when `stop` is non-empty), in
    /// key order.
    pub fn rows_from<'a>(
        &'a self,
        from: &[u8],
        stop: &'a [u8],
    ) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows
            .range::<[u8], _>((Bound::Included(from), Bound::Unbounded))
            .take_while(move |(k, _)| stop.is_empty() || k.as_slice() < stop)
            .map(|(_, row)| row)
    }
}

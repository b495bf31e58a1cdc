use std::collections::BTreeMap;

use crate::{FamilyName, Qualifier, Timestamp};

/// One timestamped value of a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellVersion {
    pub timestamp: Timestamp,
    pub value: Vec<u8>,
}

/// All retained versions of a single `(family, qualifier)` cell, newest first.
///
/// At most one value exists per timestamp: writing the same timestamp again
/// replaces the value (last write wins at timestamp granularity).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Versions(Vec<CellVersion>);

impl Versions {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts a version, keeping descending timestamp order. Returns the
    /// value previously stored at the same timestamp, if any.
    pub fn insert(&mut self, timestamp: Timestamp, value: Vec<u8>) -> Option<Vec<u8>> {
        // newest first, so search with reversed ordering
        match self
            .0
            .binary_search_by(|v| timestamp.cmp(&v.timestamp))
        {
            Ok(idx) => Some(std::mem::replace(&mut self.0[idx].value, value)),
            Err(idx) => {
                self.0.insert(idx, CellVersion { timestamp, value });
                None
            }
        }
    }

    /// The newest version, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&CellVersion> {
        self.0.first()
    }

    /// Iterates versions newest first.
    pub fn iter(&self) -> impl Iterator<Item = &CellVersion> {
        self.0.iter()
    }

    /// Drops everything beyond the `max` newest versions. Returns how many
    /// versions were removed.
    pub fn truncate(&mut self, max: usize) -> usize {
        let before = self.0.len();
        self.0.truncate(max);
        before - self.0.len()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A borrowed view of a single cell version, as produced by [`Row::cells`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef<'a> {
    pub family: &'a FamilyName,
    pub qualifier: &'a [u8],
    pub timestamp: Timestamp,
    pub value: &'a [u8],
}

/// A row: its key and every retained cell version, grouped by family and
/// qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    key: Vec<u8>,
    families: BTreeMap<FamilyName, BTreeMap<Qualifier, Versions>>,
}

impl Row {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            families: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Returns `true` if the row holds no cells at all.
    pub fn is_empty(&self) -> bool {
        self.families.values().all(|q| q.values().all(Versions::is_empty))
    }

    /// Stores a cell version. Same-timestamp writes overwrite.
    pub fn insert(
        &mut self,
        family: FamilyName,
        qualifier: impl Into<Qualifier>,
        timestamp: Timestamp,
        value: impl Into<Vec<u8>>,
    ) {
        self.families
            .entry(family)
            .or_default()
            .entry(qualifier.into())
            .or_default()
            .insert(timestamp, value.into());
    }

    /// Latest value of a cell.
    pub fn value(&self, family: &FamilyName, qualifier: &[u8]) -> Option<&[u8]> {
        self.versions(family, qualifier)
            .and_then(Versions::latest)
            .map(|v| v.value.as_slice())
    }

    pub fn versions(&self, family: &FamilyName, qualifier: &[u8]) -> Option<&Versions> {
        self.families.get(family).and_then(|q| q.get(qualifier))
    }

    /// Families present in this row, in sorted order.
    pub fn families(&self) -> impl Iterator<Item = &FamilyName> {
        self.families.keys()
    }

    /// Every cell version in `(family, qualifier, timestamp desc)` order.
    pub fn cells(&self) -> impl Iterator<Item = CellRef<'_>> {
        self.families.iter().flat_map(|(family, qualifiers)| {
            qualifiers.iter().flat_map(move |(qualifier, versions)| {
                versions.iter().map(move |v| CellRef {
                    family,
                    qualifier: qualifier.as_slice(),
                    timestamp: v.timestamp,
                    value: v.value.as_slice(),
                })
            })
        })
    }

    /// Total number of cell versions in the row.
    pub fn cell_count(&self) -> usize {
        self.families
            .values()
            .flat_map(|q| q.values())
            .map(Versions::len)
            .sum()
    }

    /// Removes a whole family. Returns `true` if it was present.
    pub fn remove_family(&mut self, family: &FamilyName) -> bool {
        self.families.remove(family).is_some()
    }

    /// Keeps only the families for which `keep` returns `true`.
    pub fn retain_families<F>(&mut self, mut keep: F)
    where
        F: FnMut(&FamilyName) -> bool,
    {
        self.families.retain(|f, _| keep(f));
    }

    /// Truncates every cell to the number of versions `max_for` returns for
    /// its family. Returns how many versions were dropped.
    pub fn truncate_versions<F>(&mut self, mut max_for: F) -> usize
    where
        F: FnMut(&FamilyName) -> usize,
    {
        let mut dropped = 0;
        for (family, qualifiers) in self.families.iter_mut() {
            let max = max_for(family);
            for versions in qualifiers.values_mut() {
                dropped += versions.truncate(max);
            }
            qualifiers.retain(|_, v| !v.is_empty());
        }
        self.families.retain(|_, q| !q.is_empty());
        dropped
    }
}

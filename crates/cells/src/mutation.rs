use std::collections::BTreeSet;

use crate::{CellRef, FamilyName, Qualifier, Timestamp};

/// A single cell carried by a [`Put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutCell {
    pub family: FamilyName,
    pub qualifier: Qualifier,
    /// Explicit timestamp, or `None` to let the store assign its clock.
    pub timestamp: Option<Timestamp>,
    pub value: Vec<u8>,
}

/// A write of one or more cells to a single row.
///
/// Putting the same `(row, family, qualifier, timestamp)` twice is an
/// idempotent overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Put {
    row: Vec<u8>,
    cells: Vec<PutCell>,
}

impl Put {
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            cells: Vec::new(),
        }
    }

    #[must_use]
    pub fn row(&self) -> &[u8] {
        &self.row
    }

    pub fn cells(&self) -> &[PutCell] {
        &self.cells
    }

    /// Adds a cell whose timestamp is assigned by the store.
    pub fn add_column(
        &mut self,
        family: FamilyName,
        qualifier: impl Into<Qualifier>,
        value: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.cells.push(PutCell {
            family,
            qualifier: qualifier.into(),
            timestamp: None,
            value: value.into(),
        });
        self
    }

    /// Adds a cell with an explicit timestamp.
    pub fn add_column_at(
        &mut self,
        family: FamilyName,
        qualifier: impl Into<Qualifier>,
        timestamp: Timestamp,
        value: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.cells.push(PutCell {
            family,
            qualifier: qualifier.into(),
            timestamp: Some(timestamp),
            value: value.into(),
        });
        self
    }

    /// Copies an existing cell version, preserving its timestamp.
    pub fn add_cell(&mut self, cell: CellRef<'_>) -> &mut Self {
        self.add_column_at(
            cell.family.clone(),
            cell.qualifier.to_vec(),
            cell.timestamp,
            cell.value.to_vec(),
        )
    }

    /// Distinct families referenced by this put.
    pub fn families(&self) -> BTreeSet<&FamilyName> {
        self.cells.iter().map(|c| &c.family).collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Removal of a whole row, or of selected families of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    row: Vec<u8>,
    families: Vec<FamilyName>,
}

impl Delete {
    /// Deletes every family of `row`.
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            families: Vec::new(),
        }
    }

    /// Narrows the delete to `family`. May be called more than once.
    #[must_use]
    pub fn family(mut self, family: FamilyName) -> Self {
        if !self.families.contains(&family) {
            self.families.push(family);
        }
        self
    }

    #[must_use]
    pub fn row(&self) -> &[u8] {
        &self.row
    }

    /// Families targeted by this delete; empty means the whole row.
    pub fn families(&self) -> &[FamilyName] {
        &self.families
    }

    pub fn is_whole_row(&self) -> bool {
        self.families.is_empty()
    }
}

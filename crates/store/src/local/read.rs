//! Read path: point gets and batched range scans.
use std::collections::VecDeque;
use std::sync::Arc;

use cells::{FamilyName, Row};
use tracing::trace;

use super::{Shared, TableState};
use crate::{locate, RowStream, Scan, StoreError, TableName};

/// Copies the visible part of `row`: only `families` (all when empty), and
/// per cell at most `max_versions` versions, further capped by the family
/// schema. Families no longer in the schema are never visible.
fn project(table: &TableState, row: &Row, families: &[FamilyName], max_versions: usize) -> Row {
    let mut out = Row::new(row.key());
    let mut current: Option<(&FamilyName, &[u8])> = None;
    let mut taken = 0usize;

    for cell in row.cells() {
        if !families.is_empty() && !families.contains(cell.family) {
            continue;
        }
        let Some(schema) = table.descriptor.family(cell.family) else {
            continue;
        };
        if current != Some((cell.family, cell.qualifier)) {
            current = Some((cell.family, cell.qualifier));
            taken = 0;
        }
        if taken < max_versions.min(schema.max_versions) {
            out.insert(
                cell.family.clone(),
                cell.qualifier.to_vec(),
                cell.timestamp,
                cell.value.to_vec(),
            );
            taken += 1;
        }
    }
    out
}

fn check_families(
    table: &TableState,
    name: &TableName,
    families: &[FamilyName],
) -> Result<(), StoreError> {
    match families.iter().find(|f| !table.descriptor.has_family(f)) {
        Some(missing) => Err(StoreError::FamilyNotFound {
            table: name.clone(),
            family: missing.to_string(),
        }),
        None => Ok(()),
    }
}

impl Shared {
    pub(crate) fn get(&self, name: &TableName, key: &[u8]) -> Result<Option<Row>, StoreError> {
        let state = self.read();
        let table = state.enabled_table(name)?;
        let row = table
            .region_for(key)
            .rows
            .get(key)
            .map(|row| project(table, row, &[], 1))
            .filter(|row| !row.is_empty());
        Ok(row)
    }
}

/// Opens a lazily evaluated scan. Table state and requested families are
/// checked up front; rows are then pulled in batches of `scan.batch_size`,
/// each under a short read lock.
pub(crate) fn scanner(
    shared: Arc<Shared>,
    name: &TableName,
    scan: &Scan,
) -> Result<RowStream, StoreError> {
    {
        let state = shared.read();
        let table = state.enabled_table(name)?;
        check_families(table, name, &scan.families)?;
    }
    trace!(
        table = %name,
        start = ?scan.start,
        stop = ?scan.stop,
        "opened scanner"
    );
    Ok(Box::new(LocalScanner {
        shared,
        table: name.clone(),
        next_start: scan.start.clone(),
        scan: scan.clone(),
        buffer: VecDeque::new(),
        exhausted: false,
    }))
}

struct LocalScanner {
    shared: Arc<Shared>,
    table: TableName,
    scan: Scan,
    /// Smallest key not yet examined.
    next_start: Vec<u8>,
    buffer: VecDeque<Row>,
    exhausted: bool,
}

impl LocalScanner {
    fn fetch_batch(&mut self) -> Result<(), StoreError> {
        let state = self.shared.read();
        let table = state.enabled_table(&self.table)?;
        let scan = &self.scan;
        let batch = scan.batch_size.max(1);

        let first_region = locate(&table.splits, &self.next_start);
        for region in &table.regions[first_region..] {
            if !scan.stop.is_empty() && region.start.as_slice() >= scan.stop.as_slice() {
                break;
            }
            for row in region.rows_from(&self.next_start, &scan.stop) {
                if self.buffer.len() == batch {
                    return Ok(());
                }
                let mut resume = row.key().to_vec();
                resume.push(0);
                self.next_start = resume;

                if !scan.accepts(row.key()) {
                    continue;
                }
                let visible = project(table, row, &scan.families, scan.max_versions);
                if !visible.is_empty() {
                    self.buffer.push_back(visible);
                }
            }
        }
        self.exhausted = true;
        Ok(())
    }
}

impl Iterator for LocalScanner {
    type Item = Result<Row, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.buffer.pop_front() {
                return Some(Ok(row));
            }
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.fetch_batch() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
    }
}

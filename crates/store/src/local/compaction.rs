//! Flush and major compaction.
//!
//! Rows are always held fully in memory, so a flush only has to make the
//! journal durable. Major compaction discards versions beyond each family's
//! `max_versions` and rewrites the journal with exactly the surviving cells.
use journal::{JournalRecord, JournalWriter};
use tracing::info;

use super::{Shared, TableState};
use crate::{StoreError, TableName};

impl Shared {
    pub(crate) fn flush(&self, name: &TableName) -> Result<(), StoreError> {
        let mut state = self.write();
        let table = state.table_mut(name)?;
        if let Some(journal) = table.journal.as_mut() {
            journal.sync_to_disk()?;
        }
        info!(table = %name, "flushed table");
        Ok(())
    }

    pub(crate) fn major_compact(&self, name: &TableName) -> Result<(), StoreError> {
        let mut state = self.write();
        let table = state.table_mut(name)?;

        let descriptor = table.descriptor.clone();
        let mut dropped = 0;
        for region in &mut table.regions {
            for row in region.rows.values_mut() {
                dropped += row.truncate_versions(|family| {
                    descriptor.family(family).map_or(0, |f| f.max_versions)
                });
            }
            region.rows.retain(|_, row| !row.is_empty());
        }
        self.rewrite_journal(table)?;

        info!(table = %name, dropped_versions = dropped, "major compaction finished");
        Ok(())
    }

    /// Replaces the table journal with one `Put` record per retained cell
    /// version and reopens the writer on the new file.
    pub(crate) fn rewrite_journal(&self, table: &mut TableState) -> Result<(), StoreError> {
        let Some(path) = self.journal_path(&table.descriptor.name) else {
            return Ok(());
        };

        let mut records = Vec::new();
        for region in &table.regions {
            for row in region.rows.values() {
                records.extend(row.cells().map(|cell| JournalRecord::Put {
                    row: row.key().to_vec(),
                    family: cell.family.as_bytes().to_vec(),
                    qualifier: cell.qualifier.to_vec(),
                    timestamp: cell.timestamp,
                    value: cell.value.to_vec(),
                }));
            }
        }

        // release the handle on the old file before it is renamed over
        table.journal = None;
        JournalWriter::rewrite(&path, records)?;
        table.journal = Some(JournalWriter::create(&path, self.journal_sync)?);
        Ok(())
    }
}

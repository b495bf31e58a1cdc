//! Write path: put and delete.
//!
//! Every mutation is validated in full, appended to the table journal, and
//! only then applied to the owning region.
use cells::{Delete, FamilyName, Put, Qualifier, Row, Timestamp};
use journal::JournalRecord;
use tracing::trace;

use super::{Shared, TableState};
use crate::{StoreError, TableName};

impl TableState {
    fn check_family(&self, name: &TableName, family: &FamilyName) -> Result<(), StoreError> {
        if self.descriptor.has_family(family) {
            Ok(())
        } else {
            Err(StoreError::FamilyNotFound {
                table: name.clone(),
                family: family.to_string(),
            })
        }
    }

    fn append(&mut self, record: &JournalRecord) -> Result<(), StoreError> {
        if let Some(journal) = self.journal.as_mut() {
            journal.append(record)?;
        }
        Ok(())
    }

    pub(crate) fn apply_put(
        &mut self,
        key: &[u8],
        family: FamilyName,
        qualifier: Qualifier,
        timestamp: Timestamp,
        value: Vec<u8>,
    ) {
        self.region_for_mut(key)
            .rows
            .entry(key.to_vec())
            .or_insert_with(|| Row::new(key))
            .insert(family, qualifier, timestamp, value);
    }

    pub(crate) fn apply_delete_row(&mut self, key: &[u8]) {
        self.region_for_mut(key).rows.remove(key);
    }

    pub(crate) fn apply_delete_family(&mut self, key: &[u8], family: &FamilyName) {
        let rows = &mut self.region_for_mut(key).rows;
        if let Some(row) = rows.get_mut(key) {
            row.remove_family(family);
            if row.is_empty() {
                rows.remove(key);
            }
        }
    }
}

impl Shared {
    pub(crate) fn put(&self, name: &TableName, put: &Put) -> Result<(), StoreError> {
        if put.row().is_empty() {
            return Err(StoreError::InvalidMutation(
                "row key must not be empty".to_string(),
            ));
        }
        if put.is_empty() {
            return Err(StoreError::InvalidMutation(
                "put must carry at least one cell".to_string(),
            ));
        }

        let mut state = self.write();
        let table = state.enabled_table_mut(name)?;
        for family in put.families() {
            table.check_family(name, family)?;
        }

        let key = put.row();
        for cell in put.cells() {
            let timestamp = match cell.timestamp {
                Some(ts) => {
                    self.observe_timestamp(ts);
                    ts
                }
                None => self.next_timestamp(),
            };
            table.append(&JournalRecord::Put {
                row: key.to_vec(),
                family: cell.family.as_bytes().to_vec(),
                qualifier: cell.qualifier.clone(),
                timestamp,
                value: cell.value.clone(),
            })?;
            table.apply_put(
                key,
                cell.family.clone(),
                cell.qualifier.clone(),
                timestamp,
                cell.value.clone(),
            );
        }
        trace!(table = %name, cells = put.len(), "put");
        Ok(())
    }

    pub(crate) fn delete(&self, name: &TableName, delete: &Delete) -> Result<(), StoreError> {
        let key = delete.row();
        if key.is_empty() {
            return Err(StoreError::InvalidMutation(
                "row key must not be empty".to_string(),
            ));
        }

        let mut state = self.write();
        let table = state.enabled_table_mut(name)?;
        for family in delete.families() {
            table.check_family(name, family)?;
        }

        if delete.is_whole_row() {
            table.append(&JournalRecord::DeleteRow { row: key.to_vec() })?;
            table.apply_delete_row(key);
        } else {
            for family in delete.families() {
                table.append(&JournalRecord::DeleteFamily {
                    row: key.to_vec(),
                    family: family.as_bytes().to_vec(),
                })?;
                table.apply_delete_family(key, family);
            }
        }
        trace!(table = %name, families = delete.families().len(), "delete");
        Ok(())
    }
}

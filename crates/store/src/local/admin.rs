//! Namespace and table administration.
use std::collections::BTreeSet;
use std::fs;

use journal::JournalWriter;
use tracing::{debug, info};

use super::{Shared, State, TableState};
use crate::catalog::{Catalog, CatalogTable};
use crate::{validate_namespace, validate_splits, StoreError, TableDescriptor, TableName};

impl Shared {
    pub(crate) fn list_tables(&self) -> Result<Vec<TableName>, StoreError> {
        Ok(self.read().tables.keys().cloned().collect())
    }

    pub(crate) fn create_namespace(&self, name: &str) -> Result<(), StoreError> {
        validate_namespace(name)?;
        let mut state = self.write();
        if !state.namespaces.insert(name.to_string()) {
            return Err(StoreError::NamespaceExists(name.to_string()));
        }
        if let Err(e) = self.save_catalog(&state) {
            state.namespaces.remove(name);
            return Err(e);
        }
        info!(namespace = name, "created namespace");
        Ok(())
    }

    pub(crate) fn create_table(
        &self,
        descriptor: &TableDescriptor,
        splits: Option<&[Vec<u8>]>,
    ) -> Result<(), StoreError> {
        descriptor.validate()?;
        let splits = splits.map(<[Vec<u8>]>::to_vec).unwrap_or_default();
        validate_splits(&splits)?;

        let name = descriptor.name.clone();
        let mut state = self.write();
        if !state.namespaces.contains(name.namespace()) {
            return Err(StoreError::NamespaceNotFound(name.namespace().to_string()));
        }
        if state.tables.contains_key(&name) {
            return Err(StoreError::TableExists(name));
        }

        let mut table = TableState::new(descriptor.clone(), splits);
        if let (Some(dir), Some(path)) = (self.table_dir(&name), self.journal_path(&name)) {
            fs::create_dir_all(&dir)?;
            // a leftover journal from a dropped table must not leak rows
            JournalWriter::rewrite(&path, Vec::new())?;
            table.journal = Some(JournalWriter::create(&path, self.journal_sync)?);
        }

        let regions = table.regions.len();
        state.tables.insert(name.clone(), table);
        if let Err(e) = self.save_catalog(&state) {
            state.tables.remove(&name);
            return Err(e);
        }
        info!(
            table = %name,
            families = descriptor.families.len(),
            regions,
            "created table"
        );
        Ok(())
    }

    pub(crate) fn set_enabled(&self, name: &TableName, enabled: bool) -> Result<(), StoreError> {
        let mut state = self.write();
        let table = state.table_mut(name)?;
        if table.enabled == enabled {
            return Ok(());
        }
        table.enabled = enabled;
        self.save_catalog(&state)?;
        info!(table = %name, enabled, "changed table state");
        Ok(())
    }

    pub(crate) fn delete_table(&self, name: &TableName) -> Result<(), StoreError> {
        let mut state = self.write();
        if state.table(name)?.enabled {
            return Err(StoreError::TableNotDisabled(name.clone()));
        }
        let table = state
            .tables
            .remove(name)
            .ok_or_else(|| StoreError::TableNotFound(name.clone()))?;
        let rows = table.row_count();
        drop(table);

        if let Some(path) = self.journal_path(name) {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.save_catalog(&state)?;
        info!(table = %name, rows, "deleted table");
        Ok(())
    }

    pub(crate) fn modify_table(&self, descriptor: &TableDescriptor) -> Result<(), StoreError> {
        descriptor.validate()?;
        let name = &descriptor.name;
        let mut state = self.write();
        let table = state.table_mut(name)?;

        let kept: BTreeSet<_> = descriptor.families.iter().map(|f| f.name.clone()).collect();
        let dropped: Vec<_> = table
            .descriptor
            .families
            .iter()
            .filter(|f| !kept.contains(&f.name))
            .map(|f| f.name.to_string())
            .collect();

        table.descriptor = descriptor.clone();
        if !dropped.is_empty() {
            for region in &mut table.regions {
                for row in region.rows.values_mut() {
                    row.retain_families(|f| kept.contains(f));
                }
                region.rows.retain(|_, row| !row.is_empty());
            }
            self.rewrite_journal(table)?;
        }

        self.save_catalog(&state)?;
        info!(table = %name, dropped_families = ?dropped, "modified table");
        Ok(())
    }

    /// Writes the catalog for persisted stores; a no-op in memory.
    pub(crate) fn save_catalog(&self, state: &State) -> Result<(), StoreError> {
        let Some(root) = &self.root else {
            return Ok(());
        };
        let catalog = Catalog {
            namespaces: state.namespaces.iter().cloned().collect(),
            tables: state
                .tables
                .values()
                .map(|t| CatalogTable {
                    descriptor: t.descriptor.clone(),
                    enabled: t.enabled,
                    splits: t.splits.clone(),
                })
                .collect(),
        };
        catalog.save(root)?;
        debug!(tables = catalog.tables.len(), "saved catalog");
        Ok(())
    }
}

//! In-process [`Store`] implementation.
//!
//! Tables are split into regions at their split keys; every region keeps its
//! rows in a `BTreeMap` so scans come out in key order. When opened on a
//! directory, each table's mutations are appended to
//! `<dir>/data/<namespace>/<table>.journal` and schema changes are written to
//! the catalog, so a reopened store sees the same tables and rows.
//!
//! A `LocalStore` is the shared handle; [`LocalConnection`] is what tasks
//! hold. The store counts open connections so callers can check that every
//! task released its connection.
mod admin;
mod compaction;
mod read;
mod recovery;
mod write;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use cells::{Delete, Put, Row};
use config::StoreConfig;
use journal::JournalWriter;
use tracing::debug;

use crate::region::Region;
use crate::{
    Connector, RegionInfo, RowStream, Scan, Store, StoreError, TableDescriptor, TableName,
    DEFAULT_NAMESPACE,
};

/// Runtime state of one table.
pub(crate) struct TableState {
    pub descriptor: TableDescriptor,
    pub enabled: bool,
    pub splits: Vec<Vec<u8>>,
    pub regions: Vec<Region>,
    /// `None` for in-memory stores.
    pub journal: Option<JournalWriter>,
}

impl TableState {
    pub fn new(descriptor: TableDescriptor, splits: Vec<Vec<u8>>) -> Self {
        let regions = Region::layout(&splits);
        Self {
            descriptor,
            enabled: true,
            splits,
            regions,
            journal: None,
        }
    }

    pub fn region_for(&self, key: &[u8]) -> &Region {
        &self.regions[crate::locate(&self.splits, key)]
    }

    pub fn region_for_mut(&mut self, key: &[u8]) -> &mut Region {
        let idx = crate::locate(&self.splits, key);
        &mut self.regions[idx]
    }

    pub fn row_count(&self) -> usize {
        self.regions.iter().map(|r| r.rows.len()).sum()
    }

    pub fn region_infos(&self) -> Vec<RegionInfo> {
        self.regions
            .iter()
            .enumerate()
            .map(|(i, r)| r.info(i))
            .collect()
    }
}

pub(crate) struct State {
    pub namespaces: BTreeSet<String>,
    pub tables: BTreeMap<TableName, TableState>,
}

impl State {
    pub fn new() -> Self {
        let mut namespaces = BTreeSet::new();
        namespaces.insert(DEFAULT_NAMESPACE.to_string());
        Self {
            namespaces,
            tables: BTreeMap::new(),
        }
    }

    pub fn table(&self, name: &TableName) -> Result<&TableState, StoreError> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::TableNotFound(name.clone()))
    }

    pub fn table_mut(&mut self, name: &TableName) -> Result<&mut TableState, StoreError> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StoreError::TableNotFound(name.clone()))
    }

    /// Like [`State::table`] but also rejects disabled tables.
    pub fn enabled_table(&self, name: &TableName) -> Result<&TableState, StoreError> {
        let table = self.table(name)?;
        if !table.enabled {
            return Err(StoreError::TableDisabled(name.clone()));
        }
        Ok(table)
    }

    pub fn enabled_table_mut(&mut self, name: &TableName) -> Result<&mut TableState, StoreError> {
        let table = self.table_mut(name)?;
        if !table.enabled {
            return Err(StoreError::TableDisabled(name.clone()));
        }
        Ok(table)
    }
}

pub(crate) struct Shared {
    /// Store directory; `None` for in-memory stores.
    pub root: Option<PathBuf>,
    pub journal_sync: bool,
    state: RwLock<State>,
    clock: AtomicU64,
    open_connections: AtomicUsize,
    reachable: AtomicBool,
}

impl Shared {
    fn new(root: Option<PathBuf>, journal_sync: bool, state: State, last_ts: u64) -> Self {
        Self {
            root,
            journal_sync,
            state: RwLock::new(state),
            clock: AtomicU64::new(last_ts),
            open_connections: AtomicUsize::new(0),
            reachable: AtomicBool::new(true),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Next store-assigned timestamp: wall-clock millis, strictly increasing.
    pub fn next_timestamp(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut prev = self.clock.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev.saturating_add(1));
            match self
                .clock
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Moves the clock forward so it never hands out `ts` or anything older.
    pub fn observe_timestamp(&self, ts: u64) {
        self.clock.fetch_max(ts, Ordering::AcqRel);
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.reachable.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::Connectivity(
                "coordinator did not respond".to_string(),
            ))
        }
    }

    pub fn table_dir(&self, table: &TableName) -> Option<PathBuf> {
        self.root
            .as_ref()
            .map(|root| root.join("data").join(table.namespace()))
    }

    pub fn journal_path(&self, table: &TableName) -> Option<PathBuf> {
        self.table_dir(table)
            .map(|dir| dir.join(format!("{}.journal", table.qualifier())))
    }
}

/// A store living in this process, optionally persisted to a directory.
#[derive(Clone)]
pub struct LocalStore {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.read();
        f.debug_struct("LocalStore")
            .field("root", &self.shared.root)
            .field("journal_sync", &self.shared.journal_sync)
            .field("namespaces", &state.namespaces.len())
            .field("tables", &state.tables.len())
            .field("open_connections", &self.open_connections())
            .finish()
    }
}

impl LocalStore {
    /// A store with nothing on disk.
    pub fn in_memory() -> Self {
        Self {
            shared: Arc::new(Shared::new(None, false, State::new(), 0)),
        }
    }

    /// Opens (or creates) a store in `dir`, replaying its catalog and
    /// journals.
    pub fn open<P: AsRef<Path>>(dir: P, journal_sync: bool) -> Result<Self, StoreError> {
        let root = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        let (state, last_ts) = recovery::recover(&root, journal_sync)?;
        debug!(
            root = %root.display(),
            tables = state.tables.len(),
            "opened local store"
        );
        Ok(Self {
            shared: Arc::new(Shared::new(Some(root), journal_sync, state, last_ts)),
        })
    }

    /// Opens the store described by `config`.
    ///
    /// The coordinator list must name at least one host with a non-zero port;
    /// anything else cannot be reached.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        if config.coordinators.is_empty() {
            return Err(StoreError::Connectivity(
                "no coordinator hosts configured".to_string(),
            ));
        }
        if let Some(addr) = config
            .coordinators
            .iter()
            .find(|c| c.port_or(config.client_port) == 0)
        {
            return Err(StoreError::Connectivity(format!(
                "coordinator {addr} has no usable port"
            )));
        }
        debug!(endpoints = ?config.endpoints(), "connecting to store");
        Self::open(&config.data_dir, config.journal_sync)
    }

    /// Number of connections handed out and not yet dropped.
    pub fn open_connections(&self) -> usize {
        self.shared.open_connections.load(Ordering::Acquire)
    }

    /// Simulates the coordinator going away (`false`) or coming back.
    pub fn set_reachable(&self, reachable: bool) {
        self.shared.reachable.store(reachable, Ordering::Release);
    }

    /// Store directory, if persisted.
    pub fn root(&self) -> Option<&Path> {
        self.shared.root.as_deref()
    }
}

impl Connector for LocalStore {
    type Connection = LocalConnection;

    fn connect(&self) -> Result<LocalConnection, StoreError> {
        self.shared.check_reachable()?;
        self.shared.open_connections.fetch_add(1, Ordering::AcqRel);
        Ok(LocalConnection {
            shared: Arc::clone(&self.shared),
        })
    }
}

/// A connection to a [`LocalStore`]. Released on drop.
pub struct LocalConnection {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for LocalConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalConnection")
            .field("root", &self.shared.root)
            .finish()
    }
}

impl Drop for LocalConnection {
    fn drop(&mut self) {
        self.shared.open_connections.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Store for LocalConnection {
    fn list_tables(&self) -> Result<Vec<TableName>, StoreError> {
        self.shared.check_reachable()?;
        self.shared.list_tables()
    }

    fn create_namespace(&self, name: &str) -> Result<(), StoreError> {
        self.shared.check_reachable()?;
        self.shared.create_namespace(name)
    }

    fn create_table(
        &self,
        descriptor: &TableDescriptor,
        splits: Option<&[Vec<u8>]>,
    ) -> Result<(), StoreError> {
        self.shared.check_reachable()?;
        self.shared.create_table(descriptor, splits)
    }

    fn table_exists(&self, table: &TableName) -> Result<bool, StoreError> {
        self.shared.check_reachable()?;
        Ok(self.shared.read().tables.contains_key(table))
    }

    fn disable_table(&self, table: &TableName) -> Result<(), StoreError> {
        self.shared.check_reachable()?;
        self.shared.set_enabled(table, false)
    }

    fn enable_table(&self, table: &TableName) -> Result<(), StoreError> {
        self.shared.check_reachable()?;
        self.shared.set_enabled(table, true)
    }

    fn delete_table(&self, table: &TableName) -> Result<(), StoreError> {
        self.shared.check_reachable()?;
        self.shared.delete_table(table)
    }

    fn table_schema(&self, table: &TableName) -> Result<TableDescriptor, StoreError> {
        self.shared.check_reachable()?;
        Ok(self.shared.read().table(table)?.descriptor.clone())
    }

    fn modify_table(&self, descriptor: &TableDescriptor) -> Result<(), StoreError> {
        self.shared.check_reachable()?;
        self.shared.modify_table(descriptor)
    }

    fn flush(&self, table: &TableName) -> Result<(), StoreError> {
        self.shared.check_reachable()?;
        self.shared.flush(table)
    }

    fn major_compact(&self, table: &TableName) -> Result<(), StoreError> {
        self.shared.check_reachable()?;
        self.shared.major_compact(table)
    }

    fn regions(&self, table: &TableName) -> Result<Vec<RegionInfo>, StoreError> {
        self.shared.check_reachable()?;
        Ok(self.shared.read().table(table)?.region_infos())
    }

    fn put(&self, table: &TableName, put: &Put) -> Result<(), StoreError> {
        self.shared.check_reachable()?;
        self.shared.put(table, put)
    }

    fn get(&self, table: &TableName, key: &[u8]) -> Result<Option<Row>, StoreError> {
        self.shared.check_reachable()?;
        self.shared.get(table, key)
    }

    fn scan(&self, table: &TableName, scan: &Scan) -> Result<RowStream, StoreError> {
        self.shared.check_reachable()?;
        read::scanner(Arc::clone(&self.shared), table, scan)
    }

    fn delete(&self, table: &TableName, delete: &Delete) -> Result<(), StoreError> {
        self.shared.check_reachable()?;
        self.shared.delete(table, delete)
    }
}

//! # Store - Column-Family Store Client Interface
//!
//! The operations Saltbridge needs from a sorted, column-family-oriented
//! store, expressed as the [`Store`] trait, plus [`LocalStore`]: a
//! region-partitioned, journal-backed implementation that runs in-process.
//!
//! ## Architecture
//!
//! ```text
//! caller (salting / pipeline / cli)
//!   |
//!   v
//! Connector::connect() ──> Connection: Store
//!                              |
//! ┌────────────────────────────┼──────────────────────────┐
//! │ LocalStore                 v                          │
//! │                                                       │
//! │ admin.rs    namespaces, tables, schema, splits        │
//! │ write.rs    put / delete → journal append → region    │
//! │ read.rs     get / scan (batched, lazily resumed)      │
//! │ compaction  flush, major_compact (journal rewrite)    │
//! │ recovery    CATALOG load + journal replay on open     │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module      | Purpose                                              |
//! |------------|------------------------------------------------------|
//! | [`error`]  | `StoreError` and its coarse `ErrorKind`              |
//! | [`table`]  | `TableName`, `TableDescriptor`, `FamilyDescriptor`   |
//! | [`scan`]   | `Scan`, `RowFilter`, `RowStream`                      |
//! | [`region`] | split validation, region lookup, `RegionInfo`        |
//! | `catalog`  | persistent namespace/table metadata (atomic rewrite) |
//! | `local`    | `LocalStore` and `LocalConnection`                   |
//!
//! ## Timestamps
//!
//! Cells written without an explicit timestamp receive one from the store's
//! clock: wall-clock milliseconds, bumped so every assigned timestamp is
//! strictly greater than the previous one. Explicit timestamps are stored
//! as given, so replaying the same put is an idempotent overwrite.

pub mod error;
pub mod region;
pub mod scan;
pub mod table;

mod catalog;
mod local;

use cells::{Delete, Put, Row};

pub use error::{ErrorKind, StoreError};
pub use local::{LocalConnection, LocalStore};
pub use region::{locate, validate_splits, RegionInfo};
pub use scan::{key_in_range, RowFilter, RowStream, Scan, DEFAULT_SCAN_BATCH};
pub use table::{
    validate_namespace, FamilyDescriptor, TableDescriptor, TableName, DEFAULT_MAX_VERSIONS,
    DEFAULT_NAMESPACE,
};

/// Operations a store connection supports.
///
/// Administrative calls are thin and stateless from the caller's point of
/// view; row calls address physical row keys directly. Every method may fail
/// with [`ErrorKind::Connectivity`] when the backing cluster is unreachable.
pub trait Store: Send + Sync {
    // -------------------- Administration --------------------

    /// Every table, in name order.
    fn list_tables(&self) -> Result<Vec<TableName>, StoreError>;

    fn create_namespace(&self, name: &str) -> Result<(), StoreError>;

    /// Creates a table, optionally pre-split at `splits` (strictly increasing).
    fn create_table(
        &self,
        descriptor: &TableDescriptor,
        splits: Option<&[Vec<u8>]>,
    ) -> Result<(), StoreError>;

    fn table_exists(&self, table: &TableName) -> Result<bool, StoreError>;

    fn disable_table(&self, table: &TableName) -> Result<(), StoreError>;

    fn enable_table(&self, table: &TableName) -> Result<(), StoreError>;

    /// Drops a table. The table must be disabled first.
    fn delete_table(&self, table: &TableName) -> Result<(), StoreError>;

    fn table_schema(&self, table: &TableName) -> Result<TableDescriptor, StoreError>;

    /// Replaces a table's family list. Data in dropped families is purged;
    /// lowering `max_versions` takes effect on reads immediately.
    fn modify_table(&self, descriptor: &TableDescriptor) -> Result<(), StoreError>;

    fn flush(&self, table: &TableName) -> Result<(), StoreError>;

    /// Physically discards versions beyond each family's `max_versions`.
    fn major_compact(&self, table: &TableName) -> Result<(), StoreError>;

    /// The table's regions in key order.
    fn regions(&self, table: &TableName) -> Result<Vec<RegionInfo>, StoreError>;

    // -------------------- Rows --------------------

    fn put(&self, table: &TableName, put: &Put) -> Result<(), StoreError>;

    /// Applies puts in order, stopping at the first failure.
    fn put_all(&self, table: &TableName, puts: &[Put]) -> Result<(), StoreError> {
        for put in puts {
            self.put(table, put)?;
        }
        Ok(())
    }

    /// Latest version of every cell of a row, or `None` if the row is absent.
    fn get(&self, table: &TableName, key: &[u8]) -> Result<Option<Row>, StoreError>;

    fn scan(&self, table: &TableName, scan: &Scan) -> Result<RowStream, StoreError>;

    fn delete(&self, table: &TableName, delete: &Delete) -> Result<(), StoreError>;
}

/// Hands out [`Store`] connections. Connections are meant to be short-lived
/// and scoped to one task.
pub trait Connector: Send + Sync {
    type Connection: Store;

    fn connect(&self) -> Result<Self::Connection, StoreError>;
}

#[cfg(test)]
mod tests;

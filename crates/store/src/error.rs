use std::io;

use journal::JournalError;
use thiserror::Error;

use crate::TableName;

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The coordinator or a region server could not be reached.
    Connectivity,
    /// A table, namespace, or column family is missing, or a table is in the
    /// wrong state for the operation.
    Schema,
    /// The request itself is malformed (bad names, bad splits, empty put).
    InvalidRequest,
    /// Persistence failed underneath the store.
    Storage,
}

/// Errors returned by [`Store`](crate::Store) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot reach store: {0}")]
    Connectivity(String),

    #[error("table not found: {0}")]
    TableNotFound(TableName),

    #[error("table already exists: {0}")]
    TableExists(TableName),

    #[error("table is disabled: {0}")]
    TableDisabled(TableName),

    #[error("table is not disabled: {0}")]
    TableNotDisabled(TableName),

    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("namespace already exists: {0}")]
    NamespaceExists(String),

    #[error("column family {family} does not exist in table {table}")]
    FamilyNotFound { table: TableName, family: String },

    #[error("invalid table name {name:?}: {reason}")]
    InvalidTableName { name: String, reason: &'static str },

    #[error("invalid table descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid split keys: {0}")]
    InvalidSplits(String),

    #[error("invalid mutation: {0}")]
    InvalidMutation(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Connectivity(_) => ErrorKind::Connectivity,
            StoreError::TableNotFound(_)
            | StoreError::TableExists(_)
            | StoreError::TableDisabled(_)
            | StoreError::TableNotDisabled(_)
            | StoreError::NamespaceNotFound(_)
            | StoreError::NamespaceExists(_)
            | StoreError::FamilyNotFound { .. } => ErrorKind::Schema,
            StoreError::InvalidTableName { .. }
            | StoreError::InvalidDescriptor(_)
            | StoreError::InvalidSplits(_)
            | StoreError::InvalidMutation(_) => ErrorKind::InvalidRequest,
            StoreError::Catalog(_) | StoreError::Journal(_) | StoreError::Io(_) => {
                ErrorKind::Storage
            }
        }
    }
}

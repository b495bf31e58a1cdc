//! # Cells - Saltbridge Data Model
//!
//! Strongly-typed representation of rows in a sorted, column-family-oriented
//! store.
//!
//! ```text
//! Row
//!  ├── key: Vec<u8>                       (physical row key)
//!  └── families: BTreeMap<FamilyName, …>  (fixed per table schema)
//!        └── BTreeMap<Qualifier, Versions> (free-form per write)
//!              └── [CellVersion { timestamp, value }]  newest first
//! ```
//!
//! Families are validated once when a [`FamilyName`] is built, so code that
//! filters or routes cells compares typed names instead of re-parsing strings
//! per cell.
//!
//! Mutations are expressed as [`Put`] (cells with optional explicit
//! timestamps) and [`Delete`] (a whole row, or selected families of a row).

mod bytes;
mod family;
mod mutation;
mod row;

use thiserror::Error;

pub use bytes::{decode_i32, decode_i64, encode_i32, encode_i64, to_string_binary};
pub use family::FamilyName;
pub use mutation::{Delete, Put, PutCell};
pub use row::{CellRef, CellVersion, Row, Versions};

/// Column name within a family. Schema-free, defined per write.
pub type Qualifier = Vec<u8>;

/// Cell timestamp in milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Errors raised while building or decoding cell data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CellError {
    /// A column family name failed validation.
    #[error("invalid column family {name:?}: {reason}")]
    InvalidFamily { name: String, reason: &'static str },

    /// A value did not have the width required by the requested decoding.
    #[error("value has {actual} bytes, expected {expected}")]
    ValueWidth { expected: usize, actual: usize },
}

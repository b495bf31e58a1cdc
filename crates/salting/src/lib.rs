//! # Salting - Salted Row Keys and Multi-Probe Range Queries
//!
//! Spreads writes for monotonically growing logical keys across a table's
//! regions by prefixing every row key with a bucket number, and puts logical
//! range queries back together by probing every bucket.
//!
//! ```text
//! logical key "13824411467_2020-04-22"
//!      |
//!      | crc32(salt source) % N  →  bucket 1
//!      v
//! physical key "001_13824411467_2020-04-22"
//!
//! table pre-split at "000|", "001|"   (N = 3)
//!   region 0: "000_…"   region 1: "001_…"   region 2: "002_…"
//!
//! logical range [A, Z]  →  ["000_A","000_Z\0")  ["001_A","001_Z\0")  ["002_A","002_Z\0")
//!                             \_______________ ScanMerger ________________/
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module      | Purpose                                                  |
//! |------------|----------------------------------------------------------|
//! | [`salter`] | `KeySalter`: bucket, prefix, physical key, prefix parsing |
//! | [`splits`] | `SplitBoundary`: pre-split keys aligned with the buckets  |
//! | [`planner`]| `RangeQueryPlanner`, `LogicalRange`, `SubScan`            |
//! | [`merger`] | `ScanMerger`: bucket-order concat or logical-order merge  |
//! | [`table`]  | `SaltedTable`: put / get / range query over a `Store`     |
//!
//! The bucket count of a live table must never change: every planner and
//! salter for a table has to be built with the count the table was created
//! with.

pub mod merger;
pub mod planner;
pub mod salter;
pub mod splits;
pub mod table;

use store::StoreError;
use thiserror::Error;

pub use merger::{Concat, LogicalMerge, ScanMerger};
pub use planner::{LogicalRange, RangeEnd, RangeQueryPlanner, SubScan};
pub use salter::{KeySalter, SALT_SEPARATOR};
pub use splits::{SplitBoundary, SPLIT_TERMINATOR};
pub use table::SaltedTable;

/// Errors raised while salting keys or querying salted tables.
#[derive(Debug, Error)]
pub enum SaltError {
    #[error("bucket count must be at least 1")]
    ZeroBuckets,

    #[error("bucket {bucket} out of range for {buckets} buckets")]
    BucketOutOfRange { bucket: u32, buckets: u32 },

    #[error("table {table} has {regions} regions but the salter uses {buckets} buckets")]
    RegionMismatch {
        table: String,
        regions: usize,
        buckets: u32,
    },

    #[error("region {region} of table {table} does not start at the boundary of bucket {region}")]
    SplitMismatch { table: String, region: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests;

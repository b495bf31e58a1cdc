//! # Pipeline - Batch Migration into a Column-Family Store
//!
//! A single-shape batch job: split the input, map every record, shuffle the
//! mapper output by key, reduce each key group into destination writes.
//!
//! ```text
//! InputFormat::splits ──> [split 0] [split 1] ... [split k]      (one per region
//!                            |         |             |           or line chunk)
//!                          map task  map task  ...  map task     Mapper<I>
//!                            \_________|_____________/
//!                                      v
//!                               ShuffleStage                     crc32(key) % R,
//!                            /         |        \                 sorted, grouped
//!                       reduce 0   reduce 1 ... reduce R-1       Reducer
//!                            \_________|________/
//!                                      v
//!                           destination table (puts)
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module         | Purpose                                                 |
//! |---------------|---------------------------------------------------------|
//! | [`allow_list`]| `ColumnAllowList`: which family/qualifier pairs migrate |
//! | [`task`]      | `Mapper` / `Reducer` capabilities, `Emitter`, contexts  |
//! | [`mapper`]    | `MigrationMapper`: column-filtered row copy             |
//! | [`tsv`]       | `TsvMapper`, `TsvLayout`: tab-separated file import     |
//! | [`reducer`]   | `MigrationReducer`: blind-write pass-through            |
//! | [`input`]     | `InputFormat`, `TableInput`, `TextInput`, `InputSplit`  |
//! | [`shuffle`]   | `ShuffleStage`: partition, sort, group                  |
//! | [`runner`]    | `LocalRunner`: parallel tasks, attempts, cancellation   |
//! | [`job`]       | `MigrationJob`, `Job`, `JobState`                       |
//! | [`driver`]    | `PipelineDriver`: validate, submit, wait, exit status   |
//!
//! ## Delivery
//!
//! Writes are at-least-once. A failed task attempt may have written some of
//! its puts before failing; the retry writes them again. Every migrated cell
//! carries an explicit timestamp, so a repeated put overwrites the same cell
//! version instead of adding a new one.

pub mod allow_list;
pub mod driver;
pub mod input;
pub mod job;
pub mod mapper;
pub mod reducer;
pub mod runner;
pub mod shuffle;
pub mod task;
pub mod tsv;

use std::io;

use salting::SaltError;
use store::{ErrorKind, StoreError};
use thiserror::Error;

pub use allow_list::{ColumnAllowList, Qualifiers};
pub use driver::PipelineDriver;
pub use input::{InputFormat, InputSplit, RecordStream, TableInput, TextInput};
pub use job::{Job, JobSource, JobState, MigrationJob};
pub use mapper::MigrationMapper;
pub use reducer::MigrationReducer;
pub use runner::{CancelHandle, JobReport, LocalRunner};
pub use shuffle::{KeyGroup, ShuffleStage};
pub use task::{Emitter, Mapper, ReduceContext, Reducer, RowError};
pub use tsv::{Line, TsvLayout, TsvMapper, DEFAULT_TSV_COLUMNS};

/// Errors raised while configuring or running a migration job.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The store could not be reached. Never retried by the runner.
    #[error("cannot reach store: {0}")]
    Connectivity(String),

    /// A table, namespace, or column family the job needs is missing.
    #[error("schema error: {0}")]
    Schema(String),

    /// One input row could not be parsed or filtered.
    #[error("task {task} failed on row {row}: {reason}")]
    RowProcessing {
        task: String,
        row: String,
        reason: String,
    },

    /// The job was rejected before any task ran.
    #[error("job rejected: {0}")]
    JobSubmission(String),

    #[error(transparent)]
    Store(StoreError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("task {task} failed after {attempts} attempts")]
    TaskFailed {
        task: String,
        attempts: u32,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("job cancelled")]
    Cancelled,
}

impl PipelineError {
    /// `true` if another attempt of the same task may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::RowProcessing { .. } | PipelineError::Store(_) | PipelineError::Io(_)
        )
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err.kind() {
            ErrorKind::Connectivity => PipelineError::Connectivity(err.to_string()),
            ErrorKind::Schema => PipelineError::Schema(err.to_string()),
            ErrorKind::InvalidRequest | ErrorKind::Storage => PipelineError::Store(err),
        }
    }
}

impl From<SaltError> for PipelineError {
    fn from(err: SaltError) -> Self {
        match err {
            SaltError::Store(e) => e.into(),
            err @ (SaltError::RegionMismatch { .. } | SaltError::SplitMismatch { .. }) => {
                PipelineError::Schema(err.to_string())
            }
            other => PipelineError::JobSubmission(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests;

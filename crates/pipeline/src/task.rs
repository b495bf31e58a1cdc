//! Capabilities the runner invokes: [`Mapper`] per input record and
//! [`Reducer`] per key group. Both are implemented by plain structs or by
//! closures with the matching signature.

use cells::Put;
use store::{Store, TableName};

use crate::PipelineError;

/// Why one input record could not be mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// Printable identification of the record (row key, line number).
    pub row: String,
    pub reason: String,
}

impl RowError {
    pub fn new(row: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            row: row.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn into_pipeline(self, task: &str) -> PipelineError {
        PipelineError::RowProcessing {
            task: task.to_string(),
            row: self.row,
            reason: self.reason,
        }
    }
}

/// Collects a map task's `(shuffle key, put)` output.
#[derive(Debug, Default)]
pub struct Emitter {
    records: Vec<(Vec<u8>, Put)>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, key: impl Into<Vec<u8>>, put: Put) {
        self.records.push((key.into(), put));
    }

    pub fn records(&self) -> &[(Vec<u8>, Put)] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<(Vec<u8>, Put)> {
        self.records
    }
}

/// Maps one input record to zero or more emitted puts.
pub trait Mapper<I>: Send + Sync {
    fn map(&self, record: I, out: &mut Emitter) -> Result<(), RowError>;
}

impl<I, F> Mapper<I> for F
where
    F: Fn(I, &mut Emitter) -> Result<(), RowError> + Send + Sync,
{
    fn map(&self, record: I, out: &mut Emitter) -> Result<(), RowError> {
        self(record, out)
    }
}

/// Handle a reducer writes through. Bound to one task's connection and the
/// job's destination table.
pub struct ReduceContext<'a> {
    store: &'a dyn Store,
    table: &'a TableName,
    written: u64,
}

impl<'a> ReduceContext<'a> {
    pub fn new(store: &'a dyn Store, table: &'a TableName) -> Self {
        Self {
            store,
            table,
            written: 0,
        }
    }

    pub fn table(&self) -> &TableName {
        self.table
    }

    pub fn write(&mut self, put: &Put) -> Result<(), PipelineError> {
        self.store.put(self.table, put)?;
        self.written += 1;
        Ok(())
    }

    /// Puts written through this context so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

/// Turns every record of one key group into destination writes.
pub trait Reducer: Send + Sync {
    fn reduce(
        &self,
        key: &[u8],
        records: &[Put],
        ctx: &mut ReduceContext<'_>,
    ) -> Result<(), PipelineError>;
}

impl<F> Reducer for F
where
    F: Fn(&[u8], &[Put], &mut ReduceContext<'_>) -> Result<(), PipelineError> + Send + Sync,
{
    fn reduce(
        &self,
        key: &[u8],
        records: &[Put],
        ctx: &mut ReduceContext<'_>,
    ) -> Result<(), PipelineError> {
        self(key, records, ctx)
    }
}

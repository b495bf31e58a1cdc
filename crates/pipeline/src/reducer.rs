use cells::Put;
use tracing::trace;

use crate::{PipelineError, ReduceContext, Reducer};

/// Writes every record of a group to the destination, in arrival order.
///
/// No read-before-write: the destination keeps whichever version the store
/// orders last.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationReducer;

impl Reducer for MigrationReducer {
    fn reduce(
        &self,
        key: &[u8],
        records: &[Put],
        ctx: &mut ReduceContext<'_>,
    ) -> Result<(), PipelineError> {
        trace!(
            key = %String::from_utf8_lossy(key),
            records = records.len(),
            "reducing group"
        );
        for put in records {
            ctx.write(put)?;
        }
        Ok(())
    }
}

use cells::{Put, Row};
use tracing::trace;

use crate::{ColumnAllowList, Emitter, Mapper, RowError};

/// Copies the allowed cells of a source row, keyed by the source row key.
///
/// Cell timestamps are carried over unchanged. A row with no allowed cell
/// emits nothing.
#[derive(Debug, Clone)]
pub struct MigrationMapper {
    columns: ColumnAllowList,
}

impl MigrationMapper {
    pub fn new(columns: ColumnAllowList) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &ColumnAllowList {
        &self.columns
    }
}

impl Mapper<Row> for MigrationMapper {
    fn map(&self, row: Row, out: &mut Emitter) -> Result<(), RowError> {
        if row.key().is_empty() {
            return Err(RowError::new("<empty>", "row key is empty"));
        }

        let mut put = Put::new(row.key());
        for cell in row.cells() {
            if self.columns.allows(cell.family, cell.qualifier) {
                put.add_cell(cell);
            }
        }

        if put.is_empty() {
            trace!(row = %String::from_utf8_lossy(row.key()), "no allowed cells");
            return Ok(());
        }
        out.emit(row.key(), put);
        Ok(())
    }
}

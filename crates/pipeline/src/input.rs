//! Where map tasks read from.
//!
//! An [`InputFormat`] cuts its source into [`InputSplit`]s, one per map task,
//! and reads the records of a split. Splits are disjoint and together cover
//! the whole source.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use cells::{FamilyName, Row};
use store::{RowFilter, Scan, Store, TableName};
use tracing::debug;

use crate::{Line, PipelineError};

/// Records of one split, in source order.
pub type RecordStream<'a, T> = Box<dyn Iterator<Item = Result<T, PipelineError>> + 'a>;

/// The unit of work of one map task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSplit {
    /// One region of a source table: `[start, end)`.
    Region {
        index: usize,
        start: Vec<u8>,
        end: Vec<u8>,
    },
    /// `lines` lines of a text file starting at byte `offset`.
    Lines {
        index: usize,
        offset: u64,
        first_line: u64,
        lines: usize,
    },
}

impl InputSplit {
    pub fn index(&self) -> usize {
        match self {
            InputSplit::Region { index, .. } | InputSplit::Lines { index, .. } => *index,
        }
    }
}

pub trait InputFormat: Send + Sync {
    type Record;

    fn splits(&self, store: &dyn Store) -> Result<Vec<InputSplit>, PipelineError>;

    fn read<'a>(
        &'a self,
        store: &'a dyn Store,
        split: &InputSplit,
    ) -> Result<RecordStream<'a, Self::Record>, PipelineError>;
}

// -------------------- TableInput --------------------

/// Every row of a table, one split per region.
#[derive(Debug, Clone)]
pub struct TableInput {
    table: TableName,
    families: Vec<FamilyName>,
    filter: Option<RowFilter>,
}

impl TableInput {
    pub fn new(table: TableName) -> Self {
        Self {
            table,
            families: Vec::new(),
            filter: None,
        }
    }

    /// Restricts the scan to `families`. Empty means every family.
    #[must_use]
    pub fn with_families<I>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = FamilyName>,
    {
        self.families = families.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }
}

impl InputFormat for TableInput {
    type Record = Row;

    fn splits(&self, store: &dyn Store) -> Result<Vec<InputSplit>, PipelineError> {
        let splits: Vec<InputSplit> = store
            .regions(&self.table)?
            .into_iter()
            .map(|region| InputSplit::Region {
                index: region.index,
                start: region.start,
                end: region.end,
            })
            .collect();
        debug!(table = %self.table, splits = splits.len(), "planned table splits");
        Ok(splits)
    }

    fn read<'a>(
        &'a self,
        store: &'a dyn Store,
        split: &InputSplit,
    ) -> Result<RecordStream<'a, Row>, PipelineError> {
        let InputSplit::Region { start, end, .. } = split else {
            return Err(PipelineError::JobSubmission(format!(
                "table input cannot read split {split:?}"
            )));
        };
        let mut scan = Scan::range(start.clone(), end.clone());
        for family in &self.families {
            scan = scan.with_family(family.clone());
        }
        if let Some(filter) = &self.filter {
            scan = scan.with_filter(filter.clone());
        }
        let rows = store.scan(&self.table, &scan)?;
        Ok(Box::new(rows.map(|row| row.map_err(PipelineError::from))))
    }
}

// -------------------- TextInput --------------------

/// Lines of a text file, `split_lines` per split.
#[derive(Debug, Clone)]
pub struct TextInput {
    path: PathBuf,
    split_lines: usize,
}

impl TextInput {
    pub fn new(path: impl Into<PathBuf>, split_lines: usize) -> Self {
        Self {
            path: path.into(),
            split_lines: split_lines.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InputFormat for TextInput {
    type Record = Line;

    fn splits(&self, _store: &dyn Store) -> Result<Vec<InputSplit>, PipelineError> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut splits = Vec::new();
        let mut buf = Vec::new();
        let mut offset = 0u64;
        let mut line_no = 0u64;

        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            if line_no % self.split_lines as u64 == 0 {
                splits.push(InputSplit::Lines {
                    index: splits.len(),
                    offset,
                    first_line: line_no + 1,
                    lines: 0,
                });
            }
            if let Some(InputSplit::Lines { lines, .. }) = splits.last_mut() {
                *lines += 1;
            }
            offset += n as u64;
            line_no += 1;
        }

        debug!(
            path = %self.path.display(),
            lines = line_no,
            splits = splits.len(),
            "planned file splits"
        );
        Ok(splits)
    }

    fn read<'a>(
        &'a self,
        _store: &'a dyn Store,
        split: &InputSplit,
    ) -> Result<RecordStream<'a, Line>, PipelineError> {
        let InputSplit::Lines {
            offset,
            first_line,
            lines,
            ..
        } = *split
        else {
            return Err(PipelineError::JobSubmission(format!(
                "text input cannot read split {split:?}"
            )));
        };
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut reader = BufReader::new(file);
        let mut number = first_line;
        let end = first_line + lines as u64;
        let records = std::iter::from_fn(move || -> Option<Result<Line, PipelineError>> {
            if number >= end {
                return None;
            }
            let mut bytes = Vec::new();
            match reader.read_until(b'\n', &mut bytes) {
                Ok(0) => None,
                Ok(_) => {
                    if bytes.last() == Some(&b'\n') {
                        bytes.pop();
                        if bytes.last() == Some(&b'\r') {
                            bytes.pop();
                        }
                    }
                    let line = Line::new(number, bytes);
                    number += 1;
                    Some(Ok(line))
                }
                Err(e) => {
                    number = end;
                    Some(Err(e.into()))
                }
            }
        });
        Ok(Box::new(records))
    }
}

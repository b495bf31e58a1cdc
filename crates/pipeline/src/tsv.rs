use cells::{FamilyName, Put, Qualifier, Timestamp};
use salting::KeySalter;
use store::RowFilter;

use crate::{Emitter, Mapper, PipelineError, RowError};

/// Columns filled from the fields after the row key, in order, when no
/// layout is given.
pub const DEFAULT_TSV_COLUMNS: &[&str] = &["base_info:name", "base_info:sex"];

/// One line of a text input, numbered from 1, without its line ending.
/// Bytes are decoded by the mapper so a bad encoding fails that line only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: u64,
    pub bytes: Vec<u8>,
}

impl Line {
    pub fn new(number: u64, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            number,
            bytes: bytes.into(),
        }
    }
}

/// Destination column for each field after the row key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvLayout {
    columns: Vec<(FamilyName, Qualifier)>,
}

impl TsvLayout {
    pub fn new(columns: Vec<(FamilyName, Qualifier)>) -> Result<Self, PipelineError> {
        if columns.is_empty() {
            return Err(PipelineError::JobSubmission(
                "tsv layout has no columns".to_string(),
            ));
        }
        Ok(Self { columns })
    }

    /// Parses `family:qualifier` specs, one per field.
    pub fn parse<I, S>(specs: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = specs
            .into_iter()
            .map(|spec| {
                let spec = spec.as_ref();
                let (family, qualifier) = spec.split_once(':').ok_or_else(|| {
                    PipelineError::JobSubmission(format!(
                        "tsv column {spec:?} must be family:qualifier"
                    ))
                })?;
                let family = FamilyName::new(family).map_err(|e| {
                    PipelineError::JobSubmission(format!("bad tsv column {spec:?}: {e}"))
                })?;
                Ok((family, qualifier.as_bytes().to_vec()))
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;
        Self::new(columns)
    }

    /// `base_info:name`, `base_info:sex`.
    pub fn default_columns() -> Result<Self, PipelineError> {
        Self::parse(DEFAULT_TSV_COLUMNS)
    }

    pub fn columns(&self) -> &[(FamilyName, Qualifier)] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Maps `rowkey \t field1 \t field2 ...` lines to puts.
///
/// Every cell is stamped with the job timestamp, so re-running a task writes
/// the same cell versions. Blank lines are skipped; fields beyond the layout
/// are ignored.
#[derive(Debug, Clone)]
pub struct TsvMapper {
    layout: TsvLayout,
    timestamp: Timestamp,
    salter: Option<KeySalter>,
    filter: Option<RowFilter>,
}

impl TsvMapper {
    pub fn new(layout: TsvLayout, timestamp: Timestamp) -> Self {
        Self {
            layout,
            timestamp,
            salter: None,
            filter: None,
        }
    }

    /// Writes rows under their salted key instead of the raw first field.
    #[must_use]
    pub fn with_salter(mut self, salter: KeySalter) -> Self {
        self.salter = Some(salter);
        self
    }

    /// Keeps only lines whose (unsalted) row key passes `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn layout(&self) -> &TsvLayout {
        &self.layout
    }
}

impl Mapper<Line> for TsvMapper {
    fn map(&self, line: Line, out: &mut Emitter) -> Result<(), RowError> {
        let text = std::str::from_utf8(&line.bytes)
            .map_err(|_| RowError::new(format!("line {}", line.number), "not valid UTF-8"))?
            .trim_end_matches(&['\r', '\n'][..]);
        if text.trim().is_empty() {
            return Ok(());
        }

        let fields: Vec<&str> = text.split('\t').collect();
        let key = fields[0];
        if key.is_empty() {
            return Err(RowError::new(
                format!("line {}", line.number),
                "row key is empty",
            ));
        }
        if fields.len() < self.layout.len() + 1 {
            return Err(RowError::new(
                format!("line {}", line.number),
                format!(
                    "expected {} fields, found {}",
                    self.layout.len() + 1,
                    fields.len()
                ),
            ));
        }
        if let Some(filter) = &self.filter {
            if !filter.matches(key.as_bytes()) {
                return Ok(());
            }
        }

        let row_key = match &self.salter {
            Some(salter) => salter.physical_key(key.as_bytes()),
            None => key.as_bytes().to_vec(),
        };
        let mut put = Put::new(row_key.clone());
        for ((family, qualifier), value) in self.layout.columns.iter().zip(&fields[1..]) {
            put.add_column_at(
                family.clone(),
                qualifier.clone(),
                self.timestamp,
                value.as_bytes(),
            );
        }
        out.emit(row_key, put);
        Ok(())
    }
}

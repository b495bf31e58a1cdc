//! Combines the per-bucket sub-scan streams of a salted range query.
//!
//! Each sub-scan is ordered by physical key within its bucket; buckets are
//! independent. [`ScanMerger::concat`] yields bucket 0 in full, then bucket
//! 1, and so on. [`ScanMerger::logical`] instead orders the combined output
//! by logical key (the physical key without its bucket prefix).
//!
//! Both are lazy, finite, and not restartable: to read again, re-issue the
//! sub-scans.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use cells::Row;
use store::{RowStream, StoreError};

use crate::KeySalter;

pub struct ScanMerger;

impl ScanMerger {
    /// Bucket-order concatenation. `sources` is pulled one stream at a time,
    /// so a lazily opening source only opens a sub-scan once the previous
    /// one is drained.
    pub fn concat<I>(sources: I) -> Concat<I::IntoIter>
    where
        I: IntoIterator<Item = Result<RowStream, StoreError>>,
    {
        Concat {
            sources: sources.into_iter(),
            current: None,
        }
    }

    /// Logical-key order merge of already opened sub-scans.
    pub fn logical(salter: KeySalter, streams: Vec<RowStream>) -> LogicalMerge {
        LogicalMerge::new(salter, streams)
    }
}

/// See [`ScanMerger::concat`].
pub struct Concat<I> {
    sources: I,
    current: Option<RowStream>,
}

impl<I> Iterator for Concat<I>
where
    I: Iterator<Item = Result<RowStream, StoreError>>,
{
    type Item = Result<Row, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(current) = self.current.as_mut() {
                match current.next() {
                    Some(item) => return Some(item),
                    None => self.current = None,
                }
            }
            match self.sources.next()? {
                Ok(stream) => self.current = Some(stream),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// The head row of one sub-scan, ordered so the heap pops the smallest
/// logical key first.
struct HeapEntry {
    logical: Vec<u8>,
    /// Index into `streams`.
    source: usize,
    row: Row,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.logical == other.logical && self.source == other.source
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // max-heap: reverse so the smallest logical key wins; ties go to the
        // lower bucket
        other
            .logical
            .cmp(&self.logical)
            .then_with(|| other.source.cmp(&self.source))
    }
}

/// See [`ScanMerger::logical`].
pub struct LogicalMerge {
    salter: KeySalter,
    streams: Vec<RowStream>,
    heap: BinaryHeap<HeapEntry>,
    primed: bool,
    /// Error from a sub-scan, reported before anything else.
    failed: Option<StoreError>,
}

impl LogicalMerge {
    fn new(salter: KeySalter, streams: Vec<RowStream>) -> Self {
        Self {
            salter,
            streams,
            heap: BinaryHeap::new(),
            primed: false,
            failed: None,
        }
    }

    /// Pulls the next row of `source` into the heap.
    fn advance(&mut self, source: usize) {
        match self.streams[source].next() {
            Some(Ok(row)) => {
                let logical = self
                    .salter
                    .logical_key(row.key())
                    .unwrap_or_else(|| row.key())
                    .to_vec();
                self.heap.push(HeapEntry {
                    logical,
                    source,
                    row,
                });
            }
            Some(Err(e)) => {
                if self.failed.is_none() {
                    self.failed = Some(e);
                }
            }
            None => {}
        }
    }
}

impl Iterator for LogicalMerge {
    type Item = Result<Row, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.primed {
            self.primed = true;
            for source in 0..self.streams.len() {
                self.advance(source);
            }
        }
        if let Some(e) = self.failed.take() {
            self.heap.clear();
            self.streams.clear();
            return Some(Err(e));
        }

        let top = self.heap.pop()?;
        self.advance(top.source);
        Some(Ok(top.row))
    }
}

use cells::{Put, Row};
use store::{Store, StoreError, TableDescriptor, TableName};
use tracing::info;

use crate::{
    KeySalter, LogicalRange, RangeQueryPlanner, SaltError, ScanMerger, SplitBoundary, SubScan,
};

/// A table whose row keys are salted, addressed by logical key.
///
/// Wraps a store connection together with the table's [`KeySalter`], so
/// writers never build physical keys by hand and readers always probe every
/// bucket.
pub struct SaltedTable<'a, S: Store> {
    store: &'a S,
    table: TableName,
    salter: KeySalter,
}

impl<'a, S: Store> SaltedTable<'a, S> {
    pub fn new(store: &'a S, table: TableName, salter: KeySalter) -> Self {
        Self {
            store,
            table,
            salter,
        }
    }

    /// Creates the table pre-split so region `i` holds bucket `i`.
    pub fn create(
        store: &'a S,
        descriptor: &TableDescriptor,
        salter: KeySalter,
    ) -> Result<Self, SaltError> {
        let splits = SplitBoundary::for_salter(&salter);
        store.create_table(descriptor, Some(splits.keys()))?;
        info!(
            table = %descriptor.name,
            buckets = salter.buckets(),
            "created salted table"
        );
        Ok(Self::new(store, descriptor.name.clone(), salter))
    }

    /// Checks that the table's regions are exactly the salter's buckets:
    /// same count, and region `i` starting at the split key of bucket `i`.
    pub fn verify_layout(&self) -> Result<(), SaltError> {
        let regions = self.store.regions(&self.table)?;
        if regions.len() != self.salter.buckets() as usize {
            return Err(SaltError::RegionMismatch {
                table: self.table.to_string(),
                regions: regions.len(),
                buckets: self.salter.buckets(),
            });
        }
        let splits = SplitBoundary::for_salter(&self.salter);
        for (region, split) in regions.iter().skip(1).zip(splits.keys()) {
            if region.start != *split {
                return Err(SaltError::SplitMismatch {
                    table: self.table.to_string(),
                    region: region.index,
                });
            }
        }
        Ok(())
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn salter(&self) -> &KeySalter {
        &self.salter
    }

    /// Writes `put`, whose row is a logical key, under its salted key.
    pub fn put(&self, put: &Put) -> Result<Vec<u8>, SaltError> {
        self.put_with_source(put.row(), put)
    }

    /// Like [`SaltedTable::put`], salting by `source` instead of the row key.
    pub fn put_with_source(&self, source: &[u8], put: &Put) -> Result<Vec<u8>, SaltError> {
        let physical = self.salter.physical_key_with_source(source, put.row());
        let mut salted = Put::new(physical.clone());
        for cell in put.cells() {
            match cell.timestamp {
                Some(ts) => salted.add_column_at(
                    cell.family.clone(),
                    cell.qualifier.clone(),
                    ts,
                    cell.value.clone(),
                ),
                None => salted.add_column(
                    cell.family.clone(),
                    cell.qualifier.clone(),
                    cell.value.clone(),
                ),
            };
        }
        self.store.put(&self.table, &salted)?;
        Ok(physical)
    }

    pub fn get(&self, logical: &[u8]) -> Result<Option<Row>, SaltError> {
        self.get_with_source(logical, logical)
    }

    pub fn get_with_source(&self, source: &[u8], logical: &[u8]) -> Result<Option<Row>, SaltError> {
        let physical = self.salter.physical_key_with_source(source, logical);
        Ok(self.store.get(&self.table, &physical)?)
    }

    pub fn plan(&self, range: &LogicalRange) -> Vec<SubScan> {
        RangeQueryPlanner::new(self.salter).plan(range)
    }

    /// Every row whose logical key is in `range`.
    ///
    /// With `ordered == false` rows come bucket by bucket, each sub-scan
    /// opened only when the previous one is drained. With `ordered == true`
    /// all sub-scans are opened up front and merged by logical key.
    pub fn range_query(
        &self,
        range: &LogicalRange,
        ordered: bool,
    ) -> Result<Box<dyn Iterator<Item = Result<Row, StoreError>> + 'a>, SaltError> {
        let plan = self.plan(range);
        if ordered {
            let streams = plan
                .iter()
                .map(|sub| self.store.scan(&self.table, &sub.to_scan()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Box::new(ScanMerger::logical(self.salter, streams)))
        } else {
            let store = self.store;
            let table = self.table.clone();
            Ok(Box::new(ScanMerger::concat(
                plan.into_iter()
                    .map(move |sub| store.scan(&table, &sub.to_scan())),
            )))
        }
    }

    /// Rows of one bucket whose logical key is in `range`.
    pub fn range_query_bucket(
        &self,
        bucket: u32,
        range: &LogicalRange,
    ) -> Result<store::RowStream, SaltError> {
        let sub = RangeQueryPlanner::new(self.salter).plan_bucket(bucket, range)?;
        Ok(self.store.scan(&self.table, &sub.to_scan())?)
    }
}

use store::{key_in_range, Scan};
use tracing::debug;

use crate::{KeySalter, SaltError, SALT_SEPARATOR};

/// Upper end of a [`LogicalRange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeEnd {
    Inclusive(Vec<u8>),
    Exclusive(Vec<u8>),
    Unbounded,
}

/// A range of logical keys. The start is always inclusive; an empty start
/// is unbounded below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalRange {
    pub start: Vec<u8>,
    pub end: RangeEnd,
}

impl LogicalRange {
    /// `[start, end]`
    pub fn inclusive(start: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Self {
        Self {
            start: start.into(),
            end: RangeEnd::Inclusive(end.into()),
        }
    }

    /// `[start, end)`
    pub fn exclusive(start: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Self {
        Self {
            start: start.into(),
            end: RangeEnd::Exclusive(end.into()),
        }
    }

    /// `[start, ..)`
    pub fn from(start: impl Into<Vec<u8>>) -> Self {
        Self {
            start: start.into(),
            end: RangeEnd::Unbounded,
        }
    }

    /// Every logical key.
    pub fn all() -> Self {
        Self::from(Vec::new())
    }

    pub fn contains(&self, logical: &[u8]) -> bool {
        if logical < self.start.as_slice() {
            return false;
        }
        match &self.end {
            RangeEnd::Inclusive(end) => logical <= end.as_slice(),
            RangeEnd::Exclusive(end) => logical < end.as_slice(),
            RangeEnd::Unbounded => true,
        }
    }
}

/// One store-level scan of a single bucket: `[start, stop)` over physical
/// keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubScan {
    pub bucket: u32,
    pub start: Vec<u8>,
    pub stop: Vec<u8>,
}

impl SubScan {
    pub fn contains(&self, physical: &[u8]) -> bool {
        key_in_range(physical, &self.start, &self.stop)
    }

    /// A store [`Scan`] over this sub-range; callers may add families,
    /// versions, or filters.
    pub fn to_scan(&self) -> Scan {
        Scan::range(self.start.clone(), self.stop.clone())
    }
}

/// Turns a logical range into one sub-scan per bucket.
///
/// A logical range can hold keys salted into any bucket, so the complete
/// plan probes all `N` of them: `(prefix(i) ++ start, prefix(i) ++ end)`.
/// When the caller knows the bucket, [`RangeQueryPlanner::plan_bucket`]
/// probes just that one.
#[derive(Debug, Clone, Copy)]
pub struct RangeQueryPlanner {
    salter: KeySalter,
}

impl RangeQueryPlanner {
    pub fn new(salter: KeySalter) -> Self {
        Self { salter }
    }

    pub fn salter(&self) -> &KeySalter {
        &self.salter
    }

    /// `N` sub-scans in bucket order `0..N`.
    pub fn plan(&self, range: &LogicalRange) -> Vec<SubScan> {
        let plan: Vec<SubScan> = (0..self.salter.buckets())
            .map(|bucket| self.sub_scan(bucket, range))
            .collect();
        debug!(
            buckets = self.salter.buckets(),
            start = %String::from_utf8_lossy(&range.start),
            "planned salted range query"
        );
        plan
    }

    /// The single sub-scan of a known bucket.
    pub fn plan_bucket(&self, bucket: u32, range: &LogicalRange) -> Result<SubScan, SaltError> {
        self.salter.check_bucket(bucket)?;
        Ok(self.sub_scan(bucket, range))
    }

    /// The single sub-scan of the bucket `source` salts to.
    pub fn plan_for_source(&self, source: &[u8], range: &LogicalRange) -> SubScan {
        self.sub_scan(self.salter.bucket(source), range)
    }

    fn sub_scan(&self, bucket: u32, range: &LogicalRange) -> SubScan {
        let head = self.salter.bucket_head(bucket);

        let mut start = head.clone();
        start.extend_from_slice(&range.start);

        let stop = match &range.end {
            RangeEnd::Inclusive(end) => {
                let mut stop = head;
                stop.extend_from_slice(end);
                // smallest key greater than `end`
                stop.push(0);
                stop
            }
            RangeEnd::Exclusive(end) => {
                let mut stop = head;
                stop.extend_from_slice(end);
                stop
            }
            RangeEnd::Unbounded => {
                let mut stop = head;
                stop.pop();
                stop.push(SALT_SEPARATOR + 1);
                stop
            }
        };

        SubScan { bucket, start, stop }
    }
}

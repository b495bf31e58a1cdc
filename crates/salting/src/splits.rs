use store::locate;

use crate::KeySalter;

/// Byte closing every split key. Sorts after [`SALT_SEPARATOR`](crate::SALT_SEPARATOR),
/// so `"00i|"` is greater than every key in bucket `i` and smaller than every
/// key in bucket `i + 1`.
pub const SPLIT_TERMINATOR: u8 = b'|';

/// Pre-split keys handed to the store when a salted table is created.
///
/// For `N` buckets there are `N - 1` keys, `prefix(i) ++ '|'` for
/// `i in 0..N-1`, strictly increasing. The table then has exactly `N`
/// regions and region `i` holds exactly bucket `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitBoundary {
    keys: Vec<Vec<u8>>,
}

impl SplitBoundary {
    pub fn for_salter(salter: &KeySalter) -> Self {
        let keys = (0..salter.buckets().saturating_sub(1))
            .map(|bucket| {
                let mut key = salter.bucket_head(bucket);
                key.pop();
                key.push(SPLIT_TERMINATOR);
                key
            })
            .collect();
        Self { keys }
    }

    pub fn keys(&self) -> &[Vec<u8>] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of partitions these boundaries create.
    pub fn partitions(&self) -> usize {
        self.keys.len() + 1
    }

    /// Partition a physical key falls in.
    pub fn partition_for(&self, physical: &[u8]) -> usize {
        locate(&self.keys, physical)
    }
}

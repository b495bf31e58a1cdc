use crc32fast::Hasher as Crc32;

use crate::SaltError;

/// Byte between the bucket prefix and the logical key.
pub const SALT_SEPARATOR: u8 = b'_';

/// Maps logical keys to one of `N` buckets and builds physical row keys.
///
/// The bucket is `crc32(salt source) % N`, an unsigned value, so every prefix
/// lies in `[0, N)`. Prefixes are zero-padded decimal of a fixed width: the
/// number of digits in `N - 1`, or the configured minimum width if larger.
///
/// ```
/// use salting::KeySalter;
///
/// let salter = KeySalter::new(3).unwrap().with_min_width(3);
/// let key = salter.physical_key(b"13824411467_2020-04-22");
/// assert!(key.starts_with(b"00"));
/// assert_eq!(key[3], b'_');
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySalter {
    buckets: u32,
    width: usize,
}

fn digits(mut n: u32) -> usize {
    let mut d = 1;
    while n >= 10 {
        n /= 10;
        d += 1;
    }
    d
}

impl KeySalter {
    pub fn new(buckets: u32) -> Result<Self, SaltError> {
        if buckets == 0 {
            return Err(SaltError::ZeroBuckets);
        }
        Ok(Self {
            buckets,
            width: digits(buckets - 1),
        })
    }

    /// Pads prefixes to at least `width` digits (`3` gives `000`, `001`, ...).
    #[must_use]
    pub fn with_min_width(mut self, width: usize) -> Self {
        self.width = self.width.max(width);
        self
    }

    pub fn buckets(&self) -> u32 {
        self.buckets
    }

    /// Prefix width in bytes, not counting the separator.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Bucket for a salt source.
    pub fn bucket(&self, source: &[u8]) -> u32 {
        let mut hasher = Crc32::new();
        hasher.update(source);
        hasher.finalize() % self.buckets
    }

    /// The prefix `logical` salts to.
    pub fn salt(&self, logical: &[u8]) -> String {
        self.format_prefix(self.bucket(logical))
    }

    /// Zero-padded prefix of a bucket.
    pub fn prefix(&self, bucket: u32) -> Result<String, SaltError> {
        self.check_bucket(bucket)?;
        Ok(self.format_prefix(bucket))
    }

    fn format_prefix(&self, bucket: u32) -> String {
        format!("{:0width$}", bucket, width = self.width)
    }

    pub(crate) fn check_bucket(&self, bucket: u32) -> Result<(), SaltError> {
        if bucket < self.buckets {
            Ok(())
        } else {
            Err(SaltError::BucketOutOfRange {
                bucket,
                buckets: self.buckets,
            })
        }
    }

    /// `prefix ++ '_'` for a bucket known to be in range.
    pub(crate) fn bucket_head(&self, bucket: u32) -> Vec<u8> {
        let mut head = self.format_prefix(bucket).into_bytes();
        head.push(SALT_SEPARATOR);
        head
    }

    /// Physical key for `logical`, salted by the logical key itself.
    pub fn physical_key(&self, logical: &[u8]) -> Vec<u8> {
        self.physical_key_with_source(logical, logical)
    }

    /// Physical key for `logical`, salted by `source`.
    ///
    /// Use this when only part of the key should decide the bucket, e.g. all
    /// calls of one phone number on one day land together while the row key
    /// also carries the call time.
    pub fn physical_key_with_source(&self, source: &[u8], logical: &[u8]) -> Vec<u8> {
        let mut key = self.bucket_head(self.bucket(source));
        key.extend_from_slice(logical);
        key
    }

    /// Physical key for `logical` placed in an explicit bucket.
    pub fn physical_key_in_bucket(&self, bucket: u32, logical: &[u8]) -> Result<Vec<u8>, SaltError> {
        self.check_bucket(bucket)?;
        let mut key = self.bucket_head(bucket);
        key.extend_from_slice(logical);
        Ok(key)
    }

    /// Splits a physical key into its bucket and logical key. Returns `None`
    /// for keys this salter could not have produced.
    pub fn parse<'a>(&self, physical: &'a [u8]) -> Option<(u32, &'a [u8])> {
        if physical.len() <= self.width || physical[self.width] != SALT_SEPARATOR {
            return None;
        }
        let prefix = &physical[..self.width];
        if !prefix.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let bucket: u32 = std::str::from_utf8(prefix).ok()?.parse().ok()?;
        if bucket >= self.buckets {
            return None;
        }
        Some((bucket, &physical[self.width + 1..]))
    }

    /// The logical key inside a physical key.
    pub fn logical_key<'a>(&self, physical: &'a [u8]) -> Option<&'a [u8]> {
        self.parse(physical).map(|(_, logical)| logical)
    }
}

use std::fmt;
use std::str::FromStr;

use crate::CellError;

/// Maximum family name length in bytes.
const MAX_FAMILY_LEN: usize = 200;

/// A validated column family name.
///
/// Family names are printable ASCII, non-empty, and never contain `:` (which
/// separates family from qualifier in textual column specs such as
/// `base_info:name`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FamilyName(String);

impl FamilyName {
    pub fn new(name: impl Into<String>) -> Result<Self, CellError> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("must not be empty")
        } else if name.len() > MAX_FAMILY_LEN {
            Some("longer than 200 bytes")
        } else if name.contains(':') {
            Some("must not contain ':'")
        } else if !name.bytes().all(|b| b.is_ascii_graphic()) {
            Some("must be printable ASCII without spaces")
        } else if name.starts_with('.') {
            Some("must not start with '.'")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CellError::InvalidFamily { name, reason }),
            None => Ok(Self(name)),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for FamilyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FamilyName {
    type Err = CellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for FamilyName {
    type Error = CellError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl AsRef<str> for FamilyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

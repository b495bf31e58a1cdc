use std::fmt;
use std::str::FromStr;

use cells::FamilyName;

use crate::StoreError;

/// Namespace every unqualified table name belongs to.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Default number of versions retained per cell.
pub const DEFAULT_MAX_VERSIONS: usize = 1;

fn valid_name_part(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
        && !s.starts_with('.')
        && !s.starts_with('-')
}

/// Validates a namespace name.
pub fn validate_namespace(name: &str) -> Result<(), StoreError> {
    if valid_name_part(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidTableName {
            name: name.to_string(),
            reason: "namespace must be [A-Za-z0-9_.-]+ and not start with '.' or '-'",
        })
    }
}

/// A `namespace:qualifier` table name. Unqualified names live in
/// [`DEFAULT_NAMESPACE`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableName {
    namespace: String,
    qualifier: String,
}

impl TableName {
    pub fn new(namespace: &str, qualifier: &str) -> Result<Self, StoreError> {
        let full = format!("{namespace}:{qualifier}");
        if !valid_name_part(namespace) {
            return Err(StoreError::InvalidTableName {
                name: full,
                reason: "namespace must be [A-Za-z0-9_.-]+ and not start with '.' or '-'",
            });
        }
        if !valid_name_part(qualifier) {
            return Err(StoreError::InvalidTableName {
                name: full,
                reason: "table must be [A-Za-z0-9_.-]+ and not start with '.' or '-'",
            });
        }
        Ok(Self {
            namespace: namespace.to_string(),
            qualifier: qualifier.to_string(),
        })
    }

    /// Parses `table` or `namespace:table`.
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        match s.split_once(':') {
            Some((ns, q)) => Self::new(ns, q),
            None => Self::new(DEFAULT_NAMESPACE, s),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    /// Always `namespace:qualifier`, including for the default namespace.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}:{}", self.namespace, self.qualifier)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace == DEFAULT_NAMESPACE {
            f.write_str(&self.qualifier)
        } else {
            write!(f, "{}:{}", self.namespace, self.qualifier)
        }
    }
}

impl FromStr for TableName {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Schema of one column family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyDescriptor {
    pub name: FamilyName,
    /// Most recent versions retained per cell (>= 1).
    pub max_versions: usize,
}

impl FamilyDescriptor {
    pub fn new(name: FamilyName) -> Self {
        Self {
            name,
            max_versions: DEFAULT_MAX_VERSIONS,
        }
    }

    #[must_use]
    pub fn with_max_versions(mut self, max_versions: usize) -> Self {
        self.max_versions = max_versions;
        self
    }
}

/// Schema of a table: its name and column families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: TableName,
    pub families: Vec<FamilyDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: TableName) -> Self {
        Self {
            name,
            families: Vec::new(),
        }
    }

    /// Adds (or replaces) a family.
    #[must_use]
    pub fn with_family(mut self, family: FamilyDescriptor) -> Self {
        self.families.retain(|f| f.name != family.name);
        self.families.push(family);
        self
    }

    pub fn family(&self, name: &FamilyName) -> Option<&FamilyDescriptor> {
        self.families.iter().find(|f| &f.name == name)
    }

    pub fn family_mut(&mut self, name: &FamilyName) -> Option<&mut FamilyDescriptor> {
        self.families.iter_mut().find(|f| &f.name == name)
    }

    pub fn has_family(&self, name: &FamilyName) -> bool {
        self.family(name).is_some()
    }

    /// Checks the descriptor is usable for table creation or modification.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.families.is_empty() {
            return Err(StoreError::InvalidDescriptor(format!(
                "table {} must have at least one column family",
                self.name
            )));
        }
        for (i, f) in self.families.iter().enumerate() {
            if f.max_versions == 0 {
                return Err(StoreError::InvalidDescriptor(format!(
                    "family {} must retain at least one version",
                    f.name
                )));
            }
            if self.families[..i].iter().any(|g| g.name == f.name) {
                return Err(StoreError::InvalidDescriptor(format!(
                    "family {} declared twice",
                    f.name
                )));
            }
        }
        Ok(())
    }
}

use std::collections::{BTreeMap, BTreeSet};

use cells::{FamilyName, Qualifier};

use crate::PipelineError;

/// Qualifiers allowed within one family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualifiers {
    All,
    Only(BTreeSet<Qualifier>),
}

/// The `(family, qualifier)` pairs a migration copies.
///
/// Resolved once when the job is configured. A family listed without
/// qualifiers passes every qualifier; a family not listed passes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnAllowList {
    families: BTreeMap<FamilyName, Qualifiers>,
}

impl ColumnAllowList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `family` or `family:qualifier` specs, e.g. `base_info:name`.
    pub fn parse<I, S>(specs: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for spec in specs {
            let spec = spec.as_ref();
            let (family, qualifier) = match spec.split_once(':') {
                Some((family, qualifier)) => (family, Some(qualifier)),
                None => (spec, None),
            };
            let family = FamilyName::new(family).map_err(|e| {
                PipelineError::JobSubmission(format!("bad column spec {spec:?}: {e}"))
            })?;
            list = match qualifier {
                Some(qualifier) => list.with_column(family, qualifier.as_bytes()),
                None => list.with_family(family),
            };
        }
        Ok(list)
    }

    /// Allows every qualifier of `family`.
    #[must_use]
    pub fn with_family(mut self, family: FamilyName) -> Self {
        self.families.insert(family, Qualifiers::All);
        self
    }

    /// Allows one qualifier. No effect if the whole family is already allowed.
    #[must_use]
    pub fn with_column(mut self, family: FamilyName, qualifier: impl Into<Qualifier>) -> Self {
        let entry = self
            .families
            .entry(family)
            .or_insert_with(|| Qualifiers::Only(BTreeSet::new()));
        if let Qualifiers::Only(set) = entry {
            set.insert(qualifier.into());
        }
        self
    }

    pub fn allows(&self, family: &FamilyName, qualifier: &[u8]) -> bool {
        match self.families.get(family) {
            Some(Qualifiers::All) => true,
            Some(Qualifiers::Only(set)) => set.contains(qualifier),
            None => false,
        }
    }

    pub fn families(&self) -> impl Iterator<Item = &FamilyName> {
        self.families.keys()
    }

    pub fn qualifiers(&self, family: &FamilyName) -> Option<&Qualifiers> {
        self.families.get(family)
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

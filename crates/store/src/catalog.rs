//! # Catalog - Persistent Table Metadata
//!
//! Records the namespaces and tables of a [`LocalStore`](crate::LocalStore)
//! so its schema survives a restart. Row data lives in the per-table
//! journals; the catalog only tracks what the tables look like.
//!
//! ## File Format
//!
//! One entry per line, split keys hex-encoded:
//!
//! ```text
//! namespace default
//! namespace bigdata
//! table default:student enabled families=base_info/3,extra/1 splits=
//! table bigdata:calls disabled families=f/1 splits=3030307c,3030317c
//! ```
//!
//! Lines starting with `#` are comments. Empty lines are ignored.
//!
//! ## Crash Safety
//!
//! Rewritten atomically: write `CATALOG.tmp`, fsync, rename over `CATALOG`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use cells::FamilyName;

use crate::{FamilyDescriptor, StoreError, TableDescriptor, TableName};

/// Name of the catalog file within the store directory.
pub const CATALOG_FILENAME: &str = "CATALOG";

const CATALOG_TMP_FILENAME: &str = "CATALOG.tmp";

/// A table as recorded in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CatalogTable {
    pub descriptor: TableDescriptor,
    pub enabled: bool,
    pub splits: Vec<Vec<u8>>,
}

/// Contents of the catalog file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Catalog {
    pub namespaces: Vec<String>,
    pub tables: Vec<CatalogTable>,
}

impl Catalog {
    /// Loads `dir/CATALOG`, or returns an empty catalog if it does not exist.
    pub fn load(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(CATALOG_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut catalog = Self::default();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let bad = |what: &str| {
                StoreError::Catalog(format!("line {}: {what}: {trimmed}", line_num + 1))
            };

            let mut parts = trimmed.split_whitespace();
            match parts.next() {
                Some("namespace") => {
                    let name = parts.next().ok_or_else(|| bad("missing namespace name"))?;
                    catalog.namespaces.push(name.to_string());
                }
                Some("table") => {
                    let name = parts.next().ok_or_else(|| bad("missing table name"))?;
                    let name = TableName::parse(name).map_err(|_| bad("invalid table name"))?;
                    let enabled = match parts.next() {
                        Some("enabled") => true,
                        Some("disabled") => false,
                        _ => return Err(bad("expected enabled or disabled")),
                    };
                    let families = parts
                        .next()
                        .and_then(|p| p.strip_prefix("families="))
                        .ok_or_else(|| bad("missing families"))?;
                    let splits = parts
                        .next()
                        .and_then(|p| p.strip_prefix("splits="))
                        .ok_or_else(|| bad("missing splits"))?;

                    let mut descriptor = TableDescriptor::new(name);
                    for family in families.split(',').filter(|f| !f.is_empty()) {
                        let (fam, versions) =
                            family.split_once('/').ok_or_else(|| bad("bad family entry"))?;
                        let fam = FamilyName::new(fam).map_err(|_| bad("bad family name"))?;
                        let versions = versions
                            .parse::<usize>()
                            .map_err(|_| bad("bad max versions"))?;
                        descriptor = descriptor
                            .with_family(FamilyDescriptor::new(fam).with_max_versions(versions));
                    }
                    let splits = splits
                        .split(',')
                        .filter(|s| !s.is_empty())
                        .map(|s| decode_hex(s).ok_or_else(|| bad("bad split key")))
                        .collect::<Result<Vec<_>, _>>()?;

                    catalog.tables.push(CatalogTable {
                        descriptor,
                        enabled,
                        splits,
                    });
                }
                _ => return Err(bad("unknown entry")),
            }
        }
        Ok(catalog)
    }

    /// Persists the catalog to `dir/CATALOG`.
    pub fn save(&self, dir: &Path) -> Result<(), StoreError> {
        let tmp_path = dir.join(CATALOG_TMP_FILENAME);
        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            self.write_contents(&mut f)?;
            f.flush()?;
            f.sync_all()?;
        }
        fs::rename(&tmp_path, dir.join(CATALOG_FILENAME))?;
        Ok(())
    }

    fn write_contents(&self, f: &mut File) -> Result<(), StoreError> {
        writeln!(f, "# Saltbridge catalog")?;
        for ns in &self.namespaces {
            writeln!(f, "namespace {ns}")?;
        }
        for table in &self.tables {
            let families = table
                .descriptor
                .families
                .iter()
                .map(|fd| format!("{}/{}", fd.name, fd.max_versions))
                .collect::<Vec<_>>()
                .join(",");
            let splits = table
                .splits
                .iter()
                .map(|s| encode_hex(s))
                .collect::<Vec<_>>()
                .join(",");
            writeln!(
                f,
                "table {} {} families={families} splits={splits}",
                table.descriptor.name.full_name(),
                if table.enabled { "enabled" } else { "disabled" },
            )?;
        }
        Ok(())
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| s.get(i..i + 2).and_then(|h| u8::from_str_radix(h, 16).ok()))
        .collect()
}

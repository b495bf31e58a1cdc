//! Cold start: catalog load, tmp file cleanup, journal replay.
use std::fs;
use std::io;
use std::path::Path;

use cells::FamilyName;
use journal::{JournalError, JournalReader, JournalRecord, JournalWriter};
use tracing::{debug, warn};

use super::{State, TableState};
use crate::catalog::Catalog;
use crate::StoreError;

/// Rebuilds the store state under `root`. Returns the state and the newest
/// cell timestamp seen, which seeds the store clock.
pub(crate) fn recover(root: &Path, journal_sync: bool) -> Result<(State, u64), StoreError> {
    let catalog = Catalog::load(root)?;
    let mut state = State::new();
    state.namespaces.extend(catalog.namespaces);

    let mut last_ts = 0u64;
    for entry in catalog.tables {
        let name = entry.descriptor.name.clone();
        let dir = root.join("data").join(name.namespace());
        let path = dir.join(format!("{}.journal", name.qualifier()));
        fs::create_dir_all(&dir)?;
        cleanup_tmp_files(&dir);

        let mut table = TableState::new(entry.descriptor, entry.splits);
        table.enabled = entry.enabled;
        let (replayed, max_ts) = replay_journal(&path, &mut table)?;
        last_ts = last_ts.max(max_ts);
        table.journal = Some(JournalWriter::create(&path, journal_sync)?);

        debug!(table = %name, records = replayed, rows = table.row_count(), "recovered table");
        state.namespaces.insert(name.namespace().to_string());
        state.tables.insert(name, table);
    }
    Ok((state, last_ts))
}

/// Replays one journal into `table`. A missing journal is an empty table.
/// Records for families that are not (or no longer) in the schema are
/// skipped.
fn replay_journal(path: &Path, table: &mut TableState) -> Result<(usize, u64), StoreError> {
    let mut reader = match JournalReader::open(path) {
        Ok(reader) => reader,
        Err(JournalError::Io(e)) if e.kind() == io::ErrorKind::NotFound => return Ok((0, 0)),
        Err(e) => return Err(e.into()),
    };

    let mut count = 0usize;
    let mut max_ts = 0u64;
    let mut skipped = 0usize;
    reader.replay(|record| {
        count += 1;
        match record {
            JournalRecord::Put {
                row,
                family,
                qualifier,
                timestamp,
                value,
            } => match known_family(table, &family) {
                Some(family) => {
                    max_ts = max_ts.max(timestamp);
                    table.apply_put(&row, family, qualifier, timestamp, value);
                }
                None => skipped += 1,
            },
            JournalRecord::DeleteRow { row } => table.apply_delete_row(&row),
            JournalRecord::DeleteFamily { row, family } => match known_family(table, &family) {
                Some(family) => table.apply_delete_family(&row, &family),
                None => skipped += 1,
            },
        }
    })?;

    if skipped > 0 {
        warn!(
            table = %table.descriptor.name,
            skipped,
            "journal records for unknown families ignored"
        );
    }
    Ok((count, max_ts))
}

fn known_family(table: &TableState, raw: &[u8]) -> Option<FamilyName> {
    let name = std::str::from_utf8(raw).ok()?;
    let family = FamilyName::new(name).ok()?;
    table.descriptor.has_family(&family).then_some(family)
}

/// Removes `.journal.tmp` files left by an interrupted rewrite.
fn cleanup_tmp_files(dir: &Path) {
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let p = entry.path();
            if let Some(name) = p.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(".journal.tmp") {
                    let _ = fs::remove_file(&p);
                }
            }
        }
    }
}

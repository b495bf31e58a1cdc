use super::*;
use crc32fast::Hasher as Crc32;
use std::fs;
use std::io::Cursor;
use tempfile::tempdir;

// -------------------- Helpers --------------------

fn make_put(row: &[u8], qualifier: &[u8], ts: u64, value: &[u8]) -> JournalRecord {
    JournalRecord::Put {
        row: row.to_vec(),
        family: b"base_info".to_vec(),
        qualifier: qualifier.to_vec(),
        timestamp: ts,
        value: value.to_vec(),
    }
}

fn replay_all(path: &std::path::Path) -> Result<Vec<JournalRecord>, JournalError> {
    let mut reader = JournalReader::open(path)?;
    let mut recs = Vec::new();
    reader.replay(|r| recs.push(r))?;
    Ok(recs)
}

fn replay_from_bytes(data: &[u8]) -> Result<Vec<JournalRecord>, JournalError> {
    let mut reader = JournalReader::from_reader(Cursor::new(data.to_vec()));
    let mut recs = Vec::new();
    reader.replay(|r| recs.push(r))?;
    Ok(recs)
}

// -------------------- Write & replay --------------------

#[test]
fn write_and_replay_all_record_kinds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("student.journal");

    let records = vec![
        make_put(b"10001", b"name", 1, b"ssss"),
        make_put(b"10003", b"age", 2, &[0, 0, 0, 10]),
        JournalRecord::DeleteFamily {
            row: b"10001".to_vec(),
            family: b"base_info".to_vec(),
        },
        JournalRecord::DeleteRow {
            row: b"10003".to_vec(),
        },
    ];

    {
        let mut w = JournalWriter::create(&path, true).unwrap();
        for r in &records {
            w.append(r).unwrap();
        }
    }

    assert_eq!(replay_all(&path).unwrap(), records);
}

#[test]
fn reopening_appends() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.journal");

    {
        let mut w = JournalWriter::create(&path, false).unwrap();
        w.append(&make_put(b"a", b"q", 1, b"1")).unwrap();
        w.sync_to_disk().unwrap();
    }
    {
        let mut w = JournalWriter::create(&path, false).unwrap();
        w.append(&make_put(b"b", b"q", 2, b"2")).unwrap();
    }

    let recs = replay_all(&path).unwrap();
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[1], make_put(b"b", b"q", 2, b"2"));
}

#[test]
fn empty_fields_survive() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.journal");
    {
        let mut w = JournalWriter::create(&path, true).unwrap();
        w.append(&make_put(b"r", b"", 0, b"")).unwrap();
    }
    assert_eq!(replay_all(&path).unwrap(), vec![make_put(b"r", b"", 0, b"")]);
}

// -------------------- Truncated tail tolerance --------------------

#[test]
fn truncated_tail_after_valid_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.journal");

    {
        let mut w = JournalWriter::create(&path, true).unwrap();
        w.append(&make_put(b"k1", b"q", 1, b"v1")).unwrap();
        w.append(&make_put(b"k2", b"q", 2, b"v2")).unwrap();
    }

    let mut data = fs::read(&path).unwrap();
    data.extend_from_slice(&[0x20, 0x00, 0x00, 0x00]);
    fs::write(&path, &data).unwrap();

    let recs = replay_all(&path).unwrap();
    assert_eq!(recs.len(), 2);
}

#[test]
fn empty_journal_replays_nothing() {
    assert!(replay_from_bytes(b"").unwrap().is_empty());
}

// -------------------- Corruption detection --------------------

#[test]
fn flipped_byte_is_corruption() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.journal");
    {
        let mut w = JournalWriter::create(&path, true).unwrap();
        w.append(&make_put(b"k", b"q", 1, b"v")).unwrap();
    }

    let mut data = fs::read(&path).unwrap();
    let last = data.len() - 1;
    data[last] ^= 0xFF;
    fs::write(&path, &data).unwrap();

    assert!(matches!(replay_all(&path), Err(JournalError::Corrupt)));
}

#[test]
fn unknown_op_is_corruption() {
    let body = [9u8, 0, 0, 0, 0];
    let mut hasher = Crc32::new();
    hasher.update(&body);
    let crc = hasher.finalize();

    let mut frame = Vec::new();
    frame.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
    frame.extend_from_slice(&crc.to_le_bytes());
    frame.extend_from_slice(&body);

    assert!(matches!(replay_from_bytes(&frame), Err(JournalError::Corrupt)));
}

#[test]
fn absurd_length_is_corruption() {
    let frame = [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0];
    assert!(matches!(replay_from_bytes(&frame), Err(JournalError::Corrupt)));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let result = JournalReader::open(dir.path().join("nope.journal"));
    assert!(matches!(result, Err(JournalError::Io(_))));
}

// -------------------- Rewrite --------------------

#[test]
fn rewrite_replaces_contents_atomically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.journal");
    {
        let mut w = JournalWriter::create(&path, true).unwrap();
        for ts in 1..=5 {
            w.append(&make_put(b"k", b"q", ts, b"v")).unwrap();
        }
    }

    JournalWriter::rewrite(&path, vec![make_put(b"k", b"q", 5, b"v")]).unwrap();

    assert_eq!(replay_all(&path).unwrap(), vec![make_put(b"k", b"q", 5, b"v")]);
    assert!(!path.with_extension("journal.tmp").exists());
}

#[test]
fn writer_after_rewrite_appends_to_new_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.journal");
    JournalWriter::rewrite(&path, Vec::new()).unwrap();
    {
        let mut w = JournalWriter::create(&path, true).unwrap();
        w.append(&JournalRecord::DeleteRow { row: b"x".to_vec() })
            .unwrap();
    }
    assert_eq!(replay_all(&path).unwrap().len(), 1);
}

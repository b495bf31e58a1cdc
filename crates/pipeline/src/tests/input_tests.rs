use anyhow::Result;
use store::{Connector, LocalStore, RowFilter, Store};

use super::helpers::{descriptor, fam, keys, put_at, write_lines};
use crate::*;

fn read_all<F: InputFormat>(input: &F, store: &dyn Store) -> Vec<F::Record> {
    let mut records = Vec::new();
    for split in input.splits(store).unwrap() {
        for record in input.read(store, &split).unwrap() {
            records.push(record.unwrap());
        }
    }
    records
}

// -------------------- TableInput --------------------

#[test]
fn one_split_per_region() -> Result<()> {
    let conn = LocalStore::in_memory().connect()?;
    let splits = vec![b"10002".to_vec(), b"10004".to_vec()];
    conn.create_table(&descriptor("student", &["base_info"]), Some(splits.as_slice()))?;
    for key in ["10001", "10002", "10003", "10004", "10005"] {
        conn.put(&super::helpers::table("student"), &put_at(key, "base_info", "name", 1, b"x"))?;
    }

    let input = TableInput::new(super::helpers::table("student"));
    let planned = input.splits(&conn)?;
    assert_eq!(planned.len(), 3);
    assert_eq!(
        planned[1],
        InputSplit::Region {
            index: 1,
            start: b"10002".to_vec(),
            end: b"10004".to_vec(),
        }
    );

    let second: Vec<_> = input
        .read(&conn, &planned[1])?
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(keys(&second), vec!["10002", "10003"]);

    assert_eq!(keys(&read_all(&input, &conn)).len(), 5);
    Ok(())
}

#[test]
fn table_input_pushes_down_families_and_filter() -> Result<()> {
    let conn = LocalStore::in_memory().connect()?;
    let student = super::helpers::table("student");
    conn.create_table(&descriptor("student", &["base_info", "extra"]), None)?;
    conn.put(&student, &put_at("10001", "base_info", "name", 1, b"a"))?;
    conn.put(&student, &put_at("10001", "extra", "note", 1, b"n"))?;
    conn.put(&student, &put_at("20001", "base_info", "name", 1, b"b"))?;

    let input = TableInput::new(student)
        .with_families([fam("base_info")])
        .with_filter(RowFilter::KeyContains(b"100".to_vec()));
    let rows = read_all(&input, &conn);

    assert_eq!(keys(&rows), vec!["10001"]);
    assert_eq!(rows[0].families().count(), 1);
    Ok(())
}

#[test]
fn missing_table_is_a_schema_error() -> Result<()> {
    let conn = LocalStore::in_memory().connect()?;
    let input = TableInput::new(super::helpers::table("nope"));
    assert!(matches!(input.splits(&conn), Err(PipelineError::Schema(_))));
    Ok(())
}

// -------------------- TextInput --------------------

#[test]
fn lines_are_chunked_and_numbered() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_lines(dir.path(), "in.tsv", &["a", "b", "c", "d", "e"]);
    let conn = LocalStore::in_memory().connect()?;

    let input = TextInput::new(&path, 2);
    let splits = input.splits(&conn)?;
    assert_eq!(splits.len(), 3);
    assert_eq!(
        splits[2],
        InputSplit::Lines {
            index: 2,
            offset: 8,
            first_line: 5,
            lines: 1,
        }
    );

    let middle: Vec<Line> = input
        .read(&conn, &splits[1])?
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(
        middle,
        vec![
            Line::new(3, "c"),
            Line::new(4, "d"),
        ]
    );

    let all: Vec<Vec<u8>> = read_all(&input, &conn).into_iter().map(|l| l.bytes).collect();
    assert_eq!(all, vec![b"a", b"b", b"c", b"d", b"e"]);
    Ok(())
}

#[test]
fn last_line_without_newline_is_read() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("in.tsv");
    std::fs::write(&path, "1001\tx\tm\r\n1002\ty\tf")?;
    let conn = LocalStore::in_memory().connect()?;

    let lines = read_all(&TextInput::new(&path, 10), &conn);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].bytes, b"1001\tx\tm");
    assert_eq!(lines[1].bytes, b"1002\ty\tf");
    Ok(())
}

#[test]
fn undecodable_line_is_read_as_bytes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("in.tsv");
    std::fs::write(&path, b"1001\tx\tm\n1002\t\xff\xfe\tf\n1003\tz\tm\n")?;
    let conn = LocalStore::in_memory().connect()?;

    let lines = read_all(&TextInput::new(&path, 10), &conn);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], Line::new(2, &b"1002\t\xff\xfe\tf"[..]));
    assert_eq!(lines[2].number, 3);
    Ok(())
}

#[test]
fn empty_file_has_no_splits() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("empty.tsv");
    std::fs::write(&path, "")?;
    let conn = LocalStore::in_memory().connect()?;

    assert!(TextInput::new(&path, 10).splits(&conn)?.is_empty());
    Ok(())
}

#[test]
fn split_kinds_do_not_mix() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_lines(dir.path(), "in.tsv", &["a"]);
    let conn = LocalStore::in_memory().connect()?;
    let region = InputSplit::Region {
        index: 0,
        start: Vec::new(),
        end: Vec::new(),
    };

    assert!(matches!(
        TextInput::new(&path, 10).read(&conn, &region),
        Err(PipelineError::JobSubmission(_))
    ));
    Ok(())
}

use super::helpers::*;
use crate::*;
use anyhow::Result;
use cells::{encode_i32, Delete, Put};

fn student_store() -> Result<(LocalStore, LocalConnection, TableName)> {
    let store = LocalStore::in_memory();
    let conn = store.connect()?;
    conn.create_table(&student_descriptor(), None)?;
    Ok((store, conn, table("student")))
}

// -------------------- Put --------------------

#[test]
fn put_then_get_latest() -> Result<()> {
    let (_store, conn, name) = student_store()?;
    let mut put = Put::new(b"10003".to_vec());
    put.add_column(fam("base_info"), b"name".to_vec(), b"abc".to_vec())
        .add_column(fam("base_info"), b"age".to_vec(), encode_i32(10).to_vec());
    conn.put(&name, &put)?;

    let row = conn.get(&name, b"10003")?.expect("row written");
    assert_eq!(row.value(&fam("base_info"), b"name"), Some(&b"abc"[..]));
    assert_eq!(
        row.value(&fam("base_info"), b"age"),
        Some(&[0u8, 0, 0, 10][..])
    );
    Ok(())
}

#[test]
fn store_assigned_timestamps_increase() -> Result<()> {
    let (_store, conn, name) = student_store()?;
    for v in ["a", "b", "c"] {
        let mut put = Put::new(b"r".to_vec());
        put.add_column(fam("base_info"), b"q".to_vec(), v.as_bytes().to_vec());
        conn.put(&name, &put)?;
    }

    let rows = collect(conn.scan(&name, &Scan::new().with_max_versions(3))?);
    let versions = rows[0].versions(&fam("base_info"), b"q").expect("cell");
    let ts: Vec<u64> = versions.iter().map(|v| v.timestamp).collect();
    assert_eq!(ts.len(), 3);
    assert!(ts[0] > ts[1] && ts[1] > ts[2]);
    assert_eq!(versions.latest().map(|v| v.value.as_slice()), Some(&b"c"[..]));
    Ok(())
}

#[test]
fn assigned_timestamps_follow_explicit_ones() -> Result<()> {
    let (_store, conn, name) = student_store()?;
    let far_future = u64::MAX / 2;
    conn.put(&name, &put_at("r", "base_info", "q", far_future, "old"))?;

    let mut put = Put::new(b"r".to_vec());
    put.add_column(fam("base_info"), b"q".to_vec(), b"new".to_vec());
    conn.put(&name, &put)?;

    let row = conn.get(&name, b"r")?.expect("row");
    assert_eq!(row.value(&fam("base_info"), b"q"), Some(&b"new"[..]));
    Ok(())
}

#[test]
fn same_timestamp_overwrites() -> Result<()> {
    let (_store, conn, name) = student_store()?;
    conn.put(&name, &put_at("r", "base_info", "q", 7, "first"))?;
    conn.put(&name, &put_at("r", "base_info", "q", 7, "second"))?;

    let rows = collect(conn.scan(&name, &Scan::new().with_max_versions(3))?);
    let versions = rows[0].versions(&fam("base_info"), b"q").expect("cell");
    assert_eq!(versions.len(), 1);
    assert_eq!(versions.latest().map(|v| v.value.as_slice()), Some(&b"second"[..]));
    Ok(())
}

#[test]
fn unknown_family_rejects_whole_put() -> Result<()> {
    let (_store, conn, name) = student_store()?;
    let mut put = Put::new(b"r".to_vec());
    put.add_column_at(fam("base_info"), b"name".to_vec(), 1, b"ok".to_vec())
        .add_column_at(fam("missing"), b"x".to_vec(), 1, b"no".to_vec());

    let err = conn.put(&name, &put).unwrap_err();
    assert!(matches!(err, StoreError::FamilyNotFound { ref family, .. } if family == "missing"));
    assert!(conn.get(&name, b"r")?.is_none());
    Ok(())
}

#[test]
fn empty_put_and_empty_row_key_are_invalid() -> Result<()> {
    let (_store, conn, name) = student_store()?;
    let err = conn.put(&name, &Put::new(b"r".to_vec())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    let err = conn
        .put(&name, &put_at("", "base_info", "q", 1, "v"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    Ok(())
}

#[test]
fn put_all_applies_in_order() -> Result<()> {
    let (_store, conn, name) = student_store()?;
    let puts = vec![
        put_at("a", "base_info", "q", 1, "1"),
        put_at("b", "base_info", "q", 1, "2"),
    ];
    conn.put_all(&name, &puts)?;
    assert_eq!(keys(&collect(conn.scan(&name, &Scan::new())?)), vec!["a", "b"]);
    Ok(())
}

#[test]
fn put_into_missing_table_fails() -> Result<()> {
    let (_store, conn, _) = student_store()?;
    let err = conn
        .put(&table("ghost"), &put_at("r", "base_info", "q", 1, "v"))
        .unwrap_err();
    assert!(matches!(err, StoreError::TableNotFound(_)));
    Ok(())
}

// -------------------- Delete --------------------

#[test]
fn delete_whole_row() -> Result<()> {
    let (_store, conn, name) = student_store()?;
    conn.put(&name, &put_at("r", "base_info", "q", 1, "v"))?;
    conn.put(&name, &put_at("r", "extra", "q", 1, "v"))?;

    conn.delete(&name, &Delete::new(b"r".to_vec()))?;
    assert!(conn.get(&name, b"r")?.is_none());
    Ok(())
}

#[test]
fn delete_one_family_keeps_the_others() -> Result<()> {
    let (_store, conn, name) = student_store()?;
    conn.put(&name, &put_at("r", "base_info", "q", 1, "v"))?;
    conn.put(&name, &put_at("r", "extra", "q", 1, "v"))?;

    conn.delete(&name, &Delete::new(b"r".to_vec()).family(fam("base_info")))?;
    let row = conn.get(&name, b"r")?.expect("extra remains");
    assert!(row.value(&fam("base_info"), b"q").is_none());
    assert!(row.value(&fam("extra"), b"q").is_some());

    conn.delete(&name, &Delete::new(b"r".to_vec()).family(fam("extra")))?;
    assert!(conn.get(&name, b"r")?.is_none());
    Ok(())
}

#[test]
fn delete_of_absent_row_is_a_noop() -> Result<()> {
    let (_store, conn, name) = student_store()?;
    conn.delete(&name, &Delete::new(b"nobody".to_vec()))?;
    Ok(())
}

#[test]
fn delete_unknown_family_fails() -> Result<()> {
    let (_store, conn, name) = student_store()?;
    let err = conn
        .delete(&name, &Delete::new(b"r".to_vec()).family(fam("nope")))
        .unwrap_err();
    assert!(matches!(err, StoreError::FamilyNotFound { .. }));
    Ok(())
}

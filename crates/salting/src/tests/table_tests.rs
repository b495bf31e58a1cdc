use crate::*;
use anyhow::Result;
use cells::{FamilyName, Put};
use store::{Connector, FamilyDescriptor, LocalStore, Store, TableDescriptor, TableName};

fn fam() -> FamilyName {
    FamilyName::new("f").unwrap()
}

fn calls_descriptor() -> TableDescriptor {
    TableDescriptor::new(TableName::parse("calls").unwrap()).with_family(FamilyDescriptor::new(fam()))
}

fn logical_keys(salter: &KeySalter, rows: Vec<cells::Row>) -> Vec<String> {
    rows.iter()
        .map(|r| String::from_utf8_lossy(salter.logical_key(r.key()).unwrap()).into_owned())
        .collect()
}

// -------------------- SaltedTable --------------------

#[test]
fn create_aligns_regions_with_buckets() -> Result<()> {
    let conn = LocalStore::in_memory().connect()?;
    let salter = KeySalter::new(4)?;
    let table = SaltedTable::create(&conn, &calls_descriptor(), salter)?;
    table.verify_layout()?;

    for i in 0..200 {
        let mut put = Put::new(format!("subscriber-{i}").into_bytes());
        put.add_column(fam(), b"n".to_vec(), i.to_string().into_bytes());
        table.put(&put)?;
    }

    let regions = conn.regions(table.table())?;
    assert_eq!(regions.len(), 4);
    assert_eq!(regions.iter().map(|r| r.rows).sum::<usize>(), 200);
    for region in &regions {
        assert!(region.rows > 0, "region {} is empty", region.index);
    }
    Ok(())
}

#[test]
fn layout_mismatch_is_detected() -> Result<()> {
    let conn = LocalStore::in_memory().connect()?;
    SaltedTable::create(&conn, &calls_descriptor(), KeySalter::new(3)?)?;
    let wrong = SaltedTable::new(&conn, TableName::parse("calls")?, KeySalter::new(5)?);
    assert!(matches!(
        wrong.verify_layout(),
        Err(SaltError::RegionMismatch { regions: 3, buckets: 5, .. })
    ));
    Ok(())
}

#[test]
fn split_width_mismatch_is_detected() -> Result<()> {
    let conn = LocalStore::in_memory().connect()?;
    SaltedTable::create(&conn, &calls_descriptor(), KeySalter::new(3)?.with_min_width(3))?;
    // same bucket count, but prefixes "0_" instead of "000_"
    let wrong = SaltedTable::new(&conn, TableName::parse("calls")?, KeySalter::new(3)?);
    assert!(matches!(
        wrong.verify_layout(),
        Err(SaltError::SplitMismatch { region: 1, .. })
    ));
    Ok(())
}

#[test]
fn get_by_logical_key() -> Result<()> {
    let conn = LocalStore::in_memory().connect()?;
    let table = SaltedTable::create(&conn, &calls_descriptor(), KeySalter::new(3)?)?;

    let mut put = Put::new(b"13824411467_2020-04-22".to_vec());
    put.add_column_at(fam(), b"duration".to_vec(), 1, b"42".to_vec());
    let physical = table.put(&put)?;

    assert_eq!(table.salter().logical_key(&physical), Some(&b"13824411467_2020-04-22"[..]));
    let row = table.get(b"13824411467_2020-04-22")?.expect("row");
    assert_eq!(row.key(), physical.as_slice());
    assert_eq!(row.value(&fam(), b"duration"), Some(&b"42"[..]));
    Ok(())
}

#[test]
fn range_query_finds_every_bucket() -> Result<()> {
    let conn = LocalStore::in_memory().connect()?;
    let salter = KeySalter::new(3)?;
    let table = SaltedTable::create(&conn, &calls_descriptor(), salter)?;
    for key in ["A", "B", "C", "D", "M", "Y", "Z", "Z1", "a"] {
        let mut put = Put::new(key.as_bytes().to_vec());
        put.add_column_at(fam(), b"v".to_vec(), 1, key.as_bytes().to_vec());
        table.put(&put)?;
    }

    let range = LogicalRange::inclusive("A", "Z");
    assert_eq!(table.plan(&range).len(), 3);

    let ordered = table
        .range_query(&range, true)?
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(
        logical_keys(&salter, ordered),
        vec!["A", "B", "C", "D", "M", "Y", "Z"]
    );

    let mut unordered = logical_keys(
        &salter,
        table
            .range_query(&range, false)?
            .collect::<Result<Vec<_>, _>>()?,
    );
    unordered.sort();
    assert_eq!(unordered, vec!["A", "B", "C", "D", "M", "Y", "Z"]);
    Ok(())
}

#[test]
fn unordered_results_come_bucket_by_bucket() -> Result<()> {
    let conn = LocalStore::in_memory().connect()?;
    let salter = KeySalter::new(5)?;
    let table = SaltedTable::create(&conn, &calls_descriptor(), salter)?;
    for i in 0..50 {
        let mut put = Put::new(format!("k{i:02}").into_bytes());
        put.add_column_at(fam(), b"v".to_vec(), 1, b"x".to_vec());
        table.put(&put)?;
    }

    let buckets: Vec<u32> = table
        .range_query(&LogicalRange::all(), false)?
        .map(|r| salter.parse(r.unwrap().key()).unwrap().0)
        .collect();
    assert_eq!(buckets.len(), 50);
    assert!(buckets.windows(2).all(|w| w[0] <= w[1]));
    Ok(())
}

#[test]
fn single_bucket_query() -> Result<()> {
    let conn = LocalStore::in_memory().connect()?;
    let salter = KeySalter::new(3)?;
    let table = SaltedTable::create(&conn, &calls_descriptor(), salter)?;

    let mut put = Put::new(b"13824411467_2020-04-22 10:00".to_vec());
    put.add_column_at(fam(), b"v".to_vec(), 1, b"x".to_vec());
    table.put_with_source(b"13824411467_2020-04", &put)?;

    let row = table
        .get_with_source(b"13824411467_2020-04", b"13824411467_2020-04-22 10:00")?
        .unwrap();
    assert_eq!(
        salter.logical_key(row.key()),
        Some(&b"13824411467_2020-04-22 10:00"[..])
    );

    let bucket = salter.bucket(b"13824411467_2020-04");
    let rows: Vec<_> = table
        .range_query_bucket(bucket, &LogicalRange::from("13824411467_2020-04-22"))?
        .collect::<Result<_, _>>()?;
    assert_eq!(rows.len(), 1);

    let other = (bucket + 1) % 3;
    let none: Vec<_> = table
        .range_query_bucket(other, &LogicalRange::all())?
        .collect::<Result<_, _>>()?;
    assert!(none.is_empty());
    Ok(())
}

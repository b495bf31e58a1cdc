use cells::{FamilyName, Put, Row};

use crate::*;

pub fn fam(name: &str) -> FamilyName {
    FamilyName::new(name).unwrap()
}

pub fn table(name: &str) -> TableName {
    TableName::parse(name).unwrap()
}

/// `student` with `base_info` (3 versions) and `extra` (1 version).
pub fn student_descriptor() -> TableDescriptor {
    TableDescriptor::new(table("student"))
        .with_family(FamilyDescriptor::new(fam("base_info")).with_max_versions(3))
        .with_family(FamilyDescriptor::new(fam("extra")))
}

pub fn put_at(row: &str, family: &str, qualifier: &str, ts: u64, value: &str) -> Put {
    let mut put = Put::new(row.as_bytes());
    put.add_column_at(fam(family), qualifier.as_bytes(), ts, value.as_bytes());
    put
}

pub fn collect(stream: RowStream) -> Vec<Row> {
    stream.collect::<Result<Vec<_>, _>>().unwrap()
}

pub fn keys(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .map(|r| String::from_utf8_lossy(r.key()).into_owned())
        .collect()
}

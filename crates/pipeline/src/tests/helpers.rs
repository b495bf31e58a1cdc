use std::path::{Path, PathBuf};

use cells::{FamilyName, Put, Row};
use config::Settings;
use store::{FamilyDescriptor, Scan, Store, TableDescriptor, TableName};

pub fn fam(name: &str) -> FamilyName {
    FamilyName::new(name).unwrap()
}

pub fn table(name: &str) -> TableName {
    TableName::parse(name).unwrap()
}

/// A table with each of `families`, 3 versions each.
pub fn descriptor(name: &str, families: &[&str]) -> TableDescriptor {
    families
        .iter()
        .fold(TableDescriptor::new(table(name)), |d, f| {
            d.with_family(FamilyDescriptor::new(fam(f)).with_max_versions(3))
        })
}

pub fn put_at(row: &str, family: &str, qualifier: &str, ts: u64, value: &[u8]) -> Put {
    let mut put = Put::new(row.as_bytes());
    put.add_column_at(fam(family), qualifier.as_bytes(), ts, value);
    put
}

pub fn rows(store: &dyn Store, name: &str) -> Vec<Row> {
    store
        .scan(&table(name), &Scan::new())
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

pub fn keys(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .map(|r| String::from_utf8_lossy(r.key()).into_owned())
        .collect()
}

pub fn text(row: &Row, family: &str, qualifier: &str) -> Option<String> {
    row.value(&fam(family), qualifier.as_bytes())
        .map(|v| String::from_utf8_lossy(v).into_owned())
}

pub fn write_lines(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut body = lines.join("\n");
    body.push('\n');
    std::fs::write(&path, body).unwrap();
    path
}

pub fn settings(reduce_tasks: usize, split_lines: usize) -> Settings {
    let mut settings = Settings::default();
    settings.job.reduce_tasks = reduce_tasks;
    settings.job.split_lines = split_lines;
    settings.job.max_task_attempts = 3;
    settings
}

use cells::Put;

use super::helpers::put_at;
use crate::*;

fn record(key: &str, value: &str) -> (Vec<u8>, Put) {
    (
        key.as_bytes().to_vec(),
        put_at(key, "f", "q", 1, value.as_bytes()),
    )
}

fn value(put: &Put) -> String {
    String::from_utf8_lossy(&put.cells()[0].value).into_owned()
}

// -------------------- ShuffleStage --------------------

#[test]
fn key_lands_in_one_partition() {
    let stage = ShuffleStage::new(4);
    let outputs = vec![
        vec![record("k1", "a"), record("k2", "b")],
        vec![record("k1", "c")],
        vec![record("k3", "d"), record("k1", "e")],
    ];

    let partitions = stage.shuffle(outputs);
    assert_eq!(partitions.len(), 4);

    let holding_k1: Vec<usize> = partitions
        .iter()
        .enumerate()
        .filter(|(_, groups)| groups.iter().any(|g| g.key == b"k1"))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(holding_k1, vec![stage.partition_for(b"k1")]);
}

#[test]
fn groups_keep_arrival_order() {
    let stage = ShuffleStage::new(1);
    let outputs = vec![
        vec![record("k1", "a"), record("k2", "b")],
        vec![record("k1", "c")],
        vec![record("k1", "d")],
    ];

    let partitions = stage.shuffle(outputs);
    let k1 = partitions[0].iter().find(|g| g.key == b"k1").unwrap();
    let values: Vec<String> = k1.records.iter().map(value).collect();
    assert_eq!(values, vec!["a", "c", "d"]);
}

#[test]
fn groups_are_sorted_by_key() {
    let stage = ShuffleStage::new(1);
    let outputs = vec![vec![record("b", "1"), record("c", "2"), record("a", "3")]];

    let partitions = stage.shuffle(outputs);
    let keys: Vec<&[u8]> = partitions[0].iter().map(|g| g.key.as_slice()).collect();
    assert_eq!(keys, vec![&b"a"[..], &b"b"[..], &b"c"[..]]);
}

#[test]
fn zero_partitions_means_one() {
    let stage = ShuffleStage::new(0);
    assert_eq!(stage.partitions(), 1);
    assert_eq!(stage.partition_for(b"anything"), 0);
}

#[test]
fn empty_input_gives_empty_partitions() {
    let partitions = ShuffleStage::new(3).shuffle(Vec::new());
    assert_eq!(partitions.len(), 3);
    assert!(partitions.iter().all(Vec::is_empty));
}

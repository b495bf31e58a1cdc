use cells::Put;
use crc32fast::Hasher as Crc32;

/// Every record emitted for one key, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGroup {
    pub key: Vec<u8>,
    pub records: Vec<Put>,
}

/// Routes mapper output to reduce partitions and groups it by key.
///
/// A key always lands in partition `crc32(key) % partitions`, so exactly one
/// reduce task owns it. Within a partition groups are in ascending key order.
/// Records of one key keep the order of the map tasks that emitted them
/// (task index, then emission order).
#[derive(Debug, Clone, Copy)]
pub struct ShuffleStage {
    partitions: usize,
}

impl ShuffleStage {
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions: partitions.max(1),
        }
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    pub fn partition_for(&self, key: &[u8]) -> usize {
        let mut hasher = Crc32::new();
        hasher.update(key);
        hasher.finalize() as usize % self.partitions
    }

    /// `outputs[i]` is the output of map task `i`.
    pub fn shuffle(&self, outputs: Vec<Vec<(Vec<u8>, Put)>>) -> Vec<Vec<KeyGroup>> {
        let mut partitions: Vec<Vec<(Vec<u8>, Put)>> =
            (0..self.partitions).map(|_| Vec::new()).collect();
        for output in outputs {
            for (key, put) in output {
                partitions[self.partition_for(&key)].push((key, put));
            }
        }
        partitions.into_iter().map(group).collect()
    }
}

fn group(mut records: Vec<(Vec<u8>, Put)>) -> Vec<KeyGroup> {
    // stable: equal keys keep arrival order
    records.sort_by(|a, b| a.0.cmp(&b.0));

    let mut groups: Vec<KeyGroup> = Vec::new();
    for (key, put) in records {
        match groups.last_mut() {
            Some(last) if last.key == key => last.records.push(put),
            _ => groups.push(KeyGroup {
                key,
                records: vec![put],
            }),
        }
    }
    groups
}

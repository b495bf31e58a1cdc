use crate::*;

// -------------------- SplitBoundary --------------------

#[test]
fn three_buckets_match_the_classic_layout() {
    let salter = KeySalter::new(3).unwrap().with_min_width(3);
    let splits = SplitBoundary::for_salter(&salter);
    assert_eq!(splits.keys(), &[b"000|".to_vec(), b"001|".to_vec()][..]);
    assert_eq!(splits.partitions(), 3);
}

#[test]
fn four_buckets_give_three_boundaries() {
    let salter = KeySalter::new(4).unwrap();
    let splits = SplitBoundary::for_salter(&salter);
    assert_eq!(splits.len(), 3);
    assert!(splits.keys().windows(2).all(|w| w[0] < w[1]));

    for logical in ["13824411467_2020-04-22", "a", "zzz", "", "15032293356_2020-05-01"] {
        let physical = salter.physical_key(logical.as_bytes());
        let (bucket, _) = salter.parse(&physical).unwrap();
        assert_eq!(splits.partition_for(&physical), bucket as usize, "{logical}");
    }
}

#[test]
fn single_bucket_needs_no_splits() {
    let splits = SplitBoundary::for_salter(&KeySalter::new(1).unwrap());
    assert!(splits.is_empty());
    assert_eq!(splits.partition_for(b"0_anything"), 0);
}

#[test]
fn boundaries_are_valid_store_splits() {
    for n in 1..=120 {
        let splits = SplitBoundary::for_salter(&KeySalter::new(n).unwrap());
        assert_eq!(splits.len() as u32, n - 1);
        assert!(store::validate_splits(splits.keys()).is_ok(), "n = {n}");
    }
}

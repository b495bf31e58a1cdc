use crate::*;

// -------------------- KeySalter --------------------

#[test]
fn zero_buckets_is_an_error() {
    assert!(matches!(KeySalter::new(0), Err(SaltError::ZeroBuckets)));
}

#[test]
fn salting_is_repeatable() {
    let salter = KeySalter::new(3).unwrap();
    let first = salter.salt(b"13824411467_2020-04-22");
    for _ in 0..100 {
        assert_eq!(salter.salt(b"13824411467_2020-04-22"), first);
    }
    let other = KeySalter::new(3).unwrap();
    assert_eq!(other.salt(b"13824411467_2020-04-22"), first);
}

#[test]
fn prefix_width_follows_bucket_count() {
    assert_eq!(KeySalter::new(1).unwrap().width(), 1);
    assert_eq!(KeySalter::new(3).unwrap().width(), 1);
    assert_eq!(KeySalter::new(10).unwrap().width(), 1);
    assert_eq!(KeySalter::new(11).unwrap().width(), 2);
    assert_eq!(KeySalter::new(100).unwrap().width(), 2);
    assert_eq!(KeySalter::new(101).unwrap().width(), 3);
    assert_eq!(KeySalter::new(3).unwrap().with_min_width(3).width(), 3);
    assert_eq!(KeySalter::new(1000).unwrap().with_min_width(1).width(), 3);
}

#[test]
fn prefixes_are_zero_padded() {
    let salter = KeySalter::new(3).unwrap().with_min_width(3);
    assert_eq!(salter.prefix(0).unwrap(), "000");
    assert_eq!(salter.prefix(2).unwrap(), "002");
    assert!(matches!(
        salter.prefix(3),
        Err(SaltError::BucketOutOfRange { bucket: 3, buckets: 3 })
    ));
}

#[test]
fn physical_key_layout() {
    let salter = KeySalter::new(3).unwrap().with_min_width(3);
    let logical = b"13824411467_2020-04-22";
    let physical = salter.physical_key(logical);

    let prefix = salter.salt(logical);
    assert_eq!(&physical[..3], prefix.as_bytes());
    assert_eq!(physical[3], b'_');
    assert_eq!(&physical[4..], &logical[..]);

    let (bucket, parsed) = salter.parse(&physical).unwrap();
    assert_eq!(salter.prefix(bucket).unwrap(), prefix);
    assert_eq!(parsed, &logical[..]);
}

#[test]
fn salt_source_decides_the_bucket() {
    let salter = KeySalter::new(7).unwrap();
    let a = salter.physical_key_with_source(b"13824411467_2020-04", b"13824411467_2020-04-22 10:00");
    let b = salter.physical_key_with_source(b"13824411467_2020-04", b"13824411467_2020-04-30 23:59");
    assert_eq!(salter.parse(&a).unwrap().0, salter.parse(&b).unwrap().0);
}

#[test]
fn explicit_bucket_placement() {
    let salter = KeySalter::new(4).unwrap();
    assert_eq!(salter.physical_key_in_bucket(2, b"k").unwrap(), b"2_k".to_vec());
    assert!(salter.physical_key_in_bucket(4, b"k").is_err());
}

#[test]
fn parse_rejects_foreign_keys() {
    let salter = KeySalter::new(3).unwrap().with_min_width(3);
    assert!(salter.parse(b"plain").is_none());
    assert!(salter.parse(b"000").is_none());
    assert!(salter.parse(b"00a_k").is_none());
    assert!(salter.parse(b"005_k").is_none());
    assert!(salter.parse(b"000-k").is_none());
    assert_eq!(salter.parse(b"001_"), Some((1, &b""[..])));
    assert_eq!(salter.logical_key(b"002_abc"), Some(&b"abc"[..]));
}

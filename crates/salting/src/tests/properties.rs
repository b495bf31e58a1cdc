use crate::*;
use proptest::prelude::*;

fn arb_key() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..24)
}

fn arb_buckets() -> impl Strategy<Value = u32> {
    1u32..=256
}

proptest! {
    /// The same key and bucket count always give the same prefix.
    #[test]
    fn prop_salting_is_deterministic(key in arb_key(), n in arb_buckets()) {
        let a = KeySalter::new(n).unwrap();
        let b = KeySalter::new(n).unwrap();
        prop_assert_eq!(a.salt(&key), b.salt(&key));
        prop_assert_eq!(a.physical_key(&key), b.physical_key(&key));
    }

    /// Buckets lie in `[0, N)` and prefixes are non-negative fixed-width digits.
    #[test]
    fn prop_bucket_in_range(key in arb_key(), n in arb_buckets()) {
        let salter = KeySalter::new(n).unwrap();
        let bucket = salter.bucket(&key);
        prop_assert!(bucket < n);

        let prefix = salter.salt(&key);
        prop_assert_eq!(prefix.len(), salter.width());
        prop_assert!(prefix.bytes().all(|b| b.is_ascii_digit()));

        let physical = salter.physical_key(&key);
        prop_assert_eq!(salter.parse(&physical), Some((bucket, key.as_slice())));
    }

    /// `N - 1` strictly increasing boundaries; every salted key lands in the
    /// partition of its bucket.
    #[test]
    fn prop_splits_ordered_and_aligned(key in arb_key(), n in arb_buckets()) {
        let salter = KeySalter::new(n).unwrap();
        let splits = SplitBoundary::for_salter(&salter);
        prop_assert_eq!(splits.len() as u32, n - 1);
        prop_assert!(splits.keys().windows(2).all(|w| w[0] < w[1]));

        let physical = salter.physical_key(&key);
        prop_assert_eq!(splits.partition_for(&physical), salter.bucket(&key) as usize);
    }

    /// Every key of a logical range, salted into any bucket, is covered by
    /// the plan; keys outside the range are not.
    #[test]
    fn prop_range_plan_complete(
        a in arb_key(),
        b in arb_key(),
        key in arb_key(),
        n in arb_buckets(),
        inclusive in any::<bool>(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let range = if inclusive {
            LogicalRange::inclusive(lo, hi)
        } else {
            LogicalRange::exclusive(lo, hi)
        };
        let salter = KeySalter::new(n).unwrap();
        let plan = RangeQueryPlanner::new(salter).plan(&range);
        prop_assert_eq!(plan.len() as u32, n);

        let physical = salter.physical_key(&key);
        let covered = plan.iter().any(|sub| sub.contains(&physical));
        prop_assert_eq!(covered, range.contains(&key));
    }
}

// Hashtable unit test suite (public API).
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Round-trip: the most recent value set for a key is what `get` returns.
// - Delete-then-lookup: a removed key is absent and `len` drops by one.
// - Resize transparency: growth never changes a lookup result.
// - Uniqueness: iteration never yields the same key twice.
// - Collision rate stays within [0, 100 * len].
use reloc_hashtable::{CapacityError, Hashtable};
use std::collections::HashSet;
use std::hash::{BuildHasher, Hasher};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const NAMES: [&str; 16] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
    "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen",
];

// Test: small named-key scenario starting at capacity 8.
// Assumes: growth happens transparently while filling 16 keys.
// Verifies: absent removal reports false, present removal true, values survive
// heavy deletion and the table keeps answering correctly.
#[test]
fn small_named_keys() {
    init_logging();
    let mut ht: Hashtable<String, i32> = Hashtable::with_capacity(8);
    for (i, name) in NAMES.iter().enumerate() {
        assert!(ht.set(name.to_string(), i as i32));
    }
    assert_eq!(ht.len(), 16);

    assert!(!ht.remove("Sixteen"));
    assert!(ht.remove("Eight"));
    assert_eq!(ht.len(), 15);
    assert!(ht.set("Sixteen".to_string(), 16));

    assert_eq!(ht.get("Five"), Some(&5));
    assert_eq!(ht.get("Eight"), None);
    assert_eq!(ht.get("Sixteen"), Some(&16));

    for name in [
        "Five", "Six", "Ten", "Twelve", "Thirteen", "Three", "Fifteen", "Fourteen", "Two", "One",
        "Zero",
    ] {
        assert!(ht.remove(name), "{name} must be present");
    }

    assert_eq!(ht.get("Four"), Some(&4));
    assert_eq!(ht.get("Ten"), None);
    assert_eq!(ht.len(), 5);
    let mut left: Vec<_> = ht.keys().map(String::as_str).collect();
    left.sort_unstable();
    assert_eq!(left, ["Eleven", "Four", "Nine", "Seven", "Sixteen"]);
}

// Test: round-trip with updates.
// Assumes: keys are distinct per round; later rounds overwrite.
// Verifies: every key reports its latest value and `len` counts distinct keys.
#[test]
fn round_trip_latest_value_wins() {
    let mut ht: Hashtable<u32, u32> = Hashtable::new();
    for round in 0..3 {
        for k in 0..1000 {
            let created = ht.set(k, k + round);
            assert_eq!(created, round == 0);
        }
    }
    assert_eq!(ht.len(), 1000);
    for k in 0..1000 {
        assert_eq!(ht.get(&k), Some(&(k + 2)));
    }
}

// Test: resize transparency across several growth steps.
// Assumes: the table starts at capacity 2 and grows 4x at 70% load.
// Verifies: after each growth, every previously inserted key is still found.
#[test]
fn resize_is_transparent() {
    init_logging();
    let mut ht: Hashtable<String, usize> = Hashtable::new();
    let mut growths = 0;
    for i in 0..5000 {
        let cap = ht.capacity();
        ht.set(format!("key-{i}"), i);
        if ht.capacity() != cap {
            growths += 1;
            assert_eq!(ht.capacity(), cap * 4);
            for j in 0..=i {
                assert_eq!(ht.get(format!("key-{j}").as_str()), Some(&j));
            }
        }
    }
    assert!(growths >= 5);
    assert!(ht.len() * 10 < ht.capacity() * 7);
}

// Test: delete-then-lookup over every key.
// Assumes: keys are removed in an order unrelated to storage order.
// Verifies: len drops by exactly one per present key; absent removals are no-ops.
#[test]
fn delete_then_lookup() {
    let mut ht: Hashtable<u64, u64> = (0..512).map(|k| (k, k * k)).collect();
    for k in (0..512).rev().step_by(2).chain((0..512).step_by(2)) {
        let before = ht.len();
        assert!(ht.remove(&k));
        assert_eq!(ht.len(), before - 1);
        assert_eq!(ht.get(&k), None);
        assert!(!ht.remove(&k));
        assert_eq!(ht.len(), before - 1);
    }
    assert!(ht.is_empty());
}

// Test: uniqueness under repeated set/remove churn.
// Assumes: the same small key set is reused many times.
// Verifies: scanning occupied slots never yields duplicate keys.
#[test]
fn no_duplicate_keys_after_churn() {
    let mut ht: Hashtable<u32, u32> = Hashtable::new();
    for round in 0..50u32 {
        for k in 0..64 {
            if (k + round) % 3 == 0 {
                ht.remove(&k);
            } else {
                ht.set(k, round);
            }
        }
        let keys: Vec<u32> = ht.keys().copied().collect();
        let unique: HashSet<u32> = keys.iter().copied().collect();
        assert_eq!(keys.len(), unique.len());
        assert_eq!(keys.len(), ht.len());
    }
}

// Test: collision-rate sanity for a fixed key distribution.
// Assumes: a hasher with only 16 distinct outputs forces relocations.
// Verifies: the rate is within [0, 100 * len] and grows with the collisions.
#[test]
fn collision_rate_sanity() {
    #[derive(Clone, Default)]
    struct Mod16;
    struct Mod16Hasher(u64);
    impl BuildHasher for Mod16 {
        type Hasher = Mod16Hasher;
        fn build_hasher(&self) -> Mod16Hasher {
            Mod16Hasher(0)
        }
    }
    impl Hasher for Mod16Hasher {
        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = self.0.wrapping_mul(31).wrapping_add(b as u64);
            }
        }
        fn finish(&self) -> u64 {
            self.0 % 16
        }
    }

    let mut ht: Hashtable<u32, (), Mod16> = Hashtable::with_hasher(Mod16);
    assert_eq!(ht.collision_rate(), 0);
    for k in 0..16 {
        ht.set(k, ());
    }
    let low = ht.collision_rate();
    for k in 16..400 {
        ht.set(k, ());
    }
    let high = ht.collision_rate();
    assert!(high <= 100 * ht.len());
    assert!(high > low);
    assert!(high >= 90, "at most 16 of 400 keys can sit at home, got {high}");
}

// Test: human-readable rendering.
// Assumes: storage order is unspecified.
// Verifies: empty renders "[]"; otherwise one "key: value" line per entry.
#[test]
fn display_lists_every_entry() {
    let mut ht: Hashtable<&str, u8> = Hashtable::new();
    assert_eq!(ht.to_string(), "[]");
    ht.set("x", 1);
    ht.set("y", 2);
    ht.set("z", 3);
    let s = ht.to_string();
    assert!(s.starts_with('[') && s.ends_with("\n]"), "{s}");
    let mut lines: Vec<&str> = s[1..s.len() - 2].split('\n').collect();
    lines.sort_unstable();
    assert_eq!(lines, ["x: 1", "y: 2", "z: 3"]);
}

// Test: std trait surface.
// Assumes: Index panics on an absent key like std's HashMap.
// Verifies: Index, Extend, get_mut, get_key_value and borrowed lookups.
#[test]
fn std_trait_surface() {
    let mut ht: Hashtable<String, Vec<u32>> = Hashtable::default();
    ht.extend([("a".to_string(), vec![1]), ("b".to_string(), vec![2])]);
    ht.get_mut("a").expect("present").push(10);
    assert_eq!(ht["a"], vec![1, 10]);
    assert_eq!(ht.get_key_value("b"), Some((&"b".to_string(), &vec![2])));

    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| ht["missing"].len()));
    assert!(res.is_err(), "indexing an absent key must panic");

    let cloned = ht.clone();
    assert_eq!(cloned, ht);
    let total: usize = (&ht).into_iter().map(|(_, v)| v.len()).sum();
    assert_eq!(total, 3);
}

// Test: capacity errors.
// Assumes: capacities are powers of two in usize.
// Verifies: overflowing requests surface CapacityError instead of allocating.
#[test]
fn capacity_overflow_is_reported() {
    let err = Hashtable::<u8, u8>::try_with_capacity(usize::MAX / 2 + 2).unwrap_err();
    assert_eq!(err, CapacityError::Overflow);
    assert_eq!(err.to_string(), "hashtable capacity overflow");

    let mut ht: Hashtable<u8, u8> = Hashtable::new();
    assert_eq!(ht.try_reserve(usize::MAX), Err(CapacityError::Overflow));
    assert_eq!(ht.try_reserve(10), Ok(()));
    assert!(ht.capacity() >= 16);
}

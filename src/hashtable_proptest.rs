#![cfg(test)]

// Property tests for Hashtable kept inside the crate so they can call the
// crate-private structural invariant checks after every step.

use crate::hashtable::Hashtable;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, i32),
    Insert(usize, i32),
    Remove(usize),
    Take(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Reserve(u8),
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<OpI>)> {
    (0usize..40, proptest::collection::vec("[a-z]{0,5}", 1..=24)).prop_flat_map(|(cap, pool)| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Set(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::Take),
            2 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => any::<u8>().prop_map(OpI::Reserve),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (cap, pool.clone(), ops))
    })
}

fn run_scenario<S>(
    mut sut: Hashtable<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<Key, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Set(i, v) => {
                let k = key_from(pool, i);
                let created = sut.set(k.clone(), v);
                let prev = model.insert(k, v);
                prop_assert_eq!(created, prev.is_none(), "set reports creation iff key was absent");
            }
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.insert(k.clone(), v), model.insert(k, v));
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                let before = sut.len();
                let removed = sut.remove(&k);
                prop_assert_eq!(removed, model.remove(&k).is_some());
                prop_assert_eq!(sut.len(), if removed { before - 1 } else { before });
                prop_assert!(sut.get(&k).is_none(), "removed key must be absent");
            }
            OpI::Take(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.take(k.0.as_str()), model.remove(&k));
            }
            OpI::Get(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Some(v), Some(mv)) => {
                        *v = v.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", s, m),
                }
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                prop_assert_eq!(sut.iter().count(), sut.len());
            }
            OpI::Reserve(n) => {
                let cap = sut.capacity();
                sut.reserve(n as usize);
                prop_assert!(sut.capacity() >= cap, "reserve never shrinks");
            }
        }

        // Post-conditions after each op
        sut.check_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.collision_rate() <= 100 * sut.len().max(1));
    }

    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `set` reports creation exactly when the key was absent; latest value wins.
// - `remove` shrinks `len` by one iff the key was present; the key is then absent.
// - Borrowed lookups (`&str` against `Key`) agree with owned lookups.
// - Structural invariants hold after every step, across resizes: every
//   entry reachable from its home bucket, no duplicate keys, `len` counts
//   occupied slots, load stays below 70%.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((cap, pool, ops) in arb_scenario()) {
        run_scenario(Hashtable::with_capacity(cap), &pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key shares one home bucket.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Few distinct hash values: keys collide on a handful of home buckets and
// their displacement chains interleave.
#[derive(Clone, Default)]
struct LowBitsBuildHasher;
struct LowBitsHasher(u64);
impl BuildHasher for LowBitsBuildHasher {
    type Hasher = LowBitsHasher;
    fn build_hasher(&self) -> Self::Hasher {
        LowBitsHasher(0)
    }
}
impl Hasher for LowBitsHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_add(b as u64);
        }
    }
    fn finish(&self) -> u64 {
        self.0 & 3
    }
}

// Property: Same state-machine invariants as above, under worst-case and
// near-worst-case collision behavior. This stresses relocation lists and
// delete-time compaction.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((cap, pool, ops) in arb_scenario()) {
        run_scenario(Hashtable::with_capacity_and_hasher(cap, ConstBuildHasher), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_clustered_hashes((cap, pool, ops) in arb_scenario()) {
        run_scenario(Hashtable::with_capacity_and_hasher(cap, LowBitsBuildHasher), &pool, ops)?;
    }
}

// Property: resize transparency. Inserting enough distinct keys to cross the
// load threshold several times never changes a lookup for earlier keys.
proptest! {
    #[test]
    fn prop_resize_transparency(keys in proptest::collection::hash_set(any::<u32>(), 1..400)) {
        let mut sut: Hashtable<u32, u64> = Hashtable::new();
        let keys: Vec<u32> = keys.into_iter().collect();
        for (n, &k) in keys.iter().enumerate() {
            let cap = sut.capacity();
            prop_assert!(sut.set(k, k as u64 * 3));
            if sut.capacity() != cap {
                for &earlier in &keys[..=n] {
                    prop_assert_eq!(sut.get(&earlier), Some(&(earlier as u64 * 3)));
                }
            }
        }
        sut.check_invariants();
        prop_assert_eq!(sut.len(), keys.len());
    }
}

//! Buckets: slot storage, relocation lists and the probe sequence.
//!
//! `Buckets` owns the fixed-capacity backing store of a `Hashtable`. It
//! knows nothing about hashing or growth policy; callers hand it a
//! precomputed hash and it resolves home buckets, probes for vacant slots,
//! and keeps every displaced entry reachable through the relocation list of
//! its home bucket.
//!
//! Structural invariants (checked by `check_invariants` in tests):
//! - An occupied slot `i` holding an entry with home `h` has `i == h` or
//!   `i` listed in `relocations[h]`.
//! - A slot index is listed in at most one relocation list, never in its
//!   own, and only while it holds an entry displaced from that home.
//! - `len` equals the number of occupied slots.

use core::borrow::Borrow;
use core::mem;

/// One live entry. The hash is computed once on insert and reused for every
/// later home-bucket computation, including during a resize.
#[derive(Clone, Debug)]
pub(crate) struct Slot<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

#[derive(Clone)]
pub(crate) struct Buckets<K, V> {
    // `Some` <=> occupied: the entry is constructed when the flag flips on
    // and dropped when it flips off.
    slots: Box<[Option<Slot<K, V>>]>,
    relocations: Box<[Vec<usize>]>,
    len: usize,
}

impl<K, V> Buckets<K, V> {
    /// Allocates `capacity` empty slots. `capacity` must be a power of two.
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            relocations: (0..capacity).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn home(&self, hash: u64) -> usize {
        (hash as usize) & (self.capacity() - 1)
    }

    #[inline]
    pub(crate) fn slot(&self, index: usize) -> Option<&Slot<K, V>> {
        self.slots[index].as_ref()
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Slot<K, V>> {
        self.slots[index].as_mut()
    }

    pub(crate) fn slots(&self) -> &[Option<Slot<K, V>>] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<Slot<K, V>>] {
        &mut self.slots
    }

    pub(crate) fn into_slots(self) -> Box<[Option<Slot<K, V>>]> {
        self.slots
    }

    /// Total number of displaced entries across all home buckets.
    pub(crate) fn relocated(&self) -> usize {
        self.relocations.iter().map(Vec::len).sum()
    }

    /// Walks the quadratic probe sequence `home, home+1, home+3, home+6, ...`
    /// and returns the first vacant slot with the number of steps taken.
    /// Triangular offsets cover every slot of a power-of-two table, so `None`
    /// means the table is full.
    fn probe_vacant(&self, home: usize) -> Option<(usize, usize)> {
        let mask = self.capacity() - 1;
        let mut index = home;
        for probe in 0..self.capacity() {
            if self.slots[index].is_none() {
                return Some((index, probe));
            }
            index = (index + probe + 1) & mask;
        }
        None
    }

    /// Places an entry whose key is known to be absent and returns its slot.
    ///
    /// Panics if no vacant slot exists; the growth policy keeps the load
    /// below capacity so this is an internal consistency fault.
    pub(crate) fn place(&mut self, slot: Slot<K, V>) -> usize {
        let home = self.home(slot.hash);
        let Some((index, probes)) = self.probe_vacant(home) else {
            panic!(
                "probe sequence exhausted: no vacant slot among {} buckets",
                self.capacity()
            );
        };
        if index != home {
            self.relocations[home].push(index);
            log::trace!("collision at bucket {home}: placed in {index} after {probes} probes");
        }
        self.slots[index] = Some(slot);
        self.len += 1;
        index
    }

    /// Returns the slot holding `q`, checking the home bucket first and then
    /// the home bucket's relocation list.
    pub(crate) fn find<Q>(&self, hash: u64, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let home = self.home(hash);
        // An empty home bucket proves absence: removal always back-fills it.
        let at_home = self.slots[home].as_ref()?;
        if at_home.hash == hash && at_home.key.borrow() == q {
            return Some(home);
        }
        self.relocations[home]
            .iter()
            .copied()
            .find(|&i| self.matches(i, hash, q))
    }

    /// Like `find`, but a match found through the relocation list is
    /// unlinked from that list before it is returned.
    fn find_detach<Q>(&mut self, hash: u64, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let home = self.home(hash);
        let at_home = self.slots[home].as_ref()?;
        if at_home.hash == hash && at_home.key.borrow() == q {
            return Some(home);
        }
        let pos = self.relocations[home]
            .iter()
            .position(|&i| self.matches(i, hash, q))?;
        Some(self.relocations[home].swap_remove(pos))
    }

    #[inline]
    fn matches<Q>(&self, index: usize, hash: u64, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.slots[index]
            .as_ref()
            .is_some_and(|s| s.hash == hash && s.key.borrow() == q)
    }

    /// Removes the entry holding `q` and back-fills the hole from the
    /// displacement chain so every remaining entry stays reachable.
    pub(crate) fn remove<Q>(&mut self, hash: u64, q: &Q) -> Option<Slot<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut hole = self.find_detach(hash, q)?;
        let removed = self.slots[hole].take()?;
        self.len -= 1;
        // Each entry listed under `hole` has `hole` as its home bucket, so
        // moving one in puts it at home and opens a new hole where it was.
        while let Some(from) = self.relocations[hole].pop() {
            self.slots[hole] = self.slots[from].take();
            hole = from;
        }
        Some(removed)
    }

    /// Drops every entry, keeping the allocation.
    pub(crate) fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        for list in self.relocations.iter_mut() {
            list.clear();
        }
        self.len = 0;
    }

    /// Moves every entry into a fresh store of `capacity` slots, recomputing
    /// homes from the stored hashes and rebuilding relocation lists.
    pub(crate) fn rehash(&mut self, capacity: usize) {
        debug_assert!(capacity >= self.len);
        let old = mem::replace(self, Buckets::new(capacity));
        for slot in old.slots.into_vec().into_iter().flatten() {
            self.place(slot);
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self)
    where
        K: Eq,
    {
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        assert_eq!(self.len, occupied, "len must count occupied slots");
        assert!(self.capacity().is_power_of_two());

        let mut listed = vec![None::<usize>; self.capacity()];
        for (home, list) in self.relocations.iter().enumerate() {
            for &i in list {
                assert_ne!(i, home, "relocation list {home} lists itself");
                assert!(listed[i].is_none(), "slot {i} listed twice");
                listed[i] = Some(home);
            }
        }
        for (i, slot) in self.slots.iter().enumerate() {
            match slot {
                Some(s) => {
                    let home = self.home(s.hash);
                    if home == i {
                        assert!(listed[i].is_none(), "slot {i} is at home but listed");
                    } else {
                        assert_eq!(listed[i], Some(home), "slot {i} unreachable from {home}");
                    }
                }
                None => assert!(listed[i].is_none(), "vacant slot {i} is listed"),
            }
        }

        let live: Vec<&Slot<K, V>> = self.slots.iter().flatten().collect();
        for (a, x) in live.iter().enumerate() {
            for y in &live[a + 1..] {
                assert!(!(x.hash == y.hash && x.key == y.key), "duplicate key");
            }
        }
    }
}

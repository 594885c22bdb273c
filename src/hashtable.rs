//! Hashtable: quadratic probing with per-bucket relocation lists.

use crate::buckets::{Buckets, Slot};
use crate::iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use core::ops::Index;
use std::collections::hash_map::RandomState;

/// Smallest capacity a table is ever created with.
pub const MIN_CAPACITY: usize = 2;

/// Growth factor applied when an insert reaches the load threshold.
pub const GROWTH_FACTOR: usize = 4;

/// Load threshold as `(numerator, denominator)`: the table grows once
/// `len >= capacity * 7 / 10`.
pub const LOAD_FACTOR: (usize, usize) = (7, 10);

#[inline]
fn load_threshold(capacity: usize) -> usize {
    let (num, den) = LOAD_FACTOR;
    capacity / den * num + capacity % den * num / den
}

fn normalize_capacity(requested: usize) -> Result<usize, CapacityError> {
    requested
        .max(MIN_CAPACITY)
        .checked_next_power_of_two()
        .ok_or(CapacityError::Overflow)
}

/// Error returned when a requested capacity cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    /// The capacity does not fit in `usize` as a power of two.
    Overflow,
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityError::Overflow => f.write_str("hashtable capacity overflow"),
        }
    }
}

impl std::error::Error for CapacityError {}

/// An open-addressed hash table.
///
/// A key lives either in its home bucket (`hash & (capacity - 1)`) or in a
/// slot recorded in the home bucket's relocation list. Lookups check the
/// home bucket and then scan that one list; they never walk a probe chain.
/// The table grows by 4x once it is 70% full and never shrinks.
///
/// This type performs no synchronization; see
/// [`SyncHashtable`](crate::SyncHashtable) for the locked variant.
#[derive(Clone)]
pub struct Hashtable<K, V, S = RandomState> {
    hasher: S,
    buckets: Buckets<K, V>,
}

impl<K, V> Hashtable<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Creates a table with at least `capacity` buckets, rounded up to a
    /// power of two.
    ///
    /// # Panics
    /// Panics if the rounded capacity overflows `usize`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }

    pub fn try_with_capacity(capacity: usize) -> Result<Self, CapacityError> {
        Self::try_with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, V> Default for Hashtable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Hashtable<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            buckets: Buckets::new(MIN_CAPACITY),
        }
    }

    /// # Panics
    /// Panics if the rounded capacity overflows `usize`.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        match Self::try_with_capacity_and_hasher(capacity, hasher) {
            Ok(table) => table,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self, CapacityError> {
        let capacity = normalize_capacity(capacity)?;
        Ok(Self {
            hasher,
            buckets: Buckets::new(capacity),
        })
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.len() == 0
    }

    /// Number of buckets; always a power of two.
    pub fn capacity(&self) -> usize {
        self.buckets.capacity()
    }

    /// Percentage of entries that live outside their home bucket:
    /// `relocated * 100 / len`, or 0 for an empty table.
    pub fn collision_rate(&self) -> usize {
        match self.len() {
            0 => 0,
            len => self.buckets.relocated() * 100 / len,
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.buckets.slots(), self.len())
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let len = self.len();
        IterMut::new(self.buckets.slots_mut(), len)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Visits every entry in storage order.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V),
    {
        for (k, v) in self.iter() {
            visit(k, v);
        }
    }

    pub fn for_each_key<F>(&self, visit: F)
    where
        F: FnMut(&K),
    {
        self.keys().for_each(visit);
    }

    pub fn for_each_value<F>(&self, visit: F)
    where
        F: FnMut(&V),
    {
        self.values().for_each(visit);
    }

    /// Drops every entry. Capacity is kept.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

impl<K, V, S> Hashtable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    #[inline]
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Inserts or updates. Returns `true` if a new entry was created and
    /// `false` if an existing value was overwritten.
    pub fn set(&mut self, key: K, value: V) -> bool {
        self.insert(key, value).is_none()
    }

    /// Inserts or updates, returning the previous value on update.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        if let Some(slot) = self
            .buckets
            .find(hash, &key)
            .and_then(|i| self.buckets.slot_mut(i))
        {
            return Some(mem::replace(&mut slot.value, value));
        }

        self.buckets.place(Slot { hash, key, value });
        if self.len() >= load_threshold(self.capacity()) {
            let target = self
                .capacity()
                .checked_mul(GROWTH_FACTOR)
                .unwrap_or_else(|| panic!("{}", CapacityError::Overflow));
            self.enlarge(target);
        }
        None
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let slot = self.buckets.slot(self.buckets.find(hash, q)?)?;
        Some((&slot.key, &slot.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let index = self.buckets.find(hash, q)?;
        self.buckets.slot_mut(index).map(|s| &mut s.value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buckets.find(self.make_hash(q), q).is_some()
    }

    /// Removes `q`. Returns `false` if it was not present.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).is_some()
    }

    /// Removes `q` and returns its value.
    pub fn take<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Removes `q` and returns the stored key and value. Displaced entries
    /// are moved back into the vacated chain; the table never shrinks.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.buckets.remove(hash, q).map(|s| (s.key, s.value))
    }

    /// Grows so that `additional` more entries fit without another resize.
    ///
    /// # Panics
    /// Panics if the required capacity overflows `usize`.
    pub fn reserve(&mut self, additional: usize) {
        if let Err(e) = self.try_reserve(additional) {
            panic!("{e}");
        }
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), CapacityError> {
        let needed = self
            .len()
            .checked_add(additional)
            .ok_or(CapacityError::Overflow)?;
        let mut capacity = self.capacity();
        while load_threshold(capacity) <= needed {
            capacity = capacity.checked_mul(2).ok_or(CapacityError::Overflow)?;
        }
        if capacity > self.capacity() {
            self.enlarge(capacity);
        }
        Ok(())
    }

    /// Rehashes every entry into at least `target` buckets (rounded up to a
    /// power of two). Homes come from the stored hashes; `K: Hash` is not
    /// called.
    fn enlarge(&mut self, target: usize) {
        let old = self.capacity();
        let capacity = match normalize_capacity(target.max(old)) {
            Ok(c) => c,
            Err(e) => panic!("{e}"),
        };
        log::debug!(
            "enlarging hashtable from {old} to {capacity} buckets ({} entries)",
            self.len()
        );
        self.buckets.rehash(capacity);
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.buckets.check_invariants();
        assert!(self.len() < load_threshold(self.capacity()), "missed a resize");
        for slot in self.buckets.slots().iter().flatten() {
            assert_eq!(slot.hash, self.make_hash(&slot.key), "stale stored hash");
        }
    }
}

impl<K, V, S> fmt::Debug for Hashtable<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Renders `[]` when empty, otherwise `[` followed by one `key: value` line
/// per entry in storage order and a closing `\n]`.
impl<K, V, S> fmt::Display for Hashtable<K, V, S>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("[]");
        }
        f.write_str("[")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("\n]")
    }
}

impl<K, V, S> PartialEq for Hashtable<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for Hashtable<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, Q, V, S> Index<&Q> for Hashtable<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    /// Panics if the key is not present.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("key not present in Hashtable"),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for Hashtable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        // Keys may repeat; only count on half the hint once populated.
        let hint = iter.size_hint().0;
        self.reserve(if self.is_empty() { hint } else { (hint + 1) / 2 });
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for Hashtable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = Self::with_hasher(S::default());
        table.extend(iter);
        table
    }
}

impl<K, V, S> IntoIterator for Hashtable<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        let len = self.len();
        IntoIter::new(self.buckets.into_slots(), len)
    }
}

impl<'a, K, V, S> IntoIterator for &'a Hashtable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut Hashtable<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

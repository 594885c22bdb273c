//! SyncHashtable: a `Hashtable` behind a single reader-writer lock.
//!
//! Mutators take the lock exclusively, readers take it shared, and every
//! guard is scoped to one call. Reads use `read_recursive` so a visitor may
//! look things up in the table it is visiting without queueing behind a
//! waiting writer.

use crate::hashtable::{CapacityError, Hashtable};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::hash_map::RandomState;

/// A thread-safe [`Hashtable`].
///
/// Chosen at construction instead of `Hashtable`; the two are never toggled
/// at runtime. Convert with `From<Hashtable>` and [`into_inner`].
///
/// Visitors passed to `for_each*` run under the read lock and must not
/// mutate the same table. Debug builds panic on such a call instead of
/// deadlocking.
///
/// [`into_inner`]: SyncHashtable::into_inner
pub struct SyncHashtable<K, V, S = RandomState> {
    table: RwLock<Hashtable<K, V, S>>,
    reentrancy: DebugReentrancy,
}

impl<K, V> SyncHashtable<K, V> {
    pub fn new() -> Self {
        Self::from(Hashtable::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from(Hashtable::with_capacity(capacity))
    }
}

impl<K, V> Default for SyncHashtable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> From<Hashtable<K, V, S>> for SyncHashtable<K, V, S> {
    fn from(table: Hashtable<K, V, S>) -> Self {
        Self {
            table: RwLock::new(table),
            reentrancy: DebugReentrancy::new(),
        }
    }
}

impl<K, V, S> SyncHashtable<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::from(Hashtable::with_hasher(hasher))
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::from(Hashtable::with_capacity_and_hasher(capacity, hasher))
    }

    pub fn into_inner(self) -> Hashtable<K, V, S> {
        self.table.into_inner()
    }

    /// Exclusive access without locking; the borrow proves no other thread
    /// holds the table.
    pub fn get_mut(&mut self) -> &mut Hashtable<K, V, S> {
        self.table.get_mut()
    }

    /// Shared guard for multi-step reads. Holding it blocks writers.
    pub fn read(&self) -> RwLockReadGuard<'_, Hashtable<K, V, S>> {
        self.table.read_recursive()
    }

    /// Exclusive guard for multi-step updates.
    ///
    /// # Panics
    /// In debug builds, panics when called from inside a visitor of this
    /// table.
    pub fn write(&self) -> RwLockWriteGuard<'_, Hashtable<K, V, S>> {
        self.reentrancy.assert_not_visiting();
        self.table.write()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.read().capacity()
    }

    /// Collision diagnostics. Takes `&mut self` and reads without locking,
    /// so callers must show the table is quiescent.
    pub fn collision_rate(&mut self) -> usize {
        self.table.get_mut().collision_rate()
    }

    /// Visits every entry under the read lock.
    pub fn for_each<F>(&self, visit: F)
    where
        F: FnMut(&K, &V),
    {
        let table = self.read();
        let _v = self.reentrancy.visit();
        table.for_each(visit);
    }

    pub fn for_each_key<F>(&self, visit: F)
    where
        F: FnMut(&K),
    {
        let table = self.read();
        let _v = self.reentrancy.visit();
        table.for_each_key(visit);
    }

    pub fn for_each_value<F>(&self, visit: F)
    where
        F: FnMut(&V),
    {
        let table = self.read();
        let _v = self.reentrancy.visit();
        table.for_each_value(visit);
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}

impl<K, V, S> SyncHashtable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts or updates; `true` if a new entry was created.
    pub fn set(&self, key: K, value: V) -> bool {
        self.write().set(key, value)
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.write().insert(key, value)
    }

    /// Returns a clone of the value for `q`.
    pub fn get<Q>(&self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.read().get(q).cloned()
    }

    /// Runs `f` on the value for `q` under the read lock.
    pub fn get_with<Q, R, F>(&self, q: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        self.read().get(q).map(f)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.read().contains_key(q)
    }

    pub fn remove<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.write().remove(q)
    }

    pub fn take<Q>(&self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.write().take(q)
    }

    pub fn remove_entry<Q>(&self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.write().remove_entry(q)
    }

    pub fn reserve(&self, additional: usize) {
        self.write().reserve(additional);
    }

    pub fn try_reserve(&self, additional: usize) -> Result<(), CapacityError> {
        self.write().try_reserve(additional)
    }
}

impl<K, V, S> fmt::Debug for SyncHashtable<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncHashtable")
            .field("table", &*self.read())
            .finish()
    }
}

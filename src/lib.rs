//! reloc-hashtable: an open-addressed hash table that remembers where
//! collided entries went.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: O(1) average insert/lookup/update/delete where a lookup touches
//!   the home bucket and, only on a collision, one short per-bucket list.
//! - Layers:
//!   - Buckets<K, V>: fixed-capacity slot store plus one relocation list
//!     per bucket; owns probing, placement and delete-time compaction.
//!   - Hashtable<K, V, S>: hashing, update-vs-insert, growth policy and the
//!     public map API. No synchronization.
//!   - SyncHashtable<K, V, S>: the same table behind one reader-writer lock.
//!
//! Placement
//! - A key's home bucket is `hash & (capacity - 1)`. If the home bucket is
//!   free the key goes there. Otherwise the key probes quadratically
//!   (`home, home+1, home+3, home+6, ...`) for a free slot and that slot is
//!   appended to the home bucket's relocation list.
//! - A home occupant is never evicted; only the newcomer moves.
//!
//! Lookup
//! - An empty home bucket proves absence. Otherwise compare the home
//!   occupant, then scan the home's relocation list. No probe chain is ever
//!   walked on lookup.
//!
//! Removal and compaction
//! - The removed slot is unlinked from its home's relocation list, then the
//!   hole is back-filled: while the hole's own relocation list is
//!   non-empty, pop an index, move that entry home into the hole, and
//!   continue with the slot it left. This keeps "empty home => absent"
//!   true without tombstones.
//!
//! Growth
//! - Once an insert brings `len` to 70% of capacity the table rehashes into
//!   4x the buckets. Deletes never shrink the table.
//! - Each entry stores its 64-bit hash; rehashing uses the stored hash and
//!   never calls `K: Hash` again.
//!
//! Concurrency
//! - `Hashtable` relies on `&mut self` for exclusive access and performs no
//!   locking at all.
//! - `SyncHashtable` takes a `parking_lot::RwLock` in write mode for
//!   mutators and in shared mode for reads and visits, for one call at a
//!   time. Visitors must not mutate the table they visit; debug builds
//!   detect this and panic instead of deadlocking.
//!
//! Notes and non-goals
//! - Iteration is in storage order; no ordering guarantees.
//! - No shrinking, persistence, or multi-key transactions.
//! - Probe exhaustion is an internal invariant violation and panics.
//! - Logging goes through the `log` facade: resizes at `debug`, probing
//!   collisions at `trace`.

mod buckets;
pub mod hashtable;
mod hashtable_proptest;
pub mod iter;
mod reentrancy;
pub mod sync;

// Public surface
pub use hashtable::{CapacityError, Hashtable};
pub use sync::SyncHashtable;

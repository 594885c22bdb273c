//! Debug-only reentrancy guard for visitor callbacks.
//!
//! `SyncHashtable` runs `for_each*` visitors while holding its read lock. A
//! visitor that calls a mutating method on the same table would block on
//! the write lock forever. In debug builds each visit registers the table
//! in a per-thread list and mutators panic when they find their table on
//! it. In release builds this compiles to a zero-cost no-op.

#[cfg(debug_assertions)]
use std::cell::RefCell;

#[cfg(debug_assertions)]
thread_local! {
    // Identities of the tables this thread is currently visiting.
    static VISITING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Per-instance visit tracker. Embed this in a locked structure; guard
/// visits with `let _v = self.reentrancy.visit();` and mutators with
/// `self.reentrancy.assert_not_visiting();` before taking the write lock.
#[derive(Debug, Default)]
pub struct DebugReentrancy {
    // Keeps the struct non-zero-sized so its address identifies the owner.
    _id: u8,
}

impl DebugReentrancy {
    pub const fn new() -> Self {
        Self { _id: 0 }
    }

    #[cfg(debug_assertions)]
    #[inline]
    fn id(&self) -> usize {
        self as *const Self as usize
    }

    /// Marks the owner as being visited on this thread until the returned
    /// guard drops.
    #[inline]
    pub fn visit(&self) -> VisitGuard<'_> {
        #[cfg(debug_assertions)]
        {
            VISITING.with(|v| v.borrow_mut().push(self.id()));
            VisitGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            VisitGuard {
                _z: core::marker::PhantomData,
            }
        }
    }

    /// In debug builds, panics if this thread is inside a visit of the
    /// owner.
    #[inline]
    pub fn assert_not_visiting(&self) {
        #[cfg(debug_assertions)]
        {
            let id = self.id();
            let nested = VISITING.with(|v| v.borrow().contains(&id));
            assert!(
                !nested,
                "reentrancy detected: mutation of a hashtable from inside its own visitor"
            );
        }
    }
}

/// RAII guard returned by `DebugReentrancy::visit`.
pub struct VisitGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: core::marker::PhantomData<&'a ()>,
}

impl Drop for VisitGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let id = self.owner.id();
            VISITING.with(|v| {
                let mut v = v.borrow_mut();
                if let Some(pos) = v.iter().rposition(|&x| x == id) {
                    v.swap_remove(pos);
                }
            });
        }
    }
}

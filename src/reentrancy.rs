//! Debug-only reentrancy detection for the table.
//!
//! `ChainedHashTable` calls into user code (`K: Eq`, `K: Hash`) while it
//! walks or relinks chains. A user impl that reaches back into the same
//! table from there would observe a half-updated chain, so debug builds
//! panic on nested entry. Release builds compile the check away.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table entry tracker. Public operations start with
/// `let _g = self.reentrancy.enter();`.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    depth: Cell<u32>,
    // Raw-pointer marker keeps the table !Send + !Sync.
    _single_threaded: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            depth: Cell::new(0),
            _single_threaded: PhantomData,
        }
    }

    /// Mark the start of a guarded operation. Panics in debug builds if an
    /// operation on the same table is already in progress.
    #[inline]
    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            let depth = self.depth.get();
            assert!(
                depth == 0,
                "reentrancy detected: table accessed from inside its own Eq/Hash callback"
            );
            self.depth.set(depth + 1);
            ReentrancyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ReentrancyGuard { _owner: PhantomData }
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

// A cloned table starts outside of any operation.
impl Clone for DebugReentrancy {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Leaves the guarded section on drop.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a ()>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let depth = self.owner.depth.get();
            debug_assert!(depth > 0);
            self.owner.depth.set(depth - 1);
        }
    }
}

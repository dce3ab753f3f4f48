//! Debug-only probe guard.
//!
//! The entry table calls user code (the projection, `K: Hash`, `K: Eq`)
//! while its index and arena can disagree for a moment. A second entry
//! into the same table from that user code would observe the broken
//! state, so debug builds panic on it. Release builds keep a zero-sized
//! guard and check nothing.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table probe tracker. Each guarded method starts with
/// `let _probe = self.guard.enter();`.
#[derive(Debug)]
pub(crate) struct ProbeGuard {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    // !Sync in every build profile, not only when the Cell is present.
    _unsync: PhantomData<Cell<()>>,
}

impl ProbeGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            _unsync: PhantomData,
        }
    }

    /// Marks the table as busy until the returned token is dropped.
    #[inline]
    pub(crate) fn enter(&self) -> ProbeToken<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "entry table re-entered from a projection, Hash or Eq call"
            );
            ProbeToken { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ProbeToken { _owner: PhantomData }
        }
    }

    #[cfg(all(test, debug_assertions))]
    pub(crate) fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Default for ProbeGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the busy flag on drop, including during unwinding.
pub(crate) struct ProbeToken<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ProbeGuard,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a ProbeGuard>,
}

impl Drop for ProbeToken<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(false);
    }
}

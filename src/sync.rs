//! SyncEquivalenceStore: one coarse lock around an `EquivalenceStore`.
//!
//! The inner store is `!Sync` (its probe guard is a `Cell`), so a
//! `RwLock` could not hand out concurrent readers anyway. Every operation,
//! reads included, takes the same `Mutex`.

use crate::config::StoreConfig;
use crate::entry_table::EntryId;
use crate::store::{Admission, EquivalenceStore};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use parking_lot::{Mutex, MutexGuard};
use std::collections::hash_map::RandomState;

pub struct SyncEquivalenceStore<T, K, P = fn(&T) -> K, S = RandomState> {
    inner: Mutex<EquivalenceStore<T, K, P, S>>,
}

impl<T, K, P> SyncEquivalenceStore<T, K, P>
where
    K: Eq + Hash,
    P: Fn(&T) -> K,
{
    pub fn new(project: P) -> Self {
        Self::from_store(EquivalenceStore::new(project))
    }

    pub fn with_config(project: P, config: StoreConfig) -> Self {
        Self::from_store(EquivalenceStore::with_config(project, config))
    }
}

impl<T, K, P, S> SyncEquivalenceStore<T, K, P, S>
where
    K: Eq + Hash,
    P: Fn(&T) -> K,
    S: BuildHasher,
{
    pub fn from_store(store: EquivalenceStore<T, K, P, S>) -> Self {
        Self {
            inner: Mutex::new(store),
        }
    }

    pub fn into_inner(self) -> EquivalenceStore<T, K, P, S> {
        self.inner.into_inner()
    }

    /// Holds the lock for a sequence of operations that must not interleave
    /// with other threads.
    pub fn lock(&self) -> MutexGuard<'_, EquivalenceStore<T, K, P, S>> {
        self.inner.lock()
    }

    /// See [`EquivalenceStore::offer`]. The outcome is owned because the
    /// lock is released before returning.
    pub fn insert(&self, value: T) -> Admission<T> {
        self.inner.lock().offer(value)
    }

    pub fn replace(&self, value: T) -> Option<T> {
        self.inner.lock().replace(value)
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<T>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().remove(key)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.inner.lock().contains(value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().contains_key(key)
    }

    pub fn find<Q>(&self, key: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().find(key)
    }

    /// Runs `f` on the representative of `key` while the lock is held.
    pub fn read<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&T) -> R,
    {
        self.inner.lock().get(key).map(f)
    }

    pub fn get_cloned<Q>(&self, key: &Q) -> Option<T>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        T: Clone,
    {
        self.read(key, T::clone)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

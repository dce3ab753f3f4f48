//! EquivalenceStore: public layer. Projects each element to its key and
//! applies the duplicate policy on top of `EntryTable`.

use crate::config::{DuplicatePolicy, StoreConfig};
use crate::entry_table::{
    DrainEntries, Entries, EntryId, EntryTable, InsertError, IntoEntries, Occupied,
};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;
use tracing::trace;

/// Result of [`EquivalenceStore::insert`].
#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome<'a, T> {
    /// No equal key was stored; the value is now the representative.
    Inserted(EntryId),
    /// First-wins policy: an equal key was stored. The incoming value was
    /// dropped and this is the representative that stayed.
    Rejected(&'a T),
    /// Last-wins policy: the previous representative was evicted and the
    /// incoming value stored under a fresh id.
    Replaced { id: EntryId, previous: T },
}

impl<T> InsertOutcome<'_, T> {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, InsertOutcome::Rejected(_))
    }

    /// Id of the entry that now represents the incoming value's class, when
    /// the incoming value was stored.
    pub fn stored_id(&self) -> Option<EntryId> {
        match self {
            InsertOutcome::Inserted(id) | InsertOutcome::Replaced { id, .. } => Some(*id),
            InsertOutcome::Rejected(_) => None,
        }
    }
}

/// Owned result of [`EquivalenceStore::offer`]. Unlike `InsertOutcome` it
/// does not borrow the store, and a rejected value is handed back.
#[derive(Debug, PartialEq, Eq)]
pub enum Admission<T> {
    Inserted(EntryId),
    Rejected { existing: EntryId, value: T },
    Replaced { id: EntryId, previous: T },
}

/// A set of `T` holding at most one element per projected key.
///
/// Two elements are equivalent when `project` maps them to equal keys;
/// fields the projection ignores play no part in hashing or equality.
/// The key is computed once on insert and stored next to the element.
///
/// `project` must be pure: it has to return equal keys for an element
/// every time it is called. A projection that does not is a caller bug the
/// store cannot detect; lookups may then miss stored elements.
pub struct EquivalenceStore<T, K, P = fn(&T) -> K, S = RandomState> {
    project: P,
    policy: DuplicatePolicy,
    table: EntryTable<K, T, S>,
}

impl<T, K, P> EquivalenceStore<T, K, P>
where
    K: Eq + Hash,
    P: Fn(&T) -> K,
{
    pub fn new(project: P) -> Self {
        Self::with_config(project, StoreConfig::default())
    }

    pub fn with_config(project: P, config: StoreConfig) -> Self {
        Self::with_config_and_hasher(project, config, RandomState::new())
    }

    /// Builds a first-wins store from `iter`.
    pub fn from_iter_with<I>(project: P, iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut store = Self::new(project);
        store.extend(iter);
        store
    }
}

impl<T, K, P, S> EquivalenceStore<T, K, P, S>
where
    K: Eq + Hash,
    P: Fn(&T) -> K,
    S: BuildHasher,
{
    pub fn with_hasher(project: P, hasher: S) -> Self {
        Self::with_config_and_hasher(project, StoreConfig::default(), hasher)
    }

    pub fn with_config_and_hasher(project: P, config: StoreConfig, hasher: S) -> Self {
        Self {
            project,
            policy: config.policy,
            table: EntryTable::with_capacity_and_hasher(config.initial_capacity, hasher),
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn hasher(&self) -> &S {
        self.table.hasher()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Stores `value` unless its key is already represented; what happens
    /// then depends on the configured [`DuplicatePolicy`].
    pub fn insert(&mut self, value: T) -> InsertOutcome<'_, T> {
        match self.offer(value) {
            Admission::Inserted(id) => InsertOutcome::Inserted(id),
            Admission::Replaced { id, previous } => InsertOutcome::Replaced { id, previous },
            Admission::Rejected { existing, value } => {
                drop(value);
                match self.table.get(existing) {
                    Some(stored) => InsertOutcome::Rejected(stored),
                    None => unreachable!("rejecting entry {existing:?} missing from arena"),
                }
            }
        }
    }

    /// Same policy as [`insert`](Self::insert), but a rejected value comes
    /// back to the caller instead of being dropped.
    pub fn offer(&mut self, value: T) -> Admission<T> {
        let key = (self.project)(&value);
        match self.policy {
            DuplicatePolicy::FirstWins => match self.table.insert(key, value) {
                Ok(id) => Admission::Inserted(id),
                Err(Occupied { existing, value }) => {
                    trace!(?existing, policy = ?self.policy, "rejected element with duplicate key");
                    Admission::Rejected { existing, value }
                }
            },
            DuplicatePolicy::LastWins => self.store_replacing(key, value),
        }
    }

    /// Stores `value`, evicting any representative with an equal key,
    /// whatever the configured policy.
    pub fn replace(&mut self, value: T) -> Option<T> {
        let key = (self.project)(&value);
        match self.store_replacing(key, value) {
            Admission::Replaced { previous, .. } => Some(previous),
            _ => None,
        }
    }

    fn store_replacing(&mut self, key: K, value: T) -> Admission<T> {
        match self.table.replace(key, value) {
            (id, Some(previous)) => {
                trace!(?id, policy = ?self.policy, "replaced representative with duplicate key");
                Admission::Replaced { id, previous }
            }
            (id, None) => Admission::Inserted(id),
        }
    }

    /// Stores the value built by `make` under `key` if `key` is vacant.
    /// `make` does not run for an occupied key, and the policy is not
    /// consulted: an occupied key is always an error here.
    ///
    /// `project(&make())` must equal `key`; debug builds assert it.
    pub fn insert_with<F>(&mut self, key: K, make: F) -> Result<EntryId, InsertError>
    where
        F: FnOnce() -> T,
    {
        let id = self.table.insert_with(key, make)?;
        debug_assert!(
            self.table.get(id).map(|v| (self.project)(v)).as_ref() == self.table.key(id),
            "insert_with: constructed value projects to a different key"
        );
        Ok(id)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.table.contains_key(&(self.project)(value))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains_key(key)
    }

    /// The representative of `key`'s equivalence class.
    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.find(key).and_then(|id| self.table.get(id))
    }

    /// Id of the representative of `key`'s equivalence class.
    pub fn find<Q>(&self, key: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.find(key)
    }

    pub fn get_by_id(&self, id: EntryId) -> Option<&T> {
        self.table.get(id)
    }

    /// The key computed for `id` when it was inserted.
    pub fn key_of(&self, id: EntryId) -> Option<&K> {
        self.table.key(id)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<T>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (id, _key, value) = self.table.remove_key(key)?;
        trace!(?id, "removed representative");
        Some(value)
    }

    pub fn remove_by_id(&mut self, id: EntryId) -> Option<T> {
        let (_key, value) = self.table.remove(id)?;
        trace!(?id, "removed representative by id");
        Some(value)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.table.len();
        self.table.retain(|_, v| keep(v));
        let removed = before - self.table.len();
        if removed > 0 {
            trace!(removed, "retain dropped representatives");
        }
    }

    pub fn clear(&mut self) {
        trace!(removed = self.table.len(), "cleared store");
        self.table.clear();
    }

    /// Empties the store up front; the returned iterator owns the drained
    /// representatives, so leaking it still leaves the store empty.
    pub fn drain(&mut self) -> Drain<'_, K, T> {
        trace!(removed = self.table.len(), "draining store");
        Drain {
            it: self.table.drain(),
        }
    }
}

impl<T, K, P, S> EquivalenceStore<T, K, P, S> {
    /// Representatives in arena order. Neither insertion order nor a
    /// stable order across mutations; each call walks current contents.
    pub fn iter(&self) -> Iter<'_, K, T> {
        Iter {
            it: self.table.iter(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, T> {
        Keys {
            it: self.table.iter(),
        }
    }

    /// `(id, key, representative)` triples in arena order.
    pub fn entries(&self) -> Entries<'_, K, T> {
        self.table.iter()
    }
}

pub struct Iter<'a, K, T> {
    it: Entries<'a, K, T>,
}

impl<'a, K, T> Iterator for Iter<'a, K, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, _, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

pub struct Keys<'a, K, T> {
    it: Entries<'a, K, T>,
}

impl<'a, K, T> Iterator for Keys<'a, K, T> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

pub struct Drain<'a, K, T> {
    it: DrainEntries<'a, K, T>,
}

impl<K, T> Iterator for Drain<'_, K, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

pub struct IntoIter<K, T> {
    it: IntoEntries<K, T>,
}

impl<K, T> Iterator for IntoIter<K, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, T, K, P, S> IntoIterator for &'a EquivalenceStore<T, K, P, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, K, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, K, P, S> IntoIterator for EquivalenceStore<T, K, P, S> {
    type Item = T;
    type IntoIter = IntoIter<K, T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            it: self.table.into_entries(),
        }
    }
}

/// Offers every element in turn under the configured policy.
impl<T, K, P, S> Extend<T> for EquivalenceStore<T, K, P, S>
where
    K: Eq + Hash,
    P: Fn(&T) -> K,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.offer(value);
        }
    }
}

impl<T, K, P, S> fmt::Debug for EquivalenceStore<T, K, P, S>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

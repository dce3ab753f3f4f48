//! EntryTable: structural layer. Owns `(key, value, hash)` entries in a
//! generational arena and indexes them by hash for O(1) average lookup.

use crate::guard::ProbeGuard;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use hashbrown::hash_table::Entry as IndexEntry;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use thiserror::Error;

/// Stable identifier of one stored entry.
///
/// Valid until that entry is removed or replaced. Ids are generational: an
/// id that has gone stale never resolves to an entry inserted later, even
/// when the arena reuses the slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EntryId(DefaultKey);

#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum InsertError {
    #[error("an entry with an equal key is already stored as {existing:?}")]
    DuplicateKey { existing: EntryId },
}

/// A rejected insert: the stored entry's id plus the caller's value.
#[derive(Debug)]
pub(crate) struct Occupied<T> {
    pub(crate) existing: EntryId,
    pub(crate) value: T,
}

#[derive(Debug)]
struct Entry<K, T> {
    key: K,
    value: T,
    hash: u64,
}

pub(crate) struct EntryTable<K, T, S> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<K, T>>,
    guard: ProbeGuard,
}

/// Iterator over `(id, key, value)` in arena order.
pub struct Entries<'a, K, T> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry<K, T>>,
}

impl<'a, K, T> Iterator for Entries<'a, K, T> {
    type Item = (EntryId, &'a K, &'a T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(id, e)| (EntryId(id), &e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Owning iterator over `(key, value)`.
pub struct IntoEntries<K, T> {
    it: slotmap::basic::IntoIter<DefaultKey, Entry<K, T>>,
}

impl<K, T> Iterator for IntoEntries<K, T> {
    type Item = (K, T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (e.key, e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Draining iterator over `(key, value)`. The table is already empty when
/// this is handed out, so leaking it cannot leave unindexed entries behind.
pub struct DrainEntries<'a, K, T> {
    it: std::vec::IntoIter<(K, T)>,
    _table: PhantomData<&'a mut ()>,
}

impl<K, T> Iterator for DrainEntries<'_, K, T> {
    type Item = (K, T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, T, S> EntryTable<K, T, S> {
    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn get(&self, id: EntryId) -> Option<&T> {
        self.slots.get(id.0).map(|e| &e.value)
    }

    pub(crate) fn key(&self, id: EntryId) -> Option<&K> {
        self.slots.get(id.0).map(|e| &e.key)
    }

    pub(crate) fn iter(&self) -> Entries<'_, K, T> {
        Entries {
            it: self.slots.iter(),
        }
    }

    pub(crate) fn into_entries(self) -> IntoEntries<K, T> {
        IntoEntries {
            it: self.slots.into_iter(),
        }
    }
}

impl<K, T, S> EntryTable<K, T, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::with_capacity(capacity),
            slots: SlotMap::with_capacity_and_key(capacity),
            guard: ProbeGuard::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub(crate) fn capacity(&self) -> usize {
        self.index.capacity().min(self.slots.capacity())
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        let _probe = self.guard.enter();
        let slots = &self.slots;
        self.index.reserve(additional, |&id| {
            slots.get(id).map(|e| e.hash).unwrap_or(0)
        });
        self.slots.reserve(additional);
    }

    pub(crate) fn find<Q>(&self, q: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _probe = self.guard.enter();
        let hash = self.make_hash(q);
        self.index
            .find(hash, |&id| {
                self.slots
                    .get(id)
                    .map(|e| e.hash == hash && e.key.borrow() == q)
                    .unwrap_or(false)
            })
            .map(|&id| EntryId(id))
    }

    pub(crate) fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// On a duplicate, hands `value` back untouched.
    pub(crate) fn insert(&mut self, key: K, value: T) -> Result<EntryId, Occupied<T>> {
        let _probe = self.guard.enter();
        let hash = self.make_hash(&key);
        match self.index.entry(
            hash,
            |&id| {
                self.slots
                    .get(id)
                    .map(|e| e.hash == hash && e.key == key)
                    .unwrap_or(false)
            },
            |&id| self.slots.get(id).map(|e| e.hash).unwrap_or(0),
        ) {
            IndexEntry::Occupied(occ) => Err(Occupied {
                existing: EntryId(*occ.get()),
                value,
            }),
            IndexEntry::Vacant(v) => {
                let id = self.slots.insert(Entry { key, value, hash });
                v.insert(id);
                Ok(EntryId(id))
            }
        }
    }

    /// Runs `make` only when `key` is vacant.
    pub(crate) fn insert_with<F>(&mut self, key: K, make: F) -> Result<EntryId, InsertError>
    where
        F: FnOnce() -> T,
    {
        let _probe = self.guard.enter();
        let hash = self.make_hash(&key);
        match self.index.entry(
            hash,
            |&id| {
                self.slots
                    .get(id)
                    .map(|e| e.hash == hash && e.key == key)
                    .unwrap_or(false)
            },
            |&id| self.slots.get(id).map(|e| e.hash).unwrap_or(0),
        ) {
            IndexEntry::Occupied(occ) => Err(InsertError::DuplicateKey {
                existing: EntryId(*occ.get()),
            }),
            IndexEntry::Vacant(v) => {
                let value = make();
                let id = self.slots.insert(Entry { key, value, hash });
                v.insert(id);
                Ok(EntryId(id))
            }
        }
    }

    /// Stores `(key, value)` as a fresh entry. An entry with an equal key is
    /// unlinked and its value returned; its id goes stale.
    pub(crate) fn replace(&mut self, key: K, value: T) -> (EntryId, Option<T>) {
        let (id, evicted) = {
            let _probe = self.guard.enter();
            let hash = self.make_hash(&key);
            match self.index.entry(
                hash,
                |&id| {
                    self.slots
                        .get(id)
                        .map(|e| e.hash == hash && e.key == key)
                        .unwrap_or(false)
                },
                |&id| self.slots.get(id).map(|e| e.hash).unwrap_or(0),
            ) {
                IndexEntry::Occupied(mut occ) => {
                    let old = *occ.get();
                    // Insert before removing so the new id never reuses the old slot.
                    let id = self.slots.insert(Entry { key, value, hash });
                    *occ.get_mut() = id;
                    (id, self.slots.remove(old))
                }
                IndexEntry::Vacant(v) => {
                    let id = self.slots.insert(Entry { key, value, hash });
                    v.insert(id);
                    (id, None)
                }
            }
        };
        // Evicted key and value drop outside the probe window.
        (EntryId(id), evicted.map(|e| e.value))
    }

    pub(crate) fn remove(&mut self, id: EntryId) -> Option<(K, T)> {
        let entry = {
            let _probe = self.guard.enter();
            let entry = self.slots.remove(id.0)?;
            if let Ok(occ) = self.index.find_entry(entry.hash, |&other| other == id.0) {
                occ.remove();
            }
            entry
        };
        Some((entry.key, entry.value))
    }

    pub(crate) fn remove_key<Q>(&mut self, q: &Q) -> Option<(EntryId, K, T)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.find(q)?;
        self.remove(id).map(|(k, v)| (id, k, v))
    }

    /// Keeps entries for which `keep` returns true. Visits entries in index
    /// order; each dropped entry leaves arena and index together.
    pub(crate) fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &T) -> bool,
    {
        let _probe = self.guard.enter();
        let slots = &mut self.slots;
        self.index.retain(|&mut id| {
            let kept = slots.get(id).map(|e| keep(&e.key, &e.value)).unwrap_or(false);
            if !kept {
                slots.remove(id);
            }
            kept
        });
    }

    pub(crate) fn clear(&mut self) {
        let _probe = self.guard.enter();
        self.index.clear();
        self.slots.clear();
    }

    /// Empties the table before returning. The arena keeps its slot
    /// generations, so ids issued before the drain stay stale afterward.
    pub(crate) fn drain(&mut self) -> DrainEntries<'_, K, T> {
        let drained: Vec<(K, T)> = {
            let _probe = self.guard.enter();
            self.index.clear();
            self.slots.drain().map(|(_, e)| (e.key, e.value)).collect()
        };
        DrainEntries {
            it: drained.into_iter(),
            _table: PhantomData,
        }
    }
}

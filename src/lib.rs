//! equiv-store: a set that keeps one element per equivalence class, where
//! the class is decided by a caller-supplied key projection instead of the
//! element's own `Eq`/`Hash`.
//!
//! ```
//! use equiv_store::{EquivalenceStore, InsertOutcome};
//!
//! struct House {
//!     number: u32,
//!     bedrooms: u32,
//! }
//!
//! let mut houses = EquivalenceStore::new(|h: &House| h.number);
//! houses.insert(House { number: 123, bedrooms: 2 });
//! let again = houses.insert(House { number: 123, bedrooms: 3 });
//! assert!(matches!(again, InsertOutcome::Rejected(h) if h.bedrooms == 2));
//! assert_eq!(houses.len(), 1);
//! ```
//!
//! Internal Design:
//!
//! Layers
//! - EntryTable<K, T, S>: structural table. Entries live in a generational
//!   `SlotMap`; a `hashbrown::HashTable` of slot ids indexes them by hash.
//!   Returns stable `EntryId`s and rejects duplicate keys. Knows nothing
//!   about projections.
//! - EquivalenceStore<T, K, P, S>: public API. Projects each element with
//!   `P: Fn(&T) -> K`, applies the `DuplicatePolicy`, and reports what
//!   happened through `InsertOutcome` / `Admission`.
//! - SyncEquivalenceStore: the same store behind one `parking_lot::Mutex`.
//!
//! Equivalence contract
//! - Hashing and equality only ever see the projected key. Two elements
//!   that differ only in fields the projection ignores are the same class.
//! - Colliding hashes are told apart by `K: Eq`; each entry also keeps its
//!   `u64` hash, and probes compare it before calling `K: Eq`.
//! - The projection must be pure. An impure projection is a caller bug the
//!   store does not try to detect.
//!
//! Key and hash caching
//! - The key and its hash are computed once, on insert, and stored in the
//!   entry. Growth rehashes from the stored hash, so neither the
//!   projection nor `K: Hash` runs again for a stored element.
//!
//! Duplicate policy
//! - FirstWins (default): the stored representative stays; the incoming
//!   value is dropped (`insert`) or handed back (`offer`).
//! - LastWins: the stored representative is evicted and the incoming value
//!   stored as a fresh entry with a new `EntryId`. Entries are never
//!   updated in place.
//!
//! Reentrancy
//! - EntryTable runs user code (`K: Hash`, `K: Eq`) while its index and
//!   arena may disagree. A debug-only probe guard panics on nested entry.
//!   Release builds carry a zero-sized guard.
//!
//! Threading
//! - EquivalenceStore is `Send` when its parts are, and `!Sync` in every
//!   build profile. Share it through `SyncEquivalenceStore` or your own lock.
//!
//! Notes and non-goals
//! - Iteration follows arena order, not insertion order.
//! - No mutable access to stored elements; replace them instead.
//! - Elements themselves are never serialized. The `serde` feature covers
//!   `StoreConfig` only.

mod config;
mod entry_table;
#[cfg(test)]
mod entry_table_proptest;
mod guard;
mod store;
mod sync;

// Public surface
pub use config::{DuplicatePolicy, StoreConfig};
pub use entry_table::{Entries, EntryId, InsertError};
pub use store::{Admission, Drain, EquivalenceStore, InsertOutcome, IntoIter, Iter, Keys};
pub use sync::SyncEquivalenceStore;

//! Key-to-element lookup table
//!
//! [`KeyIndex`] translates a key into the [`ElementKey`] of the element that
//! holds it, so the heap set can reach any element in O(1) before an
//! O(log n) repair. The index never owns elements, and it never stores keys
//! either: each slot is a bare handle, hashed and compared through the key
//! held by the arena element it points at.

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};

use hashbrown::hash_table::{self, HashTable};

use crate::storage::{ElementArena, ElementKey};

#[derive(Debug, Clone)]
pub(crate) struct KeyIndex<S> {
    table: HashTable<ElementKey>,
    hasher: S,
}

impl<S: BuildHasher> KeyIndex<S> {
    pub(crate) fn with_hasher(hasher: S) -> Self {
        Self {
            table: HashTable::new(),
            hasher,
        }
    }

    pub(crate) fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hasher,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.table.len()
    }

    /// Finds the handle whose element holds `key`
    ///
    /// Only handles that still resolve in `elements` can match.
    pub(crate) fn lookup<K, V, Q>(
        &self,
        elements: &ElementArena<K, V>,
        key: &Q,
    ) -> Option<ElementKey>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);
        self.table
            .find(hash, |&handle| holds_key(elements, handle, key))
            .copied()
    }

    /// Indexes `handle` under its element's key, which must not already be present
    pub(crate) fn insert<K: Hash, V>(&mut self, elements: &ElementArena<K, V>, handle: ElementKey) {
        let Some(element) = elements.get(handle) else {
            debug_assert!(false, "indexed a handle with no element");
            return;
        };
        let hasher = &self.hasher;
        let hash = hasher.hash_one(&element.key);
        self.table.insert_unique(hash, handle, |&other| {
            elements
                .get(other)
                .map_or(0, |element| hasher.hash_one(&element.key))
        });
    }

    /// Detaches the mapping for `key`, if any
    pub(crate) fn remove<K, V, Q>(
        &mut self,
        elements: &ElementArena<K, V>,
        key: &Q,
    ) -> Option<ElementKey>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);
        let entry = self
            .table
            .find_entry(hash, |&handle| holds_key(elements, handle, key))
            .ok()?;
        Some(entry.remove().0)
    }

    /// Detaches `handle`, found through its element's `key`
    ///
    /// Compares handles only, so the element may already have left the arena.
    pub(crate) fn remove_handle<Q: Hash + ?Sized>(&mut self, key: &Q, handle: ElementKey) -> bool {
        let hash = self.hasher.hash_one(key);
        match self.table.find_entry(hash, |&other| other == handle) {
            Ok(entry) => {
                entry.remove();
                true
            }
            Err(_) => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.table.clear();
    }
}

impl<S> KeyIndex<S> {
    pub(crate) fn iter(&self) -> hash_table::Iter<'_, ElementKey> {
        self.table.iter()
    }
}

fn holds_key<K, V, Q>(elements: &ElementArena<K, V>, handle: ElementKey, key: &Q) -> bool
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    elements
        .get(handle)
        .is_some_and(|element| <K as Borrow<Q>>::borrow(&element.key) == key)
}

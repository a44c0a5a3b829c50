//! Indexed priority queue
//!
//! [`HeapSet`] keeps key-value pairs reachable two ways at once: by key, through
//! a hash index, and by value order, through a binary min-heap. Every call
//! updates both views before it returns.
//!
//! One typical use is a set of jobs keyed by id and ordered by deadline, where
//! deadlines are re-scheduled while the jobs wait.
//!
//! # Time Complexity
//!
//! | Operation   | Complexity |
//! |-------------|------------|
//! | `set`       | O(log n)   |
//! | `get`       | O(1)       |
//! | `remove`    | O(log n)   |
//! | `update`    | O(log n)   |
//! | `top`       | O(1)       |
//! | `pop`       | O(log n)   |
//! | `len`       | O(1)       |
//!
//! # Example
//!
//! ```rust
//! use rust_heapset::HeapSet;
//!
//! let mut set = HeapSet::new(|a: &i32, b: &i32| a < b);
//! set.set(1, 5);
//! set.set(2, 3);
//! set.set(3, 8);
//! assert_eq!(set.top(), Some((&2, &3)));
//!
//! // Re-prioritise key 2
//! set.set(2, 10);
//! assert_eq!(set.top(), Some((&1, &5)));
//!
//! assert_eq!(set.pop(), Some((1, 5)));
//! assert_eq!(set.pop(), Some((3, 8)));
//! assert_eq!(set.pop(), Some((2, 10)));
//! assert_eq!(set.pop(), None);
//! ```

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, BuildHasherDefault, Hash};
use std::iter::FusedIterator;

use hashbrown::hash_table;
use log::{debug, trace};
use rustc_hash::FxHasher;

use crate::heap::OrderingHeap;
use crate::index::KeyIndex;
use crate::storage::{Element, ElementArena, ElementKey};
use crate::traits::{Compare, HeapSetError, Natural};

/// A key-value store ordered by value
///
/// Values are ordered by the comparator `C`; the pair whose value orders
/// first is available from [`top`](HeapSet::top) and [`pop`](HeapSet::pop).
/// Keys are unique and hashed with `S`.
///
/// Large or composite values can be mutated in place with
/// [`update`](HeapSet::update) instead of being replaced with `set`.
///
/// The set does no internal locking. Wrap it in a `Mutex` to share it between
/// threads.
#[derive(Clone)]
pub struct HeapSet<K, V, C = Natural, S = RandomState> {
    heap: OrderingHeap<K, V, C>,
    index: KeyIndex<S>,
}

/// A [`HeapSet`] hashing keys with `FxHasher`
///
/// Faster than the default hasher, but not resistant to HashDoS. Use it for
/// keys that do not come from untrusted input.
pub type FxHeapSet<K, V, C = Natural> = HeapSet<K, V, C, BuildHasherDefault<FxHasher>>;

impl<K, V, C> HeapSet<K, V, C, RandomState>
where
    K: Hash + Eq,
    C: Compare<V>,
{
    /// Creates an empty set ordered by `less`
    pub fn new(less: C) -> Self {
        Self::with_hasher(less, RandomState::new())
    }

    /// Creates an empty set with room for `capacity` pairs
    pub fn with_capacity(capacity: usize, less: C) -> Self {
        Self::with_capacity_and_hasher(capacity, less, RandomState::new())
    }
}

impl<K, V, C, S> HeapSet<K, V, C, S>
where
    K: Hash + Eq,
    C: Compare<V>,
    S: BuildHasher,
{
    /// Creates an empty set ordered by `less`, hashing keys with `hasher`
    pub fn with_hasher(less: C, hasher: S) -> Self {
        Self {
            heap: OrderingHeap::new(less),
            index: KeyIndex::with_hasher(hasher),
        }
    }

    /// Creates an empty set with room for `capacity` pairs
    pub fn with_capacity_and_hasher(capacity: usize, less: C, hasher: S) -> Self {
        Self {
            heap: OrderingHeap::with_capacity(capacity, less),
            index: KeyIndex::with_capacity_and_hasher(capacity, hasher),
        }
    }

    /// Returns the number of pairs in the set
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if the set holds no pairs
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Inserts a pair, or replaces the value of an existing key
    ///
    /// Returns the replaced value, or `None` if the key was new. Either way
    /// the pair is at its correct place in value order when this returns.
    ///
    /// # Time Complexity
    /// O(log n)
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        // `lookup` only yields handles that resolve in the arena
        let found = self.index.lookup(self.heap.arena(), &key);
        if let Some(element) = found.and_then(|handle| self.heap.element_mut(handle)) {
            let previous = std::mem::replace(&mut element.value, value);
            let position = element.position;
            self.heap.fix(position);
            trace!("updated value in slot {}", position);
            return Some(previous);
        }

        let handle = self.heap.push(key, value);
        self.index.insert(self.heap.arena(), handle);
        trace!("inserted new key, {} pairs stored", self.heap.len());
        None
    }

    /// Returns the value stored for `key`
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.lookup(self.heap.arena(), key)?;
        self.heap.element(handle).map(|element| &element.value)
    }

    /// Returns the stored key and value for `key`
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.lookup(self.heap.arena(), key)?;
        self.heap
            .element(handle)
            .map(|element| (&element.key, &element.value))
    }

    /// Returns true if `key` is present
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.lookup(self.heap.arena(), key).is_some()
    }

    /// Mutates the value for `key` in place, then restores value order
    ///
    /// # Errors
    /// Returns [`HeapSetError::KeyNotFound`] if the key is absent; `f` is not
    /// called in that case.
    ///
    /// # Time Complexity
    /// O(log n)
    pub fn update<Q, F>(&mut self, key: &Q, f: F) -> Result<(), HeapSetError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&mut V),
    {
        let handle = self
            .index
            .lookup(self.heap.arena(), key)
            .ok_or(HeapSetError::KeyNotFound)?;
        let element = self
            .heap
            .element_mut(handle)
            .ok_or(HeapSetError::DanglingHandle)?;
        f(&mut element.value);
        let position = element.position;
        self.heap.fix(position);
        Ok(())
    }

    /// Removes `key` and returns its pair
    ///
    /// # Time Complexity
    /// O(log n)
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.remove(self.heap.arena(), key)?;
        let position = self.heap.element(handle)?.position;
        let last = self.heap.len() - 1;

        if position == last {
            // Nothing else moves, and `position` no longer exists to fix
            trace!("removed element from last slot {}", position);
            return self.heap.pop_last().map(Element::into_pair);
        }

        self.heap.swap(position, last);
        let element = self.heap.pop_last()?;
        self.heap.fix(position);
        trace!("removed element from slot {}, refilled from slot {}", position, last);

        debug_assert!(element.is_detached());
        Some(element.into_pair())
    }

    /// Removes `key` if present
    pub fn delete<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove(key);
    }

    /// Returns the pair whose value orders first
    ///
    /// # Time Complexity
    /// O(1)
    pub fn top(&self) -> Option<(&K, &V)> {
        self.heap.peek().map(|element| (&element.key, &element.value))
    }

    /// Removes and returns the pair whose value orders first
    ///
    /// # Time Complexity
    /// O(log n)
    pub fn pop(&mut self) -> Option<(K, V)> {
        let handle = self.heap.handle_at(0)?;
        let element = self.heap.pop()?;
        self.index.remove_handle(&element.key, handle);
        Some(element.into_pair())
    }

    /// Removes every pair
    pub fn clear(&mut self) {
        self.index.clear();
        self.heap.clear();
    }

    /// Checks that the index and the heap agree
    ///
    /// Verifies that every element's recorded position is its array slot, that
    /// the index maps each key to exactly the element holding it, and that no
    /// element orders before its parent. A set that only ever changed through
    /// its own methods, with a consistent comparator, always passes.
    pub fn validate(&self) -> Result<(), HeapSetError> {
        let result = self.check_invariants();
        if let Err(err) = &result {
            debug!("heap set failed validation: {}", err);
        }
        result
    }

    fn check_invariants(&self) -> Result<(), HeapSetError> {
        let heap_len = self.heap.len();
        let index_len = self.index.len();
        if heap_len != index_len {
            return Err(HeapSetError::LengthMismatch {
                heap_len,
                index_len,
            });
        }
        if self.heap.stored() != heap_len {
            return Err(HeapSetError::DanglingHandle);
        }

        for position in 0..heap_len {
            let handle = self
                .heap
                .handle_at(position)
                .ok_or(HeapSetError::DanglingHandle)?;
            let element = self
                .heap
                .element(handle)
                .ok_or(HeapSetError::DanglingHandle)?;

            if element.position != position {
                return Err(HeapSetError::PositionMismatch {
                    position,
                    recorded: element.position,
                });
            }
            if self.index.lookup(self.heap.arena(), &element.key) != Some(handle) {
                return Err(HeapSetError::IndexMismatch { position });
            }
            if position > 0 && self.heap.less_at(position, (position - 1) / 2) {
                return Err(HeapSetError::HeapOrderViolated { position });
            }
        }

        Ok(())
    }

    /// Consumes the set, yielding pairs in value order
    pub fn into_sorted_iter(self) -> IntoSortedIter<K, V, C, S> {
        IntoSortedIter { set: self }
    }

    /// Consumes the set, returning pairs in value order
    pub fn into_sorted_vec(self) -> Vec<(K, V)> {
        self.into_sorted_iter().collect()
    }
}

impl<K, V, C, S> HeapSet<K, V, C, S> {
    /// Iterates over all pairs in no particular order
    ///
    /// The iterator borrows the set, so the set cannot change while it is live.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            entries: self.index.iter(),
            elements: self.heap.arena(),
        }
    }

    /// Iterates over all keys in no particular order
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Iterates over all values in no particular order
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V, C, S> Default for HeapSet<K, V, C, S>
where
    K: Hash + Eq,
    C: Compare<V> + Default,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(C::default(), S::default())
    }
}

impl<K, V, C, S> fmt::Debug for HeapSet<K, V, C, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C, S> Extend<(K, V)> for HeapSet<K, V, C, S>
where
    K: Hash + Eq,
    C: Compare<V>,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K, V, C, S> FromIterator<(K, V)> for HeapSet<K, V, C, S>
where
    K: Hash + Eq,
    C: Compare<V> + Default,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<'a, K, V, C, S> IntoIterator for &'a HeapSet<K, V, C, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the pairs of a [`HeapSet`], in no particular order
pub struct Iter<'a, K, V> {
    entries: hash_table::Iter<'a, ElementKey>,
    elements: &'a ElementArena<K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let &handle = self.entries.next()?;
        let element = &self.elements[handle];
        Some((&element.key, &element.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            entries: self.entries.clone(),
            elements: self.elements,
        }
    }
}

/// Iterator over the keys of a [`HeapSet`]
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator over the values of a [`HeapSet`]
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Consuming iterator that pops pairs in value order
pub struct IntoSortedIter<K, V, C, S> {
    set: HeapSet<K, V, C, S>,
}

impl<K, V, C, S> Iterator for IntoSortedIter<K, V, C, S>
where
    K: Hash + Eq,
    C: Compare<V>,
    S: BuildHasher,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.set.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.set.len();
        (len, Some(len))
    }
}

impl<K, V, C, S> ExactSizeIterator for IntoSortedIter<K, V, C, S>
where
    K: Hash + Eq,
    C: Compare<V>,
    S: BuildHasher,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{LessFn, Reversed};

    fn ascending() -> HeapSet<i32, i32, LessFn<i32>> {
        let less: LessFn<i32> = |a, b| a < b;
        HeapSet::new(less)
    }

    #[test]
    fn test_reprioritise_scenario() {
        let mut set = ascending();
        set.set(1, 5);
        set.set(2, 3);
        set.set(3, 8);
        assert_eq!(set.top(), Some((&2, &3)));

        set.set(2, 10);
        assert_eq!(set.top(), Some((&1, &5)));

        assert_eq!(set.pop(), Some((1, 5)));
        assert_eq!(set.len(), 2);
        assert_eq!(set.pop(), Some((3, 8)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.pop(), Some((2, 10)));
        assert_eq!(set.len(), 0);
        assert_eq!(set.pop(), None);
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_empty_set() {
        let mut set = ascending();
        assert!(set.is_empty());
        assert_eq!(set.top(), None);
        assert_eq!(set.pop(), None);
        assert_eq!(set.get(&1), None);
        set.delete(&1);
        assert_eq!(set.remove(&1), None);
        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_set_returns_previous_value() {
        let mut set = ascending();
        assert_eq!(set.set(7, 70), None);
        assert_eq!(set.set(7, 71), Some(70));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&7), Some(&71));
    }

    #[test]
    fn test_get_after_delete_and_pop() {
        let mut set = ascending();
        set.set(1, 1);
        set.set(2, 2);

        set.delete(&2);
        assert_eq!(set.get(&2), None);
        assert!(!set.contains_key(&2));

        assert_eq!(set.pop(), Some((1, 1)));
        assert_eq!(set.get(&1), None);
        assert!(set.is_empty());
    }

    #[test]
    fn test_remove_last_slot() {
        let mut set = ascending();
        for i in 0..7 {
            set.set(i, i);
        }
        // Ascending inserts never move, so key 6 sits in the last slot
        assert_eq!(set.remove(&6), Some((6, 6)));
        assert!(set.validate().is_ok());
        assert_eq!(set.len(), 6);
    }

    #[test]
    fn test_remove_refill_sifts_up() {
        let mut set = ascending();
        // Slots: 0:[0] 1:[10] 2:[1] 3:[11] 4:[12] 5:[2]
        for (k, v) in [(0, 0), (1, 10), (2, 1), (3, 11), (4, 12), (5, 2)] {
            set.set(k, v);
        }
        // Removing slot 3 refills it with value 2, which beats its parent 10
        assert_eq!(set.remove(&3), Some((3, 11)));
        assert!(set.validate().is_ok());
        assert_eq!(set.into_sorted_vec(), vec![(0, 0), (2, 1), (5, 2), (1, 10), (4, 12)]);
    }

    #[test]
    fn test_remove_refill_sifts_down() {
        let mut set = ascending();
        for i in 0..15 {
            set.set(i, i);
        }
        assert_eq!(set.remove(&0), Some((0, 0)));
        assert!(set.validate().is_ok());
        assert_eq!(set.top(), Some((&1, &1)));
    }

    #[test]
    fn test_update_in_place() {
        #[derive(Debug, Clone, PartialEq)]
        struct Job {
            deadline: u64,
            attempts: u32,
        }

        let mut jobs = HeapSet::new(|a: &Job, b: &Job| a.deadline < b.deadline);
        jobs.set("a", Job { deadline: 10, attempts: 0 });
        jobs.set("b", Job { deadline: 20, attempts: 0 });

        jobs.update("a", |job| {
            job.deadline = 30;
            job.attempts += 1;
        })
        .unwrap();

        assert_eq!(jobs.top().map(|(k, _)| *k), Some("b"));
        assert_eq!(jobs.get("a").map(|job| job.attempts), Some(1));
        assert_eq!(jobs.update("missing", |_| {}), Err(HeapSetError::KeyNotFound));
        assert!(jobs.validate().is_ok());
    }

    #[test]
    fn test_key_needs_only_hash_and_eq() {
        #[derive(Debug, Hash, PartialEq, Eq)]
        struct Id(u32);

        let mut set = HeapSet::new(|a: &i32, b: &i32| a < b);
        assert_eq!(set.set(Id(1), 5), None);
        assert_eq!(set.set(Id(2), 3), None);
        assert_eq!(set.set(Id(1), 1), Some(5));
        set.extend([(Id(3), 4)]);

        assert_eq!(set.get(&Id(1)), Some(&1));
        set.update(&Id(3), |v| *v = 0).unwrap();
        assert_eq!(set.top(), Some((&Id(3), &0)));
        assert!(set.validate().is_ok());

        assert_eq!(set.remove(&Id(2)), Some((Id(2), 3)));
        assert_eq!(set.pop(), Some((Id(3), 0)));
        assert_eq!(set.pop(), Some((Id(1), 1)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_set_after_pop_reuses_key() {
        let mut set = ascending();
        set.set(1, 1);
        set.set(2, 2);
        assert_eq!(set.pop(), Some((1, 1)));

        // The popped key left no stale index entry behind
        assert_eq!(set.set(1, 0), None);
        assert_eq!(set.len(), 2);
        assert_eq!(set.top(), Some((&1, &0)));
        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_borrowed_key_lookup() {
        let mut set: HeapSet<String, u32> = HeapSet::default();
        set.set("alpha".to_string(), 2);
        set.set("beta".to_string(), 1);

        assert_eq!(set.get("alpha"), Some(&2));
        assert_eq!(set.get_key_value("beta"), Some((&"beta".to_string(), &1)));
        assert_eq!(set.remove("beta"), Some(("beta".to_string(), 1)));
    }

    #[test]
    fn test_iteration_covers_all_pairs() {
        let set: HeapSet<u32, u32> = (0..20).map(|i| (i, 100 - i)).collect();
        assert_eq!(set.iter().len(), 20);

        let mut pairs: Vec<_> = set.iter().map(|(k, v)| (*k, *v)).collect();
        pairs.sort_unstable();
        assert_eq!(pairs, (0..20).map(|i| (i, 100 - i)).collect::<Vec<_>>());

        let key_sum: u32 = set.keys().sum();
        let value_sum: u32 = set.values().sum();
        assert_eq!(key_sum, (0..20).sum::<u32>());
        assert_eq!(value_sum, (81..=100).sum::<u32>());
        assert_eq!((&set).into_iter().count(), 20);
    }

    #[test]
    fn test_reversed_is_max_first() {
        let mut set = HeapSet::new(Reversed);
        set.extend([("low", 1), ("high", 9), ("mid", 5)]);
        assert_eq!(set.pop(), Some(("high", 9)));
        assert_eq!(set.pop(), Some(("mid", 5)));
    }

    #[test]
    fn test_fx_hasher_variant() {
        let mut set: FxHeapSet<u64, u64> = FxHeapSet::default();
        for i in (0..100).rev() {
            set.set(i, i * 2);
        }
        assert!(set.validate().is_ok());
        let sorted = set.into_sorted_iter();
        assert_eq!(sorted.len(), 100);
        assert!(sorted.map(|(_, v)| v).eq((0..100).map(|i| i * 2)));
    }

    #[test]
    fn test_clear_and_reuse() {
        let mut set = HeapSet::with_capacity(8, Natural);
        set.extend((0..8).map(|i| (i, i)));
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.get(&3), None);

        set.set(3, 3);
        assert_eq!(set.top(), Some((&3, &3)));
        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = ascending();
        original.set(1, 1);
        original.set(2, 2);

        let mut copy = original.clone();
        copy.set(1, 50);
        assert_eq!(original.top(), Some((&1, &1)));
        assert_eq!(copy.top(), Some((&2, &2)));
        assert!(copy.validate().is_ok());
    }

    #[test]
    fn test_debug_output() {
        let mut set = ascending();
        set.set(1, 10);
        assert_eq!(format!("{:?}", set), "{1: 10}");
    }

    #[test]
    fn test_validate_detects_broken_order() {
        let mut set = ascending();
        for i in 0..4 {
            set.set(i, i);
        }
        // Change a value behind the heap's back
        let handle = set.index.lookup(set.heap.arena(), &3).unwrap();
        set.heap.element_mut(handle).unwrap().value = -1;
        assert_eq!(
            set.validate(),
            Err(HeapSetError::HeapOrderViolated { position: 3 })
        );
    }

    #[test]
    fn test_validate_detects_stale_position() {
        let mut set = ascending();
        for i in 0..4 {
            set.set(i, i);
        }
        let handle = set.index.lookup(set.heap.arena(), &2).unwrap();
        set.heap.element_mut(handle).unwrap().position = 0;
        assert_eq!(
            set.validate(),
            Err(HeapSetError::PositionMismatch {
                position: 2,
                recorded: 0
            })
        );
    }
}

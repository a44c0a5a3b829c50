//! Array-backed binary min-heap over arena elements
//!
//! [`OrderingHeap`] keeps a vector of [`ElementKey`] handles in heap order and
//! owns the [`ElementArena`] they point into. Every structural move goes
//! through [`OrderingHeap::swap`], which rewrites the `position` of both
//! elements it touches, so an element's `position` is always its true index
//! in the array.
//!
//! # Time Complexity
//!
//! | Operation  | Complexity |
//! |------------|------------|
//! | `push`     | O(log n)   |
//! | `pop`      | O(log n)   |
//! | `fix`      | O(log n)   |
//! | `pop_last` | O(1)       |
//! | `swap`     | O(1)       |
//! | `peek`     | O(1)       |

use crate::storage::{Element, ElementArena, ElementKey};
use crate::traits::Compare;

/// A binary min-heap ordered by a comparator over element values
#[derive(Debug, Clone)]
pub(crate) struct OrderingHeap<K, V, C> {
    /// Sole owner of element storage
    elements: ElementArena<K, V>,
    /// Handles in heap order
    slots: Vec<ElementKey>,
    less: C,
}

impl<K, V, C> OrderingHeap<K, V, C> {
    pub(crate) fn arena(&self) -> &ElementArena<K, V> {
        &self.elements
    }
}

impl<K, V, C: Compare<V>> OrderingHeap<K, V, C> {
    pub(crate) fn new(less: C) -> Self {
        Self {
            elements: ElementArena::new(),
            slots: Vec::new(),
            less,
        }
    }

    pub(crate) fn with_capacity(capacity: usize, less: C) -> Self {
        Self {
            elements: ElementArena::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            less,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn element(&self, handle: ElementKey) -> Option<&Element<K, V>> {
        self.elements.get(handle)
    }

    pub(crate) fn element_mut(&mut self, handle: ElementKey) -> Option<&mut Element<K, V>> {
        self.elements.get_mut(handle)
    }

    /// Handle stored in array slot `position`
    pub(crate) fn handle_at(&self, position: usize) -> Option<ElementKey> {
        self.slots.get(position).copied()
    }

    /// Number of elements the arena owns; equals `len` between operations
    pub(crate) fn stored(&self) -> usize {
        self.elements.len()
    }

    /// Appends a new element and sifts it up
    pub(crate) fn push(&mut self, key: K, value: V) -> ElementKey {
        let position = self.slots.len();
        let handle = self.elements.insert(Element::new(key, value, position));
        self.slots.push(handle);
        self.sift_up(position);
        handle
    }

    /// Removes and returns the root element
    pub(crate) fn pop(&mut self) -> Option<Element<K, V>> {
        if self.slots.is_empty() {
            return None;
        }

        let last = self.slots.len() - 1;
        if last > 0 {
            self.swap(0, last);
        }
        let element = self.pop_last()?;

        if !self.slots.is_empty() {
            self.sift_down(0);
        }

        Some(element)
    }

    /// Detaches the element in the final array slot
    ///
    /// Nothing else moves, so the heap order is untouched.
    pub(crate) fn pop_last(&mut self) -> Option<Element<K, V>> {
        let handle = self.slots.pop()?;
        self.elements.remove(handle)
    }

    /// Returns the root element without removing it
    pub(crate) fn peek(&self) -> Option<&Element<K, V>> {
        self.slots.first().map(|&handle| &self.elements[handle])
    }

    /// Re-establishes heap order after the value at `position` changed
    pub(crate) fn fix(&mut self, position: usize) {
        debug_assert!(position < self.slots.len(), "fix out of bounds");
        if !self.sift_up(position) {
            self.sift_down(position);
        }
    }

    /// Exchanges two array slots and records the new positions
    pub(crate) fn swap(&mut self, i: usize, j: usize) {
        self.slots.swap(i, j);
        let (a, b) = (self.slots[i], self.slots[j]);
        self.elements[a].position = i;
        self.elements[b].position = j;
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.elements.clear();
    }

    /// Returns true if slot `i` orders strictly before slot `j`
    pub(crate) fn less_at(&self, i: usize, j: usize) -> bool {
        let a = &self.elements[self.slots[i]].value;
        let b = &self.elements[self.slots[j]].value;
        self.less.less(a, b)
    }

    /// Moves the element at `position` towards the root; returns true if it moved
    fn sift_up(&mut self, position: usize) -> bool {
        let mut index = position;
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.less_at(index, parent) {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
        index != position
    }

    /// Moves the element at `position` towards the leaves
    fn sift_down(&mut self, mut index: usize) {
        let len = self.slots.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut child = left;
            if right < len && self.less_at(right, left) {
                child = right;
            }
            if !self.less_at(child, index) {
                break;
            }
            self.swap(index, child);
            index = child;
        }
    }
}

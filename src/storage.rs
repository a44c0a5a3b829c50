//! Element storage for the heap set
//!
//! Elements are kept in a generational arena ([`ElementArena`]) owned by the
//! ordering heap. The heap array and the key index both refer to an element
//! only through an [`ElementKey`], a copyable handle that never owns
//! the element.
//!
//! # Layout
//!
//! The heap array reorders on every insert, update and delete. Storing handles
//! in the array means a swap moves two small keys and rewrites two `position`
//! fields; the key index never has to be touched. Because slotmap keys are
//! generational, a handle to a removed element can never alias a newer one.

use slotmap::{new_key_type, SlotMap};

/// Position recorded on an element once it has left the heap array
pub(crate) const DETACHED: usize = usize::MAX;

new_key_type! {
    /// Stable, non-owning handle to an element in the arena
    pub(crate) struct ElementKey;
}

/// The stored unit: a key, its value, and where it currently sits in the heap
#[derive(Debug, Clone)]
pub(crate) struct Element<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    /// Index of this element in the heap array; [`DETACHED`] once removed
    pub(crate) position: usize,
}

impl<K, V> Element<K, V> {
    pub(crate) fn new(key: K, value: V, position: usize) -> Self {
        Self {
            key,
            value,
            position,
        }
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.position == DETACHED
    }

    pub(crate) fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

/// Arena that owns every live element
#[derive(Debug, Clone)]
pub(crate) struct ElementArena<K, V> {
    elements: SlotMap<ElementKey, Element<K, V>>,
}

impl<K, V> ElementArena<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            elements: SlotMap::with_key(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: SlotMap::with_capacity_and_key(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    pub(crate) fn insert(&mut self, element: Element<K, V>) -> ElementKey {
        self.elements.insert(element)
    }

    /// Releases the element's slot, scrubbing its position
    pub(crate) fn remove(&mut self, handle: ElementKey) -> Option<Element<K, V>> {
        let mut element = self.elements.remove(handle)?;
        element.position = DETACHED;
        Some(element)
    }

    pub(crate) fn get(&self, handle: ElementKey) -> Option<&Element<K, V>> {
        self.elements.get(handle)
    }

    pub(crate) fn get_mut(&mut self, handle: ElementKey) -> Option<&mut Element<K, V>> {
        self.elements.get_mut(handle)
    }

    pub(crate) fn clear(&mut self) {
        self.elements.clear();
    }
}

impl<K, V> std::ops::Index<ElementKey> for ElementArena<K, V> {
    type Output = Element<K, V>;

    fn index(&self, handle: ElementKey) -> &Self::Output {
        &self.elements[handle]
    }
}

impl<K, V> std::ops::IndexMut<ElementKey> for ElementArena<K, V> {
    fn index_mut(&mut self, handle: ElementKey) -> &mut Self::Output {
        &mut self.elements[handle]
    }
}

//! Comparator seam and error type for the heap set
//!
//! Values in a [`HeapSet`](crate::HeapSet) are ordered by a caller-supplied
//! comparator rather than by `Ord` alone:
//!
//! - [`Compare`]: the comparator trait, implemented for every `Fn(&V, &V) -> bool`
//! - [`Natural`]: min-ordering by `Ord`
//! - [`Reversed`]: max-ordering by `Ord`, the counterpart of `std::cmp::Reverse`
//!
//! The comparator is a type parameter of the set, so every comparison is
//! statically dispatched.

use std::fmt;

/// Error type for heap set operations
///
/// Absence of a key is normally reported with `Option`; this type covers the
/// operations that must report *why* they failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapSetError {
    /// The key is not present in the set
    KeyNotFound,
    /// An element's recorded position disagrees with its actual array slot
    PositionMismatch {
        /// The array slot the element actually occupies
        position: usize,
        /// The position stored on the element
        recorded: usize,
    },
    /// The key index and the heap array hold a different number of elements
    LengthMismatch {
        /// Number of elements in the heap array
        heap_len: usize,
        /// Number of keys in the index
        index_len: usize,
    },
    /// The key index does not map the key in `position` to that slot's element
    IndexMismatch {
        /// The array slot whose key is mis-indexed
        position: usize,
    },
    /// An array slot or index entry refers to an element the heap no longer owns
    DanglingHandle,
    /// The element at `position` orders before its parent
    HeapOrderViolated {
        /// The offending array slot
        position: usize,
    },
}

impl fmt::Display for HeapSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapSetError::KeyNotFound => write!(f, "key is not present in the heap set"),
            HeapSetError::PositionMismatch { position, recorded } => {
                write!(
                    f,
                    "element in slot {} records position {}",
                    position, recorded
                )
            }
            HeapSetError::LengthMismatch {
                heap_len,
                index_len,
            } => {
                write!(
                    f,
                    "heap holds {} elements but index holds {} keys",
                    heap_len, index_len
                )
            }
            HeapSetError::IndexMismatch { position } => {
                write!(f, "index does not map the key in slot {} to its element", position)
            }
            HeapSetError::DanglingHandle => {
                write!(f, "handle refers to an element that is no longer stored")
            }
            HeapSetError::HeapOrderViolated { position } => {
                write!(f, "element in slot {} orders before its parent", position)
            }
        }
    }
}

impl std::error::Error for HeapSetError {}

/// A strict weak ordering over values
///
/// `less(a, b)` returns true when `a` must leave the heap before `b`.
/// An inconsistent comparator does not cause a panic, but the order in which
/// [`top`](crate::HeapSet::top) and [`pop`](crate::HeapSet::pop) report
/// values is then unspecified.
///
/// Closures and function pointers of shape `Fn(&V, &V) -> bool` implement
/// this trait directly:
///
/// ```rust
/// use rust_heapset::HeapSet;
///
/// let mut jobs = HeapSet::new(|a: &u64, b: &u64| a < b);
/// jobs.set("compact", 30);
/// jobs.set("flush", 10);
/// assert_eq!(jobs.top(), Some((&"flush", &10)));
/// ```
pub trait Compare<V: ?Sized> {
    /// Returns true if `a` orders strictly before `b`
    fn less(&self, a: &V, b: &V) -> bool;
}

impl<V: ?Sized, F> Compare<V> for F
where
    F: Fn(&V, &V) -> bool,
{
    #[inline]
    fn less(&self, a: &V, b: &V) -> bool {
        self(a, b)
    }
}

/// A nameable comparator type for plain function pointers
pub type LessFn<V> = fn(&V, &V) -> bool;

/// Orders values by `Ord`, smallest first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Natural;

impl<V: Ord + ?Sized> Compare<V> for Natural {
    #[inline]
    fn less(&self, a: &V, b: &V) -> bool {
        a < b
    }
}

/// Orders values by `Ord`, largest first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reversed;

impl<V: Ord + ?Sized> Compare<V> for Reversed {
    #[inline]
    fn less(&self, a: &V, b: &V) -> bool {
        a > b
    }
}

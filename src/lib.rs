//! Indexed priority queue for Rust
//!
//! This crate provides [`HeapSet`], a key-value store whose pairs can be reached
//! both by key and by value order. A hash index maps each key to its element,
//! and a binary min-heap keeps the elements ordered by a caller-supplied
//! comparator, so re-prioritising an existing key is a single O(log n) call.
//!
//! # Features
//!
//! - **HeapSet**: O(1) lookup by key; O(log n) insert, update, delete and pop; O(1) top
//! - **Custom ordering**: any `Fn(&V, &V) -> bool`, or [`Natural`] / [`Reversed`] for `Ord` values
//! - **In-place updates**: [`HeapSet::update`] mutates a stored value and repairs its slot
//!
//! # Example
//!
//! ```rust
//! use rust_heapset::HeapSet;
//!
//! let mut deadlines = HeapSet::new(|a: &u64, b: &u64| a < b);
//! deadlines.set("backup", 300);
//! deadlines.set("report", 120);
//! deadlines.set("cleanup", 600);
//! assert_eq!(deadlines.top(), Some((&"report", &120)));
//!
//! // Push the report back; the backup is now due first
//! deadlines.set("report", 900);
//! assert_eq!(deadlines.pop(), Some(("backup", 300)));
//! assert_eq!(deadlines.get("report"), Some(&900));
//! assert_eq!(deadlines.len(), 2);
//! ```

mod heap;
mod index;
mod storage;

pub mod heap_set;
pub mod traits;

// Re-export the main types for convenience
pub use heap_set::{FxHeapSet, HeapSet};
pub use traits::{Compare, HeapSetError, LessFn, Natural, Reversed};

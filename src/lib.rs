//! # Holy Grail Sort
//!
//! `holygrail` is a stable, in-place sorting library with a worst-case bound of
//! O(n log n) comparisons and element moves, using O(1) extra memory.
//!
//! It implements the **Grail Sort** family of block merge sorts: a small set of distinct
//! elements is gathered at the front of the slice and reused as block tags and as a
//! scrolling merge buffer, so stable merging needs no allocation at all.
//!
//! ## Key Features
//!
//! - **Stable and in-place**: equal elements keep their relative order, and the default entry
//!   points never allocate.
//! - **Adaptive Strategy**: picks a full block merge, a key-starved rotation variant, or a pure
//!   rotation merge sort depending on how many distinct values the input holds (see
//!   [`Strategy`]).
//! - **Optional scratch space**: lending a buffer through [`grailsort_with_buffer`] turns
//!   three-move swaps into single clones, without changing the result.
//! - **Pluggable ordering**: anything implementing [`Comparator`], closures included.
//!
//! ## Usage
//!
//! ### Basic Usage
//!
//! ```rust
//! use holygrail::grailsort;
//!
//! let mut data = vec!["banana", "apple", "cherry", "date"];
//! grailsort(&mut data);
//!
//! assert_eq!(data, vec!["apple", "banana", "cherry", "date"]);
//! ```
//!
//! ### Custom Orderings
//!
//! Stability is what makes sorting by a partial key useful: records that tie keep the order
//! they came in.
//!
//! ```rust
//! use holygrail::grailsort_by;
//!
//! struct User {
//!     name: &'static str,
//!     age: u32,
//! }
//!
//! let mut users = vec![
//!     User { name: "Carol", age: 35 },
//!     User { name: "Alice", age: 30 },
//!     User { name: "Bob", age: 35 },
//!     User { name: "Dave", age: 30 },
//! ];
//!
//! grailsort_by(&mut users, |a: &User, b: &User| a.age.cmp(&b.age));
//!
//! let names: Vec<_> = users.iter().map(|u| u.name).collect();
//! assert_eq!(names, vec!["Alice", "Dave", "Carol", "Bob"]);
//! ```
//!
//! ### Sub-ranges
//!
//! [`grailsort_range`] sorts part of a slice and is the one entry point that validates its
//! arguments.
//!
//! ```rust
//! use holygrail::{grailsort_range, Natural, NoBuffer};
//!
//! let mut data = vec![0, 9, 8, 7, 1];
//! grailsort_range(&mut data, 1, 3, Natural, &mut NoBuffer).unwrap();
//! assert_eq!(data, vec![0, 7, 8, 9, 1]);
//! ```
//!
//! ## Performance Characteristics
//!
//! - **Worst Case**: O(n log n) comparisons and moves, no recursion.
//! - **Memory Overhead**: none; a lent buffer of up to √n elements speeds up merging.
//! - **Few distinct values**: inputs with fewer than four distinct values are merged by
//!   rotation; a single distinct value costs one comparison per element and no moves.
//!
//! Expect it to be slower than [`slice::sort`], which allocates. It is meant for
//! situations where allocation is not an option but stability is required.

pub mod algo;
pub mod core;

mod blocks;
mod build;
mod combine;
mod keys;
mod lazy;
mod ops;

pub use algo::{
    Strategy, grailsort, grailsort_by, grailsort_dynamic_by, grailsort_range,
    grailsort_static_by, grailsort_with_buffer, grailsort_with_buffer_by, ideal_buffer_len,
};
pub use core::{Buffer, Comparator, Natural, NoBuffer, STATIC_BUFFER_LEN, SortError};

pub mod prelude {
    pub use crate::algo::{grailsort, grailsort_by, grailsort_range, grailsort_with_buffer};
    pub use crate::core::{Comparator, Natural, NoBuffer, SortError};
}

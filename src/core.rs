//! Core traits and types for Holy Grail Sort.
//!
//! This module defines:
//! - [`Comparator`]: The ordering capability every entry point is generic over, and [`Natural`].
//! - [`Buffer`]: Optional caller-owned scratch space, with [`NoBuffer`] for the strictly in-place case.
//! - [`SortError`]: The input-validation error returned by [`grailsort_range`](crate::grailsort_range).

use std::cmp::Ordering;
use std::fmt;

/// Capacity of the fixed external buffer used by [`grailsort_static_by`](crate::grailsort_static_by).
pub const STATIC_BUFFER_LEN: usize = 512;

/// A three-way comparison over elements of type `T`.
///
/// The sort never inspects elements other than through this trait, and it re-compares
/// elements after relocating them, so implementations must be pure and consistent for
/// the duration of a call.
///
/// Every closure or function of the shape `Fn(&T, &T) -> Ordering` is a `Comparator`.
///
/// # Examples
///
/// Implementing for a custom ordering:
///
/// ```
/// use std::cmp::Ordering;
/// use holygrail::core::Comparator;
///
/// struct ByLength;
///
/// impl Comparator<String> for ByLength {
///     fn compare(&self, a: &String, b: &String) -> Ordering {
///         a.len().cmp(&b.len())
///     }
/// }
///
/// let mut words = vec!["ccc".to_string(), "a".to_string(), "bb".to_string()];
/// holygrail::grailsort_by(&mut words, ByLength);
/// assert_eq!(words, vec!["a", "bb", "ccc"]);
/// ```
pub trait Comparator<T> {
    /// Returns how `a` orders relative to `b`.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline(always)]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// The ordering given by [`Ord`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Natural;

impl<T: Ord> Comparator<T> for Natural {
    #[inline(always)]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::NoBuffer {}
    impl<T> Sealed for [T] {}
}

/// External scratch space lent to the sort.
///
/// A buffer only ever holds copies of elements that already live in the sequence being
/// sorted; whatever it contained before the call is overwritten, and its contents after
/// the call are unspecified. Absence of a buffer (or a buffer that is too small) never
/// affects the result, only the number of element moves.
///
/// The trait is sealed: [`NoBuffer`] and `[T]` for `T: Clone` are its only implementations.
///
/// ```compile_fail
/// use holygrail::Buffer;
///
/// struct Mine;
///
/// impl Buffer<u32> for Mine {
///     fn capacity(&self) -> usize { 0 }
///     fn stash(&mut self, _src: &[u32]) {}
///     fn restore(&self, _dst: &mut [u32]) {}
///     fn overwrite(_v: &mut [u32], _dst: usize, _src: usize) {}
/// }
/// ```
pub trait Buffer<T>: sealed::Sealed {
    /// Number of elements the buffer can hold.
    fn capacity(&self) -> usize;

    /// Copies `src` into the front of the buffer. `src.len()` never exceeds [`Self::capacity`].
    fn stash(&mut self, src: &[T]);

    /// Copies the front of the buffer back over `dst`.
    fn restore(&self, dst: &mut [T]);

    /// Writes `v[src]` over `v[dst]`. The slot at `src` is scratch afterwards.
    fn overwrite(v: &mut [T], dst: usize, src: usize);
}

/// The empty buffer: every merge runs by swapping within the sequence itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoBuffer;

impl<T> Buffer<T> for NoBuffer {
    fn capacity(&self) -> usize {
        0
    }

    fn stash(&mut self, _src: &[T]) {}

    fn restore(&self, _dst: &mut [T]) {}

    #[inline(always)]
    fn overwrite(v: &mut [T], dst: usize, src: usize) {
        v.swap(dst, src);
    }
}

// Any clonable slice can lend its slots; merges then write with a single clone
// instead of a three-move swap.
impl<T: Clone> Buffer<T> for [T] {
    fn capacity(&self) -> usize {
        self.len()
    }

    fn stash(&mut self, src: &[T]) {
        self[..src.len()].clone_from_slice(src);
    }

    fn restore(&self, dst: &mut [T]) {
        dst.clone_from_slice(&self[..dst.len()]);
    }

    #[inline(always)]
    fn overwrite(v: &mut [T], dst: usize, src: usize) {
        let item = v[src].clone();
        v[dst] = item;
    }
}

/// Error returned when a requested sub-range does not fit the sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortError {
    /// `start + len` overflows or lies past the end of a slice of length `slice_len`.
    RangeOutOfBounds {
        start: usize,
        len: usize,
        slice_len: usize,
    },
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::RangeOutOfBounds {
                start,
                len,
                slice_len,
            } => write!(
                f,
                "range {start}..{start}+{len} is out of bounds for a sequence of length {slice_len}"
            ),
        }
    }
}

impl std::error::Error for SortError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_comparators() {
        let rev = |a: &i32, b: &i32| b.cmp(a);
        assert_eq!(rev.compare(&1, &2), Ordering::Greater);
        assert_eq!(rev.compare(&2, &2), Ordering::Equal);
        assert_eq!(Natural.compare(&1, &2), Ordering::Less);
    }

    #[test]
    fn slice_buffer_round_trip() {
        let mut scratch = vec![0u32; 4];
        let buf: &mut [u32] = &mut scratch;
        assert_eq!(buf.capacity(), 4);

        buf.stash(&[7, 8, 9]);
        let mut out = [0u32; 3];
        buf.restore(&mut out);
        assert_eq!(out, [7, 8, 9]);
    }

    #[test]
    fn overwrite_modes() {
        let mut v = vec![1, 2, 3];
        <[i32] as Buffer<i32>>::overwrite(&mut v, 0, 2);
        assert_eq!(v, vec![3, 2, 3]);

        let mut v = vec![1, 2, 3];
        <NoBuffer as Buffer<i32>>::overwrite(&mut v, 0, 2);
        assert_eq!(v, vec![3, 2, 1]);
    }

    #[test]
    fn error_display() {
        let err = SortError::RangeOutOfBounds {
            start: 4,
            len: 8,
            slice_len: 10,
        };
        assert_eq!(
            err.to_string(),
            "range 4..4+8 is out of bounds for a sequence of length 10"
        );
    }
}

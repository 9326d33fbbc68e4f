//! Element-moving primitives and binary searches shared by every phase.
//!
//! Nothing here validates indices: callers hand in ranges that already lie inside the
//! working slice.

use crate::core::{Buffer, Comparator};
use std::cmp::Ordering;
use std::marker::PhantomData;

/// How a merge relocates an element into a scratch slot.
///
/// Swapping keeps the scratch contents alive inside the sequence. Copying leaves stale
/// duplicates behind, so the caller stashes the real scratch contents beforehand and
/// restores them once the scratch region has settled. Both modes leave the scratch in
/// the same positions.
pub(crate) trait Shift<T> {
    fn shift(&self, v: &mut [T], dst: usize, src: usize);

    /// Moves `len` elements from `src` to `dst` in ascending order. Safe for `dst < src`.
    #[inline(always)]
    fn shift_forwards(&self, v: &mut [T], dst: usize, src: usize, len: usize) {
        for i in 0..len {
            self.shift(v, dst + i, src + i);
        }
    }

    /// Moves `len` elements from `src` to `dst` in descending order. Safe for `dst > src`.
    #[inline(always)]
    fn shift_backwards(&self, v: &mut [T], dst: usize, src: usize, len: usize) {
        for i in (0..len).rev() {
            self.shift(v, dst + i, src + i);
        }
    }
}

pub(crate) struct Swapping;

impl<T> Shift<T> for Swapping {
    #[inline(always)]
    fn shift(&self, v: &mut [T], dst: usize, src: usize) {
        v.swap(dst, src);
    }
}

pub(crate) struct Copying<B: ?Sized>(PhantomData<B>);

impl<B: ?Sized> Copying<B> {
    pub(crate) fn new() -> Self {
        Copying(PhantomData)
    }
}

impl<T, B: Buffer<T> + ?Sized> Shift<T> for Copying<B> {
    #[inline(always)]
    fn shift(&self, v: &mut [T], dst: usize, src: usize) {
        B::overwrite(v, dst, src);
    }
}

pub(crate) fn swap_blocks_forwards<T>(v: &mut [T], a: usize, b: usize, len: usize) {
    for i in 0..len {
        v.swap(a + i, b + i);
    }
}

pub(crate) fn swap_blocks_backwards<T>(v: &mut [T], a: usize, b: usize, len: usize) {
    for i in (0..len).rev() {
        v.swap(a + i, b + i);
    }
}

/// Moves `v[start]` to `start + len`, sliding the elements in between one slot left.
#[inline]
pub(crate) fn insert_forwards<T>(v: &mut [T], start: usize, len: usize) {
    v[start..=start + len].rotate_left(1);
}

/// Moves `v[start + len]` to `start`, sliding the elements in between one slot right.
#[inline]
pub(crate) fn insert_backwards<T>(v: &mut [T], start: usize, len: usize) {
    v[start..=start + len].rotate_right(1);
}

/// Exchanges the adjacent runs `[start, start + left)` and `[start + left, start + left + right)`.
///
/// Repeatedly block-swaps the shorter run into its final place, so the cost is dominated by
/// swaps of `min(left, right)` elements; a unit-length side is finished with one insert.
pub(crate) fn rotate<T>(v: &mut [T], mut start: usize, mut left: usize, mut right: usize) {
    while left > 1 && right > 1 {
        if left <= right {
            swap_blocks_forwards(v, start, start + left, left);
            start += left;
            right -= left;
        } else {
            swap_blocks_forwards(v, start + left - right, start + left, right);
            left -= right;
        }
    }

    if left == 1 {
        insert_forwards(v, start, right);
    } else if right == 1 {
        insert_backwards(v, start, left);
    }
}

/// Leftmost insertion point of `target` in the sorted `v`.
pub(crate) fn lower_bound<T, C: Comparator<T>>(v: &[T], target: &T, cmp: &C) -> usize {
    let (mut lo, mut hi) = (0, v.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if cmp.compare(&v[mid], target) == Ordering::Less {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Rightmost insertion point of `target` in the sorted `v`.
pub(crate) fn upper_bound<T, C: Comparator<T>>(v: &[T], target: &T, cmp: &C) -> usize {
    let (mut lo, mut hi) = (0, v.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if cmp.compare(target, &v[mid]) == Ordering::Less {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

/// Insertion point of `target` in the sorted, duplicate-free `v`, or `None` as soon as an
/// equal element turns up.
pub(crate) fn exclusive_search<T, C: Comparator<T>>(v: &[T], target: &T, cmp: &C) -> Option<usize> {
    let (mut lo, mut hi) = (0, v.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match cmp.compare(&v[mid], target) {
            Ordering::Less => lo = mid + 1,
            Ordering::Greater => hi = mid,
            Ordering::Equal => return None,
        }
    }
    Some(lo)
}

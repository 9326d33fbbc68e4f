//! Bottom-up construction of sorted runs behind a scrolling buffer.
//!
//! The data starts right after `buffer_len` scratch elements. Every forward pass merges
//! neighbouring runs into the scratch in front of them, so the data slides left by the
//! current merge width while the scratch collects at its tail. A final backward pass at
//! the full buffer width moves everything back, leaving runs of `2 * buffer_len` exactly
//! where the data started and the scratch in front of it again.

use crate::core::{Buffer, Comparator};
use crate::ops::{Copying, Shift, Swapping, rotate};
use std::cmp::Ordering;

/// Merges `[start, start + left_len)` with the run after it into the slots starting
/// `buffer_offset` before `start`. Ties take the left run.
pub(crate) fn merge_forwards<T, C: Comparator<T>, M: Shift<T>>(
    v: &mut [T],
    cmp: &C,
    mv: &M,
    start: usize,
    left_len: usize,
    right_len: usize,
    buffer_offset: usize,
) {
    let mut buffer = start - buffer_offset;
    let mut left = start;
    let middle = start + left_len;
    let mut right = middle;
    let end = middle + right_len;

    while right < end {
        if left == middle || cmp.compare(&v[left], &v[right]) == Ordering::Greater {
            mv.shift(v, buffer, right);
            right += 1;
        } else {
            mv.shift(v, buffer, left);
            left += 1;
        }
        buffer += 1;
    }

    if buffer != left {
        mv.shift_forwards(v, buffer, left, middle - left);
    }
}

/// Mirror of [`merge_forwards`]: fills the slots ending `buffer_offset` after the right run,
/// from the back. Ties take the right run.
pub(crate) fn merge_backwards<T, C: Comparator<T>, M: Shift<T>>(
    v: &mut [T],
    cmp: &C,
    mv: &M,
    start: usize,
    left_len: usize,
    right_len: usize,
    buffer_offset: usize,
) {
    let mut left = start + left_len;
    let middle = left;
    let mut right = middle + right_len;
    let mut buffer = right + buffer_offset;

    while left > start {
        if right == middle || cmp.compare(&v[left - 1], &v[right - 1]) == Ordering::Greater {
            mv.shift(v, buffer - 1, left - 1);
            left -= 1;
        } else {
            mv.shift(v, buffer - 1, right - 1);
            right -= 1;
        }
        buffer -= 1;
    }

    if right != buffer {
        mv.shift_backwards(v, buffer - (right - middle), middle, right - middle);
    }
}

/// Sorts pairs of `v[start..start + len]` into the two slots before them.
fn pairwise<T, C: Comparator<T>, M: Shift<T>>(
    v: &mut [T],
    cmp: &C,
    mv: &M,
    start: usize,
    len: usize,
) {
    let mut index = 1;
    while index < len {
        let left = start + index - 1;
        let right = start + index;

        if cmp.compare(&v[left], &v[right]) == Ordering::Greater {
            mv.shift(v, left - 2, right);
            mv.shift(v, right - 2, left);
        } else {
            mv.shift(v, left - 2, left);
            mv.shift(v, right - 2, right);
        }
        index += 2;
    }

    let left = start + index - 1;
    if left < start + len {
        mv.shift(v, left - 2, left);
    }
}

/// Forward passes from `merge_len` up to (excluding) `limit`. Returns the new data start
/// and the merge width reached.
fn forward_passes<T, C: Comparator<T>, M: Shift<T>>(
    v: &mut [T],
    cmp: &C,
    mv: &M,
    mut start: usize,
    len: usize,
    mut merge_len: usize,
    limit: usize,
) -> (usize, usize) {
    while merge_len < limit {
        let full = 2 * merge_len;
        let end = start + len;

        let mut index = start;
        while index + full <= end {
            merge_forwards(v, cmp, mv, index, merge_len, merge_len, merge_len);
            index += full;
        }

        let left_over = end - index;
        if left_over > merge_len {
            merge_forwards(v, cmp, mv, index, merge_len, left_over - merge_len, merge_len);
        } else {
            mv.shift_forwards(v, index - merge_len, index, left_over);
        }

        start -= merge_len;
        merge_len *= 2;
    }
    (start, merge_len)
}

/// Final pass at the full buffer width, merging backwards into the scratch after the data.
fn backward_pass<T, C: Comparator<T>>(
    v: &mut [T],
    cmp: &C,
    start: usize,
    len: usize,
    buffer_len: usize,
) {
    let full = 2 * buffer_len;
    let last_block = len % full;
    let last_offset = start + len - last_block;

    if last_block <= buffer_len {
        rotate(v, last_offset, last_block, buffer_len);
    } else {
        merge_backwards(
            v,
            cmp,
            &Swapping,
            last_offset,
            buffer_len,
            last_block - buffer_len,
            buffer_len,
        );
    }

    let mut index = last_offset;
    while index >= start + full {
        index -= full;
        merge_backwards(v, cmp, &Swapping, index, buffer_len, buffer_len, buffer_len);
    }
}

/// Builds sorted runs of `2 * buffer_len` over `v[start..start + len]`, using the
/// `buffer_len` elements before `start` as scratch.
///
/// With an external buffer of at least two slots, the narrow passes write by copying
/// through it; the remaining passes swap in place.
pub(crate) fn build_blocks<T, C, B>(
    v: &mut [T],
    cmp: &C,
    ext: &mut B,
    start: usize,
    len: usize,
    buffer_len: usize,
) where
    C: Comparator<T>,
    B: Buffer<T> + ?Sized,
{
    let ext_len = prev_power_of_two(ext.capacity()).min(buffer_len);

    let (start, merge_len) = if ext_len >= 2 {
        ext.stash(&v[start - ext_len..start]);
        let copying = Copying::<B>::new();
        pairwise(v, cmp, &copying, start, len);
        let (start, merge_len) = forward_passes(v, cmp, &copying, start - 2, len, 2, ext_len);
        ext.restore(&mut v[start + len..start + len + ext_len]);
        (start, merge_len)
    } else {
        pairwise(v, cmp, &Swapping, start, len);
        (start - 2, 2)
    };

    let (start, _) = forward_passes(v, cmp, &Swapping, start, len, merge_len, buffer_len);
    backward_pass(v, cmp, start, len, buffer_len);
}

/// Largest power of two not above `n`, or zero.
pub(crate) fn prev_power_of_two(n: usize) -> usize {
    if n == 0 { 0 } else { 1 << (usize::BITS - 1 - n.leading_zeros()) }
}

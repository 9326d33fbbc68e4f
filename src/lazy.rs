//! Rotation-based merging and the small sorts that need no scratch space.
//!
//! These drive the fallback for inputs with fewer than four distinct values, the combine
//! passes of the key-starved strategy, and the final merge of the key region back into
//! the sorted data.

use crate::core::Comparator;
use crate::ops::{insert_backwards, lower_bound, rotate, upper_bound};
use std::cmp::Ordering;

/// Run length the fallback sort insertion-sorts before it starts merging.
const LAZY_RUN_LEN: usize = 16;

/// Stable insertion sort of `v[start..start + len]`.
pub(crate) fn insertion_sort<T, C: Comparator<T>>(v: &mut [T], cmp: &C, start: usize, len: usize) {
    for i in start + 1..start + len {
        let mut j = i;
        while j > start && cmp.compare(&v[j - 1], &v[i]) == Ordering::Greater {
            j -= 1;
        }
        if j != i {
            insert_backwards(v, j, i - j);
        }
    }
}

/// Shell sort of `v[start..start + len]`. Not stable; only used on the distinct keys.
///
/// Gaps come from `4^(k+1) + 3 * 2^k + 1` (8, 23, 77, 281, ...), finished by an
/// insertion sort.
pub(crate) fn shell_sort<T, C: Comparator<T>>(v: &mut [T], cmp: &C, start: usize, len: usize) {
    let gap = |k: u32| (4usize << (2 * k)) + (3usize << k) + 1;

    let mut k = 0;
    while gap(k) < len {
        k += 1;
    }

    while k > 0 {
        k -= 1;
        let g = gap(k);
        for i in start + g..start + len {
            let mut j = i;
            while j >= start + g && cmp.compare(&v[j - g], &v[j]) == Ordering::Greater {
                v.swap(j - g, j);
                j -= g;
            }
        }
    }

    insertion_sort(v, cmp, start, len);
}

/// Merges the adjacent sorted runs at `start` without a buffer, walking from the front.
/// Equal elements keep the left run first.
pub(crate) fn lazy_merge_forwards<T, C: Comparator<T>>(
    v: &mut [T],
    cmp: &C,
    mut start: usize,
    mut left_len: usize,
    mut right_len: usize,
) {
    while left_len > 0 && right_len > 0 {
        let middle = start + left_len;

        while left_len > 0 && cmp.compare(&v[start], &v[middle]) != Ordering::Greater {
            start += 1;
            left_len -= 1;
        }
        if left_len == 0 {
            break;
        }

        let moved = lower_bound(&v[middle..middle + right_len], &v[start], cmp);
        rotate(v, start, left_len, moved);
        start += moved;
        right_len -= moved;
    }
}

/// Mirror of [`lazy_merge_forwards`], walking from the back.
pub(crate) fn lazy_merge_backwards<T, C: Comparator<T>>(
    v: &mut [T],
    cmp: &C,
    start: usize,
    mut left_len: usize,
    mut right_len: usize,
) {
    while left_len > 0 && right_len > 0 {
        let middle = start + left_len;

        while right_len > 0
            && cmp.compare(&v[middle - 1], &v[middle + right_len - 1]) != Ordering::Greater
        {
            right_len -= 1;
        }
        if right_len == 0 {
            break;
        }

        let split = upper_bound(&v[start..middle], &v[middle + right_len - 1], cmp);
        rotate(v, start + split, left_len - split, right_len);
        left_len = split;
    }
}

/// Stable rotation merge, walking from whichever end has the shorter run.
pub(crate) fn lazy_merge<T, C: Comparator<T>>(
    v: &mut [T],
    cmp: &C,
    start: usize,
    left_len: usize,
    right_len: usize,
) {
    if left_len <= right_len {
        lazy_merge_forwards(v, cmp, start, left_len, right_len);
    } else {
        lazy_merge_backwards(v, cmp, start, left_len, right_len);
    }
}

/// Rotation merge that places equal elements of the right run first.
///
/// Used when the right run holds scratch keys that were taken from in front of the data
/// they are merged into.
pub(crate) fn lazy_merge_buffer_backwards<T, C: Comparator<T>>(
    v: &mut [T],
    cmp: &C,
    start: usize,
    mut left_len: usize,
    mut right_len: usize,
) {
    while left_len > 0 && right_len > 0 {
        let middle = start + left_len;

        while right_len > 0
            && cmp.compare(&v[middle - 1], &v[middle + right_len - 1]) == Ordering::Less
        {
            right_len -= 1;
        }
        if right_len == 0 {
            break;
        }

        let split = lower_bound(&v[start..middle], &v[middle + right_len - 1], cmp);
        rotate(v, start + split, left_len - split, right_len);
        left_len = split;
    }
}

/// Stable sort of `v[start..start + len]` using only rotations.
///
/// Insertion-sorts runs of sixteen, then merges neighbouring runs pairwise, doubling the
/// run length until one run is left.
pub(crate) fn lazy_stable_sort<T, C: Comparator<T>>(v: &mut [T], cmp: &C, start: usize, len: usize) {
    let end = start + len;

    let mut index = start;
    while index < end {
        insertion_sort(v, cmp, index, LAZY_RUN_LEN.min(end - index));
        index += LAZY_RUN_LEN;
    }

    let mut run = LAZY_RUN_LEN;
    while run < len {
        let mut index = start;
        while index + run < end {
            let right = run.min(end - (index + run));
            lazy_merge(v, cmp, index, run, right);
            index += 2 * run;
        }
        run *= 2;
    }
}

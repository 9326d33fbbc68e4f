//! Key collection and the two median-driven key re-sorts.
//!
//! Keys are pairwise-distinct elements gathered at the front of the range. During a merge
//! pass their relative order records which run each block came from; once the pass is
//! done they are put back in order so the next pass can reuse them.

use crate::core::Comparator;
use crate::ops::{exclusive_search, insert_backwards, lower_bound, rotate, swap_blocks_backwards};
use std::cmp::Ordering;

/// Length of the groups `lazy_sort_keys` partitions before merging them.
const KEY_GROUP_LEN: usize = 8;

/// Gathers up to `ideal` distinct elements, sorted, at the front of `v`.
///
/// Returns how many were found. The first occurrence of each value becomes its key, and
/// every other element keeps its relative order.
pub(crate) fn collect_keys<T, C: Comparator<T>>(v: &mut [T], ideal: usize, cmp: &C) -> usize {
    let len = v.len();
    let mut first = 0;
    let mut found = 1;
    let mut curr = 1;

    while curr < len && found < ideal {
        if let Some(pos) = exclusive_search(&v[first..first + found], &v[curr], cmp) {
            // Drag the key prefix up to the candidate, then drop the candidate into place.
            rotate(v, first, found, curr - (first + found));
            first = curr - found;
            insert_backwards(v, first + pos, found - pos);
            found += 1;
        }
        curr += 1;
    }

    rotate(v, 0, first, found);
    found
}

/// Restores sorted order of `count` keys at `first` after a block sort.
///
/// Keys below the median are already in order among themselves, as are the rest. The
/// smaller ones are compacted left while the others are parked in the scratch region at
/// `buffer`, then swapped back behind them.
pub(crate) fn sort_keys<T, C: Comparator<T>>(
    v: &mut [T],
    cmp: &C,
    first: usize,
    count: usize,
    buffer: usize,
    mut median: usize,
) {
    let mut swaps = 0;

    for key in first..first + count {
        if cmp.compare(&v[key], &v[median]) == Ordering::Less {
            if swaps != 0 {
                v.swap(key, key - swaps);
            }
        } else {
            if key == median {
                median = buffer + swaps;
            }
            v.swap(key, buffer + swaps);
            swaps += 1;
        }
    }

    swap_blocks_backwards(v, first + count - swaps, buffer, swaps);
}

/// Bufferless counterpart of [`sort_keys`].
///
/// Stable-partitions groups of eight keys around the median, then merges neighbouring
/// groups by rotating the upper part of the left group past the lower part of the right.
pub(crate) fn lazy_sort_keys<T, C: Comparator<T>>(
    v: &mut [T],
    cmp: &C,
    first: usize,
    count: usize,
    mut median: usize,
) {
    let end = first + count;

    let mut group = first;
    while group + KEY_GROUP_LEN < end {
        group_keys(v, cmp, group, group + KEY_GROUP_LEN, &mut median);
        group += KEY_GROUP_LEN;
    }
    group_keys(v, cmp, group, end, &mut median);

    let mut run = KEY_GROUP_LEN;
    while run < count {
        let full = 2 * run;
        let mut index = first;
        while index + full <= end {
            merge_groups(v, cmp, index, index + run, index + full, &mut median);
            index += full;
        }
        if end - index > run {
            merge_groups(v, cmp, index, index + run, end, &mut median);
        }
        run *= 2;
    }
}

fn group_keys<T, C: Comparator<T>>(
    v: &mut [T],
    cmp: &C,
    mut left: usize,
    right: usize,
    median: &mut usize,
) {
    while left < right && cmp.compare(&v[left], &v[*median]) == Ordering::Less {
        left += 1;
    }

    for i in left + 1..right {
        if cmp.compare(&v[i], &v[*median]) == Ordering::Less {
            insert_backwards(v, left, i - left);
            if (left..i).contains(&*median) {
                *median += 1;
            }
            left += 1;
        }
    }
}

fn merge_groups<T, C: Comparator<T>>(
    v: &mut [T],
    cmp: &C,
    left: usize,
    middle: usize,
    right: usize,
    median: &mut usize,
) {
    let merge_start = left + lower_bound(&v[left..middle], &v[*median], cmp);
    let merge_len = lower_bound(&v[middle..right], &v[*median], cmp);

    rotate(v, merge_start, middle - merge_start, merge_len);
    if (merge_start..middle).contains(&*median) {
        *median += merge_len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn natural(a: &u32, b: &u32) -> Ordering {
        a.cmp(b)
    }

    #[test]
    fn collects_first_occurrences() {
        // (value, position) pairs compared by value only.
        let by_value = |a: &(u32, usize), b: &(u32, usize)| a.0.cmp(&b.0);
        let mut v: Vec<(u32, usize)> = [5, 3, 5, 1, 3, 4, 1, 9]
            .iter()
            .enumerate()
            .map(|(i, &x)| (x, i))
            .collect();

        let found = collect_keys(&mut v, 16, &by_value);
        assert_eq!(found, 5);
        assert_eq!(&v[..5], &[(1, 3), (3, 1), (4, 5), (5, 0), (9, 7)]);
        // Duplicates keep their original relative order.
        assert_eq!(&v[5..], &[(5, 2), (3, 4), (1, 6)]);
    }

    #[test]
    fn collect_stops_at_ideal() {
        let mut v: Vec<u32> = (0..20).rev().collect();
        let found = collect_keys(&mut v, 6, &natural);
        assert_eq!(found, 6);
        assert_eq!(&v[..6], &[14, 15, 16, 17, 18, 19]);
        assert_eq!(&v[6..], &(0..14).rev().collect::<Vec<u32>>()[..]);
    }

    #[test]
    fn collect_on_uniform_input_moves_nothing() {
        let mut v = vec![7u32; 32];
        assert_eq!(collect_keys(&mut v, 12, &natural), 1);
        assert!(v.iter().all(|&x| x == 7));
    }

    #[test]
    fn buffered_key_sort() {
        // Keys interleaved the way a block sort leaves them: lower half and upper half each
        // in order, median key 4 at index 1.
        let mut v = vec![0u32, 4, 1, 5, 2, 6, 3, 7, 90, 91, 92, 93];
        sort_keys(&mut v, &natural, 0, 8, 8, 1);
        assert_eq!(&v[..8], &[0, 1, 2, 3, 4, 5, 6, 7]);
        let mut scratch = v[8..].to_vec();
        scratch.sort();
        assert_eq!(scratch, vec![90, 91, 92, 93]);
    }

    #[test]
    fn lazy_key_sort() {
        let lower: Vec<u32> = (0..13).collect();
        let upper: Vec<u32> = (13..27).collect();
        // Deterministic interleaving of the two ordered halves.
        let mut v = Vec::new();
        let (mut i, mut j) = (0, 0);
        let mut step = 0usize;
        while i < lower.len() || j < upper.len() {
            if j == upper.len() || (i < lower.len() && step % 3 != 1) {
                v.push(lower[i]);
                i += 1;
            } else {
                v.push(upper[j]);
                j += 1;
            }
            step += 1;
        }
        let median = v.iter().position(|&x| x == 13).unwrap();
        let count = v.len();

        lazy_sort_keys(&mut v, &natural, 0, count, median);
        assert_eq!(v, (0..27).collect::<Vec<u32>>());
    }
}

//! Block selection sort and the block mergers.
//!
//! A merge window holds two sorted runs cut into blocks of equal length. Each block has a
//! key at the same index in the key region; left-run keys are all smaller than right-run
//! keys, so after the blocks are permuted a key compared against the median key still
//! tells which run its block came from.

use crate::build::merge_forwards;
use crate::core::Comparator;
use crate::lazy::lazy_merge;
use crate::ops::{Shift, lower_bound, rotate, swap_blocks_forwards, upper_bound};
use std::cmp::Ordering;

/// Which run of the current merge a block came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Origin {
    Left,
    Right,
}

impl Origin {
    fn flip(self) -> Self {
        match self {
            Origin::Left => Origin::Right,
            Origin::Right => Origin::Left,
        }
    }
}

/// The unmerged leftover carried from one block-merge step to the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Fragment {
    pub len: usize,
    pub origin: Origin,
}

fn origin<T, C: Comparator<T>>(v: &[T], cmp: &C, key: usize, median: usize) -> Origin {
    if cmp.compare(&v[key], &v[median]) == Ordering::Less {
        Origin::Left
    } else {
        Origin::Right
    }
}

/// Block geometry shared by the selection sort helpers.
struct Blocks {
    keys: usize,
    start: usize,
    len: usize,
    rep: usize,
}

impl Blocks {
    #[inline]
    fn rep(&self, block: usize) -> usize {
        self.start + block * self.len + self.rep
    }

    /// Whether block `a` goes before block `b`: by representative, then by key.
    fn precedes<T, C: Comparator<T>>(&self, v: &[T], cmp: &C, a: usize, b: usize) -> bool {
        match cmp.compare(&v[self.rep(a)], &v[self.rep(b)]) {
            Ordering::Less => true,
            Ordering::Equal => cmp.compare(&v[self.keys + a], &v[self.keys + b]) == Ordering::Less,
            Ordering::Greater => false,
        }
    }

    /// The block in `lo..hi` that goes first, or `best` when none precedes it.
    fn select<T, C: Comparator<T>>(
        &self,
        v: &[T],
        cmp: &C,
        mut best: usize,
        lo: usize,
        hi: usize,
    ) -> usize {
        for block in lo..hi {
            if self.precedes(v, cmp, block, best) {
                best = block;
            }
        }
        best
    }

    fn swap<T>(&self, v: &mut [T], a: usize, b: usize, median: &mut usize) {
        swap_blocks_forwards(v, self.start + a * self.len, self.start + b * self.len, self.len);
        let (ka, kb) = (self.keys + a, self.keys + b);
        v.swap(ka, kb);
        if *median == ka {
            *median = kb;
        } else if *median == kb {
            *median = ka;
        }
    }
}

/// Selection-sorts `block_count` blocks at `start`, the first `left_blocks` of which form
/// the left run, mirroring every swap in the keys at `keys`. Blocks are ordered by their
/// head (or tail, when `by_tail`), ties broken by key. `median` follows the median key.
///
/// The left run and the right run are each already in order, so the sort works in phases:
/// 1. skip the prefix of the left run that precedes the first right block;
/// 2. fill the rest of the left run's slots, choosing among the displaced left blocks and
///    the next untouched right block;
/// 3. keep going while untouched right blocks remain, until no displaced block is left;
/// 4. plain selection over whatever remains once the right run is used up.
#[allow(clippy::too_many_arguments)]
pub(crate) fn sort_blocks<T, C: Comparator<T>>(
    v: &mut [T],
    cmp: &C,
    keys: usize,
    start: usize,
    block_count: usize,
    left_blocks: usize,
    block_len: usize,
    by_tail: bool,
    median: &mut usize,
) {
    if left_blocks == 0 || left_blocks >= block_count {
        return;
    }

    let blocks = Blocks {
        keys,
        start,
        len: block_len,
        rep: if by_tail { block_len - 1 } else { 0 },
    };

    // Phase one.
    let first_right = blocks.rep(left_blocks);
    let Some(first) = (0..left_blocks)
        .find(|&block| cmp.compare(&v[first_right], &v[blocks.rep(block)]) == Ordering::Less)
    else {
        return;
    };

    // Slots in `left_blocks..scrambled` hold displaced left blocks; from `scrambled` on,
    // the right run is untouched and still in order.
    let mut scrambled = left_blocks;
    let mut slot = first;

    // Phase two.
    while slot < left_blocks {
        let hi = (scrambled + 1).min(block_count);
        let best = blocks.select(v, cmp, slot, left_blocks, hi);
        if best != slot {
            blocks.swap(v, slot, best, median);
            if best == scrambled {
                scrambled += 1;
            }
        }
        slot += 1;
    }

    // Phase three.
    while slot < scrambled && scrambled < block_count {
        let best = blocks.select(v, cmp, slot, slot + 1, scrambled + 1);
        if best != slot {
            blocks.swap(v, slot, best, median);
            if best == scrambled {
                scrambled += 1;
            }
        }
        slot += 1;
    }

    if slot == scrambled {
        return;
    }

    // Phase four.
    while slot + 1 < block_count {
        let best = blocks.select(v, cmp, slot, slot + 1, block_count);
        if best != slot {
            blocks.swap(v, slot, best, median);
        }
        slot += 1;
    }
}

/// Number of trailing blocks that must join the final merge with the fragment of
/// `v[start + block_count * block_len..]` because their heads exceed its head.
pub(crate) fn count_last_merge_blocks<T, C: Comparator<T>>(
    v: &[T],
    cmp: &C,
    start: usize,
    block_count: usize,
    block_len: usize,
) -> usize {
    let fragment = start + block_count * block_len;
    let mut count = 0;
    let mut block = fragment;

    while count < block_count && cmp.compare(&v[fragment], &v[block - block_len]) == Ordering::Less {
        count += 1;
        block -= block_len;
    }
    count
}

/// Merges the fragment at `start` with the `right_len` elements after it into the scratch
/// `buffer_offset` before it, stopping once either side runs out.
fn local_merge_forwards<T, C: Comparator<T>, M: Shift<T>>(
    v: &mut [T],
    cmp: &C,
    mv: &M,
    start: usize,
    fragment: Fragment,
    right_len: usize,
    buffer_offset: usize,
) -> Fragment {
    let mut buffer = start - buffer_offset;
    let mut left = start;
    let middle = start + fragment.len;
    let mut right = middle;
    let end = middle + right_len;

    while left < middle && right < end {
        let ord = cmp.compare(&v[left], &v[right]);
        let take_left = match fragment.origin {
            Origin::Left => ord != Ordering::Greater,
            Origin::Right => ord == Ordering::Less,
        };

        if take_left {
            mv.shift(v, buffer, left);
            left += 1;
        } else {
            mv.shift(v, buffer, right);
            right += 1;
        }
        buffer += 1;
    }

    if left < middle {
        let len = middle - left;
        mv.shift_backwards(v, end - len, left, len);
        Fragment { len, origin: fragment.origin }
    } else {
        Fragment { len: end - right, origin: fragment.origin.flip() }
    }
}

/// Merges the block-sorted window at `start` front to back into the block of scratch
/// before it, leaving the scratch at the window's tail.
///
/// When `last_len` is nonzero, a ragged fragment of that length follows the blocks,
/// preceded by `last_merge_blocks` left blocks that merge with it directly.
#[allow(clippy::too_many_arguments)]
pub(crate) fn merge_blocks_forwards<T, C: Comparator<T>, M: Shift<T>>(
    v: &mut [T],
    cmp: &C,
    mv: &M,
    keys: usize,
    median: usize,
    start: usize,
    block_count: usize,
    block_len: usize,
    last_merge_blocks: usize,
    last_len: usize,
) {
    let mut fragment = Fragment {
        len: block_len,
        origin: origin(v, cmp, keys, median),
    };
    let mut next = start + block_len;

    for key in keys + 1..keys + block_count {
        let curr = next - fragment.len;
        if origin(v, cmp, key, median) == fragment.origin {
            mv.shift_forwards(v, curr - block_len, curr, fragment.len);
            fragment.len = block_len;
        } else {
            fragment = local_merge_forwards(v, cmp, mv, curr, fragment, block_len, block_len);
        }
        next += block_len;
    }

    let curr = next - fragment.len;
    if last_len != 0 {
        let tail = block_len * last_merge_blocks;
        if fragment.origin == Origin::Right {
            mv.shift_forwards(v, curr - block_len, curr, fragment.len);
            merge_forwards(v, cmp, mv, next, tail, last_len, block_len);
        } else {
            merge_forwards(v, cmp, mv, curr, fragment.len + tail, last_len, block_len);
        }
    } else {
        mv.shift_forwards(v, curr - block_len, curr, fragment.len);
    }
}

/// Merges block `start` (length `block_len`) with the fragment right after it into the
/// scratch that follows the fragment, from the back.
fn local_merge_backwards<T, C: Comparator<T>, M: Shift<T>>(
    v: &mut [T],
    cmp: &C,
    mv: &M,
    start: usize,
    block_len: usize,
    fragment: Fragment,
    buffer_offset: usize,
) -> Fragment {
    let mut left = start + block_len;
    let middle = left;
    let mut right = middle + fragment.len;
    let mut buffer = right + buffer_offset;

    while left > start && right > middle {
        let ord = cmp.compare(&v[left - 1], &v[right - 1]);
        let take_left = match fragment.origin {
            Origin::Right => ord == Ordering::Greater,
            Origin::Left => ord != Ordering::Less,
        };

        if take_left {
            mv.shift(v, buffer - 1, left - 1);
            left -= 1;
        } else {
            mv.shift(v, buffer - 1, right - 1);
            right -= 1;
        }
        buffer -= 1;
    }

    if right > middle {
        let len = right - middle;
        mv.shift_forwards(v, start, middle, len);
        Fragment { len, origin: fragment.origin }
    } else {
        Fragment { len: left - start, origin: fragment.origin.flip() }
    }
}

/// Mirror of [`merge_blocks_forwards`] for windows whose scratch block sits after them.
///
/// Blocks must have been sorted by tail. A ragged fragment of `last_len` elements from the
/// right run may follow the blocks; it is simply the first pending fragment.
#[allow(clippy::too_many_arguments)]
pub(crate) fn merge_blocks_backwards<T, C: Comparator<T>, M: Shift<T>>(
    v: &mut [T],
    cmp: &C,
    mv: &M,
    keys: usize,
    median: usize,
    start: usize,
    block_count: usize,
    block_len: usize,
    last_len: usize,
) {
    let mut fragment = Fragment {
        len: last_len,
        origin: Origin::Right,
    };

    for block in (0..block_count).rev() {
        let block_start = start + block * block_len;
        let pending = block_start + block_len;
        let block_origin = origin(v, cmp, keys + block, median);

        if block_origin == fragment.origin {
            mv.shift_backwards(v, pending + block_len, pending, fragment.len);
            fragment = Fragment {
                len: block_len,
                origin: block_origin,
            };
        } else {
            fragment = local_merge_backwards(v, cmp, mv, block_start, block_len, fragment, block_len);
        }
    }

    mv.shift_backwards(v, start + block_len, start, fragment.len);
}

/// Rotation-based local merge of the fragment at `start` with the `right_len` elements
/// after it. Whatever is left over ends up at the back.
fn local_lazy_merge<T, C: Comparator<T>>(
    v: &mut [T],
    cmp: &C,
    mut start: usize,
    fragment: Fragment,
    mut right_len: usize,
) -> Fragment {
    let mut left_len = fragment.len;
    let mut middle = start + left_len;

    let overlaps = match fragment.origin {
        Origin::Left => cmp.compare(&v[middle - 1], &v[middle]) == Ordering::Greater,
        Origin::Right => cmp.compare(&v[middle - 1], &v[middle]) != Ordering::Less,
    };

    if overlaps {
        while left_len != 0 {
            let right = &v[middle..middle + right_len];
            let merge_len = match fragment.origin {
                Origin::Left => lower_bound(right, &v[start], cmp),
                Origin::Right => upper_bound(right, &v[start], cmp),
            };

            if merge_len != 0 {
                rotate(v, start, left_len, merge_len);
                start += merge_len;
                right_len -= merge_len;
            }
            middle += merge_len;

            if right_len == 0 {
                return Fragment {
                    len: left_len,
                    origin: fragment.origin,
                };
            }

            loop {
                start += 1;
                left_len -= 1;
                if left_len == 0 {
                    break;
                }
                let ord = cmp.compare(&v[start], &v[middle]);
                let stays = match fragment.origin {
                    Origin::Left => ord != Ordering::Greater,
                    Origin::Right => ord == Ordering::Less,
                };
                if !stays {
                    break;
                }
            }
        }
    }

    Fragment {
        len: right_len,
        origin: fragment.origin.flip(),
    }
}

/// Bufferless variant of [`merge_blocks_forwards`]: every local merge is done by rotation
/// and nothing moves between blocks of the same origin.
#[allow(clippy::too_many_arguments)]
pub(crate) fn lazy_merge_blocks<T, C: Comparator<T>>(
    v: &mut [T],
    cmp: &C,
    keys: usize,
    median: usize,
    start: usize,
    block_count: usize,
    block_len: usize,
    last_merge_blocks: usize,
    last_len: usize,
) {
    let mut fragment = Fragment {
        len: block_len,
        origin: origin(v, cmp, keys, median),
    };
    let mut next = start + block_len;

    for key in keys + 1..keys + block_count {
        let curr = next - fragment.len;
        if origin(v, cmp, key, median) == fragment.origin {
            fragment.len = block_len;
        } else if fragment.len != 0 {
            fragment = local_lazy_merge(v, cmp, curr, fragment, block_len);
        }
        next += block_len;
    }

    if last_len != 0 {
        let tail = block_len * last_merge_blocks;
        if fragment.origin == Origin::Right {
            lazy_merge(v, cmp, next, tail, last_len);
        } else {
            lazy_merge(v, cmp, next - fragment.len, fragment.len + tail, last_len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Swapping;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    fn natural(a: &u32, b: &u32) -> Ordering {
        a.cmp(b)
    }

    /// Keys `0..block_count` followed by the blocks of two runs built from `left` and `right`.
    fn window(left: &[u32], right: &[u32], block_len: usize) -> (Vec<u32>, usize) {
        let keys = (left.len() + right.len()) / block_len;
        let mut v: Vec<u32> = (0..keys as u32).collect();
        v.extend_from_slice(left);
        v.extend_from_slice(right);
        (v, keys)
    }

    fn block_heads(v: &[u32], start: usize, count: usize, block_len: usize) -> Vec<u32> {
        (0..count).map(|b| v[start + b * block_len]).collect()
    }

    #[test]
    fn sort_blocks_orders_heads_and_tracks_keys() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let block_len = 4;
            let left_blocks = rng.random_range(1..6);
            let right_blocks = rng.random_range(1..6);
            let mut left: Vec<u32> = (0..left_blocks * block_len)
                .map(|_| rng.random_range(0..40))
                .collect();
            let mut right: Vec<u32> = (0..right_blocks * block_len)
                .map(|_| rng.random_range(0..40))
                .collect();
            left.sort();
            right.sort();

            let (mut v, keys) = window(&left, &right, block_len);
            let block_count = left_blocks + right_blocks;
            let mut median = left_blocks;
            let before = v.clone();

            sort_blocks(&mut v, &natural, 0, keys, block_count, left_blocks, block_len, false, &mut median);

            // Heads ordered, ties broken by key.
            let heads = block_heads(&v, keys, block_count, block_len);
            for b in 1..block_count {
                assert!(
                    heads[b - 1] < heads[b] || (heads[b - 1] == heads[b] && v[b - 1] < v[b]),
                    "{heads:?} keys {:?}",
                    &v[..keys]
                );
            }
            // Each block still carries its own key.
            for b in 0..block_count {
                let key = v[b] as usize;
                let orig = &before[keys + key * block_len..keys + (key + 1) * block_len];
                assert_eq!(&v[keys + b * block_len..keys + (b + 1) * block_len], orig);
            }
            assert_eq!(v[median], left_blocks as u32);
        }
    }

    #[test]
    fn sort_blocks_by_tail() {
        let left = [0, 1, 2, 9, 10, 11, 12, 20];
        let right = [3, 4, 5, 6, 13, 14, 15, 30];
        let (mut v, keys) = window(&left, &right, 4);
        let mut median = 2;

        sort_blocks(&mut v, &natural, 0, keys, 4, 2, 4, true, &mut median);
        assert_eq!(&v[..4], &[2, 0, 1, 3]);
        assert_eq!(v[median], 2);
    }

    #[test]
    fn sort_blocks_already_ordered() {
        let left = [0, 1, 2, 3, 4, 5, 6, 7];
        let right = [8, 9, 10, 11, 12, 13, 14, 15];
        let (mut v, keys) = window(&left, &right, 4);
        let before = v.clone();
        let mut median = 2;

        sort_blocks(&mut v, &natural, 0, keys, 4, 2, 4, false, &mut median);
        assert_eq!(v, before);
        assert_eq!(median, 2);
    }

    #[test]
    fn counts_trailing_blocks() {
        let v = [1u32, 2, 10, 11, 12, 13, 5];
        assert_eq!(count_last_merge_blocks(&v, &natural, 0, 3, 2), 2);
        assert_eq!(count_last_merge_blocks(&v, &natural, 0, 1, 2), 0);
    }

    #[test]
    fn block_merge_forwards_window() {
        // Scratch block, then a block-sorted window of two runs.
        let block_len = 4;
        let left = [1, 3, 5, 7, 20, 21, 22, 23];
        let right = [2, 4, 6, 8, 9, 10, 11, 12];
        let (mut v, keys) = window(&left, &right, block_len);
        let mut median = 2;
        let mut data: Vec<u32> = vec![100, 101, 102, 103];
        data.extend_from_slice(&v[keys..]);
        v.truncate(keys);
        let scratch_at = v.len();
        v.extend(data);
        let start = scratch_at + block_len;

        sort_blocks(&mut v, &natural, 0, start, 4, 2, block_len, false, &mut median);
        merge_blocks_forwards(&mut v, &natural, &Swapping, 0, median, start, 4, block_len, 0, 0);

        let mut expected: Vec<u32> = left.iter().chain(right.iter()).copied().collect();
        expected.sort();
        assert_eq!(&v[scratch_at..scratch_at + 16], &expected[..]);
        let mut scratch = v[scratch_at + 16..].to_vec();
        scratch.sort();
        assert_eq!(scratch, vec![100, 101, 102, 103]);
    }

    #[test]
    fn block_merge_backwards_window() {
        let block_len = 4;
        let left = [1, 3, 5, 7, 20, 21, 22, 23];
        let right = [2, 4, 6, 8, 9, 10, 11, 12];
        let (mut v, keys) = window(&left, &right, block_len);
        let mut median = 2;
        v.extend_from_slice(&[100, 101, 102, 103]);
        let start = keys;

        sort_blocks(&mut v, &natural, 0, start, 4, 2, block_len, true, &mut median);
        merge_blocks_backwards(&mut v, &natural, &Swapping, 0, median, start, 4, block_len, 0);

        let mut expected: Vec<u32> = left.iter().chain(right.iter()).copied().collect();
        expected.sort();
        assert_eq!(&v[start + block_len..], &expected[..]);
        let mut scratch = v[start..start + block_len].to_vec();
        scratch.sort();
        assert_eq!(scratch, vec![100, 101, 102, 103]);
    }

    #[test]
    fn lazy_block_merge_window() {
        let block_len = 4;
        let left = [1, 3, 5, 7, 20, 21, 22, 23];
        let right = [2, 4, 6, 8, 9, 10, 11, 12];
        let (mut v, keys) = window(&left, &right, block_len);
        let mut median = 2;
        let start = keys;

        sort_blocks(&mut v, &natural, 0, start, 4, 2, block_len, false, &mut median);
        lazy_merge_blocks(&mut v, &natural, 0, median, start, 4, block_len, 0, 0);

        let mut expected: Vec<u32> = left.iter().chain(right.iter()).copied().collect();
        expected.sort();
        assert_eq!(&v[start..], &expected[..]);
    }
}

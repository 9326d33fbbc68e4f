//! Merge passes over the whole data range at a fixed run length.
//!
//! Each pass merges neighbouring runs of `run_len` into runs of `2 * run_len`, one window
//! at a time: block-sort the window, block-merge it, put its keys back in order. The
//! buffered passes alternate direction. A forward pass expects the scratch block in front
//! of the data and leaves it behind; a backward pass expects it behind and leaves it in
//! front. The bufferless pass merges by rotation and moves nothing.

use crate::blocks::{
    count_last_merge_blocks, lazy_merge_blocks, merge_blocks_backwards, merge_blocks_forwards,
    sort_blocks,
};
use crate::build::merge_forwards;
use crate::core::Comparator;
use crate::keys::{lazy_sort_keys, sort_keys};
use crate::lazy::lazy_merge;
use crate::ops::{Shift, rotate};

/// Geometry of one combine pass.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Pass {
    /// Index of the first key.
    pub keys: usize,
    /// Index of the first data element.
    pub start: usize,
    /// Number of data elements.
    pub len: usize,
    /// Length of the sorted runs going in.
    pub run_len: usize,
    pub block_len: usize,
}

impl Pass {
    fn full_merge(&self) -> usize {
        2 * self.run_len
    }

    fn left_blocks(&self) -> usize {
        self.run_len / self.block_len
    }
}

/// Forward pass: scratch block at `start - block_len` in, at `start + len - block_len` out.
pub(crate) fn combine_forwards<T, C: Comparator<T>, M: Shift<T>>(
    v: &mut [T],
    cmp: &C,
    mv: &M,
    pass: Pass,
) {
    let Pass {
        keys,
        start,
        len,
        run_len,
        block_len,
    } = pass;
    let full = pass.full_merge();
    let left_blocks = pass.left_blocks();
    let end = start + len;

    let mut offset = start;
    while offset + full <= end {
        let block_count = full / block_len;
        let mut median = keys + left_blocks;

        sort_blocks(v, cmp, keys, offset, block_count, left_blocks, block_len, false, &mut median);
        merge_blocks_forwards(v, cmp, mv, keys, median, offset, block_count, block_len, 0, 0);
        sort_keys(v, cmp, keys, block_count, offset + full - block_len, median);

        offset += full;
    }

    let last = end - offset;
    if last > run_len && last - run_len < block_len {
        // The right run does not fill a block.
        merge_forwards(v, cmp, mv, offset, run_len, last - run_len, block_len);
    } else if last > run_len {
        let block_count = last / block_len;
        let last_len = last % block_len;
        let mut median = keys + left_blocks;

        sort_blocks(v, cmp, keys, offset, block_count, left_blocks, block_len, false, &mut median);

        let last_merge_blocks = if last_len != 0 {
            count_last_merge_blocks(v, cmp, offset, block_count, block_len)
        } else {
            0
        };
        let smart_merges = block_count - last_merge_blocks;

        if smart_merges == 0 {
            merge_forwards(v, cmp, mv, offset, last_merge_blocks * block_len, last_len, block_len);
        } else {
            merge_blocks_forwards(
                v,
                cmp,
                mv,
                keys,
                median,
                offset,
                smart_merges,
                block_len,
                last_merge_blocks,
                last_len,
            );
        }
        sort_keys(v, cmp, keys, block_count, offset + last - block_len, median);
    } else if last > 0 {
        // A lone run: slide it along with the scratch.
        mv.shift_forwards(v, offset - block_len, offset, last);
    }
}

/// Backward pass: scratch block at `start + len` in, at `start` out, with the data one
/// block further right.
pub(crate) fn combine_backwards<T, C: Comparator<T>, M: Shift<T>>(
    v: &mut [T],
    cmp: &C,
    mv: &M,
    pass: Pass,
) {
    let Pass {
        keys,
        start,
        len,
        run_len,
        block_len,
    } = pass;
    let full = pass.full_merge();
    let left_blocks = pass.left_blocks();
    let full_merges = len / full;
    let last = len % full;

    let mut offset = start + full_merges * full;
    if last > run_len && last - run_len < block_len {
        // The left run is longer than the scratch gap, so a buffered merge would overrun
        // the right run. Merge by rotation, then move the scratch to the front.
        lazy_merge(v, cmp, offset, run_len, last - run_len);
        rotate(v, offset, last, block_len);
    } else if last > run_len {
        let block_count = last / block_len;
        let last_len = last % block_len;
        let mut median = keys + left_blocks;

        sort_blocks(v, cmp, keys, offset, block_count, left_blocks, block_len, true, &mut median);
        merge_blocks_backwards(v, cmp, mv, keys, median, offset, block_count, block_len, last_len);
        sort_keys(v, cmp, keys, block_count, offset, median);
    } else if last > 0 {
        mv.shift_backwards(v, offset + block_len, offset, last);
    }

    let block_count = full / block_len;
    for _ in 0..full_merges {
        offset -= full;
        let mut median = keys + left_blocks;

        sort_blocks(v, cmp, keys, offset, block_count, left_blocks, block_len, true, &mut median);
        merge_blocks_backwards(v, cmp, mv, keys, median, offset, block_count, block_len, 0);
        sort_keys(v, cmp, keys, block_count, offset, median);
    }
}

/// Bufferless pass: merges in place by rotation, so the data does not move as a whole.
pub(crate) fn combine_lazy<T, C: Comparator<T>>(v: &mut [T], cmp: &C, pass: Pass) {
    let Pass {
        keys,
        start,
        len,
        run_len,
        block_len,
    } = pass;
    let full = pass.full_merge();
    let left_blocks = pass.left_blocks();
    let end = start + len;

    let mut offset = start;
    while offset + full <= end {
        let block_count = full / block_len;
        let mut median = keys + left_blocks;

        sort_blocks(v, cmp, keys, offset, block_count, left_blocks, block_len, false, &mut median);
        lazy_merge_blocks(v, cmp, keys, median, offset, block_count, block_len, 0, 0);
        lazy_sort_keys(v, cmp, keys, block_count, median);

        offset += full;
    }

    let last = end - offset;
    if last > run_len && last - run_len < block_len {
        lazy_merge(v, cmp, offset, run_len, last - run_len);
    } else if last > run_len {
        let block_count = last / block_len;
        let last_len = last % block_len;
        let mut median = keys + left_blocks;

        sort_blocks(v, cmp, keys, offset, block_count, left_blocks, block_len, false, &mut median);

        let last_merge_blocks = if last_len != 0 {
            count_last_merge_blocks(v, cmp, offset, block_count, block_len)
        } else {
            0
        };
        let smart_merges = block_count - last_merge_blocks;

        if smart_merges == 0 {
            lazy_merge(v, cmp, offset, last_merge_blocks * block_len, last_len);
        } else {
            lazy_merge_blocks(
                v,
                cmp,
                keys,
                median,
                offset,
                smart_merges,
                block_len,
                last_merge_blocks,
                last_len,
            );
        }
        lazy_sort_keys(v, cmp, keys, block_count, median);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Swapping;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use std::cmp::Ordering;

    fn by_key(a: &(u16, usize), b: &(u16, usize)) -> Ordering {
        a.0.cmp(&b.0)
    }

    /// Distinct keys, then a scratch block, then `len` tagged elements sorted in runs.
    fn layout(
        rng: &mut StdRng,
        key_count: usize,
        block_len: usize,
        len: usize,
        run_len: usize,
    ) -> Vec<(u16, usize)> {
        let mut v: Vec<(u16, usize)> = (0..key_count).map(|i| (i as u16, usize::MAX)).collect();
        v.extend((0..block_len).map(|i| (60_000, usize::MAX - 1 - i)));
        let mut data: Vec<(u16, usize)> = (0..len).map(|i| (rng.random_range(0..50), i)).collect();
        for run in data.chunks_mut(run_len) {
            run.sort_by_key(|p| p.0);
        }
        v.extend(data);
        v
    }

    fn expected_runs(data: &[(u16, usize)], run_len: usize) -> Vec<(u16, usize)> {
        let mut out = data.to_vec();
        for run in out.chunks_mut(run_len) {
            run.sort_by_key(|p| p.0);
        }
        out
    }

    #[test]
    fn forward_then_backward_passes() {
        let mut rng = StdRng::seed_from_u64(5);
        let block_len = 8;
        let key_count = 32;
        for len in [64, 100, 120, 127, 128, 129, 200, 250] {
            let mut run_len = 2 * block_len;
            let mut v = layout(&mut rng, key_count, block_len, len, run_len);
            let data_start = key_count + block_len;
            let mut forwards = true;

            while len > run_len {
                let pass = Pass {
                    keys: 0,
                    start: if forwards { data_start } else { data_start - block_len },
                    len,
                    run_len,
                    block_len,
                };
                let before = if forwards {
                    v[data_start..data_start + len].to_vec()
                } else {
                    v[data_start - block_len..data_start - block_len + len].to_vec()
                };

                if forwards {
                    combine_forwards(&mut v, &by_key, &Swapping, pass);
                } else {
                    combine_backwards(&mut v, &by_key, &Swapping, pass);
                }
                forwards = !forwards;
                run_len *= 2;

                let data = if forwards {
                    &v[data_start..data_start + len]
                } else {
                    &v[data_start - block_len..data_start - block_len + len]
                };
                assert_eq!(data, &expected_runs(&before, run_len)[..], "len={len} run={run_len}");
                assert_eq!(
                    &v[..key_count],
                    &(0..key_count as u16).map(|i| (i, usize::MAX)).collect::<Vec<_>>()[..]
                );
            }
        }
    }

    #[test]
    fn backward_pass_with_short_right_run() {
        let block_len = 8;
        let key_count = 16;
        let run_len = 32;
        // Reverse-sorted values, cut into a run of 32 and a run of 3, each sorted.
        let mut data: Vec<(u16, usize)> = (0..35).map(|i| (100 - i as u16, i)).collect();
        data[..run_len].sort_by_key(|p| p.0);
        data[run_len..].sort_by_key(|p| p.0);

        let mut v: Vec<(u16, usize)> = (0..key_count).map(|i| (i as u16, usize::MAX)).collect();
        v.extend(data.iter().copied());
        v.extend((0..block_len).map(|i| (60_000, usize::MAX - 1 - i)));

        let pass = Pass {
            keys: 0,
            start: key_count,
            len: data.len(),
            run_len,
            block_len,
        };
        combine_backwards(&mut v, &by_key, &Swapping, pass);

        let data_start = key_count + block_len;
        assert_eq!(&v[data_start..], &expected_runs(&data, 2 * run_len)[..]);
        assert!(v[key_count..data_start].iter().all(|p| p.0 == 60_000));
    }

    #[test]
    fn lazy_passes() {
        let mut rng = StdRng::seed_from_u64(6);
        let key_len = 8;
        for len in [40, 64, 65, 100, 130, 255] {
            let mut run_len = 2 * key_len;
            let mut v = layout(&mut rng, key_len, 0, len, run_len);

            while len > run_len {
                let before = v[key_len..].to_vec();
                let pass = Pass {
                    keys: 0,
                    start: key_len,
                    len,
                    run_len,
                    block_len: 2 * run_len / key_len,
                };
                combine_lazy(&mut v, &by_key, pass);
                run_len *= 2;

                assert_eq!(&v[key_len..], &expected_runs(&before, run_len)[..], "len={len}");
            }
        }
    }
}

//! Public entry points and strategy selection.
//!
//! Every call gathers distinct keys at the front of the range first. How many it finds
//! decides the rest:
//! - **Blocks**: enough keys for a full scrolling buffer. Runs are built behind the buffer,
//!   then merged by block selection sort and buffered block merges, alternating direction.
//! - **LazyBlocks**: some keys, but not enough. The keys double as a small in-place buffer
//!   for building runs; merging is done by rotation.
//! - **Rotations**: two or three distinct values. Rotation merge sort over runs of sixteen.
//! - **Uniform**: all elements compare equal, nothing to do.
//!
//! The main entry points are [`grailsort`] and [`grailsort_by`].

use crate::build::{build_blocks, prev_power_of_two};
use crate::combine::{Pass, combine_backwards, combine_forwards, combine_lazy};
use crate::core::{Buffer, Comparator, Natural, NoBuffer, STATIC_BUFFER_LEN, SortError};
use crate::keys::collect_keys;
use crate::lazy::{
    insertion_sort, lazy_merge, lazy_merge_buffer_backwards, lazy_stable_sort, shell_sort,
};
use crate::ops::{Copying, Shift, Swapping};
use log::{debug, trace};

/// Ranges shorter than this are insertion sorted without collecting keys.
const INSERTION_SORT_THRESHOLD: usize = 16;

/// Smallest number of distinct keys the block-based strategies can work with.
const MIN_KEYS: usize = 4;

/// The plan chosen for one sort, from the range length and the number of distinct keys found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Too short to bother with keys.
    Insertion,
    /// One distinct value: already sorted.
    Uniform,
    /// Two or three distinct values: rotation merge sort.
    Rotations,
    /// Fewer keys than a full buffer needs. `key_len` keys serve as block tags and, while
    /// runs are built, as scratch.
    LazyBlocks { key_len: usize },
    /// A full complement of keys plus a scrolling buffer of `block_len`.
    Blocks { key_len: usize, block_len: usize },
}

impl Strategy {
    /// Picks the strategy for a range of `len` elements holding `keys_found` distinct keys.
    ///
    /// ```
    /// use holygrail::Strategy;
    ///
    /// assert_eq!(Strategy::select(10, 10), Strategy::Insertion);
    /// assert_eq!(Strategy::select(100, 1), Strategy::Uniform);
    /// assert_eq!(Strategy::select(100, 3), Strategy::Rotations);
    /// assert_eq!(Strategy::select(100, 7), Strategy::LazyBlocks { key_len: 4 });
    /// assert_eq!(Strategy::select(100, 24), Strategy::Blocks { key_len: 7, block_len: 16 });
    /// ```
    pub fn select(len: usize, keys_found: usize) -> Self {
        if len < INSERTION_SORT_THRESHOLD {
            return Strategy::Insertion;
        }
        if keys_found <= 1 {
            return Strategy::Uniform;
        }
        if keys_found < MIN_KEYS {
            return Strategy::Rotations;
        }

        let block_len = ideal_buffer_len(len);
        let key_len = len.div_ceil(block_len);
        if keys_found >= key_len + block_len {
            Strategy::Blocks { key_len, block_len }
        } else {
            Strategy::LazyBlocks {
                key_len: prev_power_of_two(keys_found.min(block_len)),
            }
        }
    }
}

/// Smallest power of two whose square is at least `len`.
///
/// This is the block length of a full-buffer sort, and the buffer size at which
/// [`grailsort_with_buffer_by`] does all its merging by copying.
///
/// ```
/// assert_eq!(holygrail::ideal_buffer_len(0), 1);
/// assert_eq!(holygrail::ideal_buffer_len(16), 4);
/// assert_eq!(holygrail::ideal_buffer_len(17), 8);
/// assert_eq!(holygrail::ideal_buffer_len(1_000_000), 1024);
/// ```
pub fn ideal_buffer_len(len: usize) -> usize {
    let mut block_len = 1usize;
    while block_len.saturating_mul(block_len) < len {
        block_len *= 2;
    }
    block_len
}

/// Number of distinct keys a full-buffer sort of `len` elements collects.
fn ideal_key_count(len: usize) -> usize {
    let block_len = ideal_buffer_len(len);
    block_len + len.div_ceil(block_len)
}

/// Sorts a slice in-place by [`Ord`], stably and without allocating.
///
/// # Examples
///
/// ```
/// use holygrail::grailsort;
///
/// let mut data = vec![5, 3, 1, 4, 1, 5, 9, 2, 6];
/// grailsort(&mut data);
///
/// assert_eq!(data, vec![1, 1, 2, 3, 4, 5, 5, 6, 9]);
/// ```
pub fn grailsort<T: Ord>(v: &mut [T]) {
    sort_slice(v, &Natural, &mut NoBuffer);
}

/// Sorts a slice in-place with a comparator, stably and without allocating.
///
/// # Arguments
///
/// * `v` - The slice to sort.
/// * `cmp` - Any [`Comparator`], including closures `Fn(&T, &T) -> Ordering`.
///
/// # Examples
///
/// ```
/// use holygrail::grailsort_by;
///
/// let mut pairs = vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')];
/// grailsort_by(&mut pairs, |a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0));
///
/// assert_eq!(pairs, vec![(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
/// ```
pub fn grailsort_by<T, C: Comparator<T>>(v: &mut [T], cmp: C) {
    sort_slice(v, &cmp, &mut NoBuffer);
}

/// Like [`grailsort`], lending `buffer` as scratch space.
///
/// The result is the same for any buffer; a larger one (up to
/// [`ideal_buffer_len`]`(v.len())`) only replaces swaps with clones. The buffer's contents
/// afterwards are unspecified. See [`grailsort_with_buffer_by`] for what a panicking
/// comparison leaves behind.
///
/// ```
/// use holygrail::grailsort_with_buffer;
///
/// let mut data: Vec<u32> = (0..1000).rev().collect();
/// let mut scratch = vec![0; 32];
/// grailsort_with_buffer(&mut data, &mut scratch);
///
/// assert!(data.windows(2).all(|w| w[0] <= w[1]));
/// ```
pub fn grailsort_with_buffer<T: Ord + Clone>(v: &mut [T], buffer: &mut [T]) {
    sort_slice(v, &Natural, buffer);
}

/// Like [`grailsort_by`], lending `buffer` as scratch space.
///
/// # Panics
///
/// A panic raised by `cmp` propagates unchanged. Without a buffer the slice is then still
/// a permutation of the input. With a buffer, merges write clones over scratch slots
/// whose originals are held in `buffer`, so after a panic some elements of `v` may be
/// replaced by clones of others. Nothing is dropped twice or leaked either way.
pub fn grailsort_with_buffer_by<T: Clone, C: Comparator<T>>(v: &mut [T], buffer: &mut [T], cmp: C) {
    sort_slice(v, &cmp, buffer);
}

/// Sorts with a freshly allocated buffer of [`STATIC_BUFFER_LEN`] elements (fewer for
/// shorter slices).
pub fn grailsort_static_by<T: Clone, C: Comparator<T>>(v: &mut [T], cmp: C) {
    let mut buffer = v[..v.len().min(STATIC_BUFFER_LEN)].to_vec();
    sort_slice(v, &cmp, buffer.as_mut_slice());
}

/// Sorts with a freshly allocated buffer of [`ideal_buffer_len`] elements.
pub fn grailsort_dynamic_by<T: Clone, C: Comparator<T>>(v: &mut [T], cmp: C) {
    let len = v.len();
    let mut buffer = v[..ideal_buffer_len(len).min(len)].to_vec();
    sort_slice(v, &cmp, buffer.as_mut_slice());
}

/// Sorts `v[start..start + len]`, leaving the rest of `v` untouched.
///
/// Pass [`NoBuffer`] for a strictly in-place sort, or a `&mut [T]` to lend scratch space.
///
/// # Errors
///
/// Returns [`SortError::RangeOutOfBounds`] if the range does not fit in `v`. Nothing is
/// compared or moved in that case.
///
/// # Examples
///
/// ```
/// use holygrail::{grailsort_range, NoBuffer, SortError};
///
/// let mut data = vec![9, 4, 3, 2, 1, 0];
/// grailsort_range(&mut data, 1, 4, |a: &i32, b: &i32| a.cmp(b), &mut NoBuffer)?;
/// assert_eq!(data, vec![9, 1, 2, 3, 4, 0]);
///
/// let err = grailsort_range(&mut data, 4, 4, |a: &i32, b: &i32| a.cmp(b), &mut NoBuffer);
/// assert!(err.is_err());
/// # Ok::<(), SortError>(())
/// ```
pub fn grailsort_range<T, C, B>(
    v: &mut [T],
    start: usize,
    len: usize,
    cmp: C,
    buffer: &mut B,
) -> Result<(), SortError>
where
    C: Comparator<T>,
    B: Buffer<T> + ?Sized,
{
    let end = start
        .checked_add(len)
        .filter(|&end| end <= v.len())
        .ok_or(SortError::RangeOutOfBounds {
            start,
            len,
            slice_len: v.len(),
        })?;

    sort_slice(&mut v[start..end], &cmp, buffer);
    Ok(())
}

fn sort_slice<T, C, B>(v: &mut [T], cmp: &C, ext: &mut B)
where
    C: Comparator<T>,
    B: Buffer<T> + ?Sized,
{
    let len = v.len();
    if len < 2 {
        return;
    }
    if len < INSERTION_SORT_THRESHOLD {
        insertion_sort(v, cmp, 0, len);
        return;
    }

    let keys_found = collect_keys(v, ideal_key_count(len), cmp);
    let strategy = Strategy::select(len, keys_found);
    debug!(
        "grailsort: len={len} keys_found={keys_found} strategy={strategy:?} external_buffer={}",
        ext.capacity()
    );

    match strategy {
        Strategy::Insertion => insertion_sort(v, cmp, 0, len),
        Strategy::Uniform => {}
        Strategy::Rotations => lazy_stable_sort(v, cmp, 0, len),
        Strategy::LazyBlocks { key_len } => lazy_block_sort(v, cmp, key_len),
        Strategy::Blocks { key_len, block_len } => scrolling_sort(v, cmp, ext, key_len, block_len),
    }
}

/// Full-buffer sort. Layout: keys, scrolling buffer, data.
fn scrolling_sort<T, C, B>(v: &mut [T], cmp: &C, ext: &mut B, key_len: usize, block_len: usize)
where
    C: Comparator<T>,
    B: Buffer<T> + ?Sized,
{
    let data_start = key_len + block_len;
    let data_len = v.len() - data_start;

    build_blocks(v, cmp, ext, data_start, data_len, block_len);

    let buffer_in_front = if ext.capacity() >= block_len {
        ext.stash(&v[key_len..data_start]);
        let in_front = combine(v, cmp, &Copying::<B>::new(), key_len, data_len, block_len);
        let scratch = if in_front { key_len } else { key_len + data_len };
        ext.restore(&mut v[scratch..scratch + block_len]);
        in_front
    } else {
        combine(v, cmp, &Swapping, key_len, data_len, block_len)
    };

    // Keys and buffer are all distinct, so the unstable shell sort is safe on them.
    if buffer_in_front {
        shell_sort(v, cmp, 0, data_start);
        lazy_merge(v, cmp, 0, data_start, data_len);
    } else {
        shell_sort(v, cmp, 0, key_len);
        shell_sort(v, cmp, key_len + data_len, block_len);
        lazy_merge(v, cmp, 0, key_len, data_len);
        lazy_merge_buffer_backwards(v, cmp, 0, key_len + data_len, block_len);
    }
}

/// Runs the buffered combine passes until one run is left. Returns whether the scrolling
/// buffer ended up in front of the data.
fn combine<T, C: Comparator<T>, M: Shift<T>>(
    v: &mut [T],
    cmp: &C,
    mv: &M,
    key_len: usize,
    data_len: usize,
    block_len: usize,
) -> bool {
    let mut run_len = 2 * block_len;
    let mut forwards = true;

    while data_len > run_len {
        trace!("combine pass: run_len={run_len} forwards={forwards}");
        let start = if forwards { key_len + block_len } else { key_len };
        let pass = Pass {
            keys: 0,
            start,
            len: data_len,
            run_len,
            block_len,
        };

        if forwards {
            combine_forwards(v, cmp, mv, pass);
        } else {
            combine_backwards(v, cmp, mv, pass);
        }
        forwards = !forwards;
        run_len *= 2;
    }
    forwards
}

/// Key-starved sort. Layout: `key_len` keys, then data.
fn lazy_block_sort<T, C: Comparator<T>>(v: &mut [T], cmp: &C, key_len: usize) {
    let data_len = v.len() - key_len;

    build_blocks(v, cmp, &mut NoBuffer, key_len, data_len, key_len);
    // Building scrambled the keys.
    shell_sort(v, cmp, 0, key_len);

    let mut run_len = 2 * key_len;
    while data_len > run_len {
        let block_len = 2 * run_len / key_len;
        trace!("lazy combine pass: run_len={run_len} block_len={block_len}");
        combine_lazy(
            v,
            cmp,
            Pass {
                keys: 0,
                start: key_len,
                len: data_len,
                run_len,
                block_len,
            },
        );
        run_len *= 2;
    }

    lazy_merge(v, cmp, 0, key_len, data_len);
}

//! The host kernel library.
//!
//! Free batch functions over raw slices, dispatched by [`BackendId`]. Each
//! kernel writes exactly one output buffer and raises `IndexError` for
//! out-of-bounds reads instead of trusting its caller.

use std::cmp::Ordering;

use itertools::Itertools;
use jagged_buffer::{Alignment, Buffer, BufferMut, ByteBuffer, ByteBufferMut};
use jagged_dtype::NativeDType;
use jagged_error::{JaggedResult, jagged_bail, jagged_err};
use num_traits::AsPrimitive;

use super::BackendId;

/// Alignment of every kernel-allocated data buffer, wide enough for any
/// dtype to be reinterpreted over it.
pub const ALLOC_ALIGNMENT: usize = 64;

/// Allocate a zeroed byte buffer suitable for holding data of any dtype.
pub fn alloc_bytes(len: usize) -> ByteBufferMut {
    ByteBufferMut::zeroed_aligned(len, Alignment::new(ALLOC_ALIGNMENT))
}

/// Gather `stride`-byte rows out of `src`: output row `i` is the bytes at
/// `byte_offset + carry[i] * stride`.
pub fn gather_bytes(
    backend: BackendId,
    src: &[u8],
    byte_offset: isize,
    stride: usize,
    carry: &[i64],
) -> JaggedResult<ByteBuffer> {
    match backend {
        BackendId::Host => {
            let mut out = alloc_bytes(carry.len() * stride);
            let dest = out.as_mut_slice();
            for (i, &c) in carry.iter().enumerate() {
                let at = byte_offset + c as isize * stride as isize;
                if at < 0 || at as usize + stride > src.len() {
                    jagged_bail!(
                        IndexError: "gather of {} bytes at byte {} is out of bounds for a buffer of {} bytes",
                        stride,
                        at,
                        src.len()
                    );
                }
                dest[i * stride..(i + 1) * stride]
                    .copy_from_slice(&src[at as usize..at as usize + stride]);
            }
            Ok(out.freeze())
        }
    }
}

/// Gather `row_bytes`-byte blocks out of `src`: output block `i` is the bytes
/// at `byte_offset + positions[i]`. Unlike [`gather_bytes`], positions are raw
/// byte distances and need not be multiples of the block size.
pub fn gather_bytes_at(
    backend: BackendId,
    src: &[u8],
    byte_offset: isize,
    positions: &[i64],
    row_bytes: usize,
) -> JaggedResult<ByteBuffer> {
    match backend {
        BackendId::Host => {
            let mut out = alloc_bytes(positions.len() * row_bytes);
            let dest = out.as_mut_slice();
            for (i, &pos) in positions.iter().enumerate() {
                let at = byte_offset + pos as isize;
                if at < 0 || at as usize + row_bytes > src.len() {
                    jagged_bail!(
                        IndexError: "gather of {} bytes at byte {} is out of bounds for a buffer of {} bytes",
                        row_bytes,
                        at,
                        src.len()
                    );
                }
                dest[i * row_bytes..(i + 1) * row_bytes]
                    .copy_from_slice(&src[at as usize..at as usize + row_bytes]);
            }
            Ok(out.freeze())
        }
    }
}

/// Normalize optional range bounds against a dimension of `length` elements,
/// with Python slice semantics: negative bounds wrap, out-of-range bounds
/// clamp, and the defaults depend on the sign of `step`.
///
/// Returns `(start, stop)` such that the selected extent is
/// `ceil(|stop - start| / |step|)`.
pub fn regularize_range(
    start: Option<i64>,
    stop: Option<i64>,
    step: i64,
    length: i64,
) -> (i64, i64) {
    if step > 0 {
        let mut start = start.unwrap_or(0);
        if start < 0 {
            start += length;
        }
        start = start.clamp(0, length);
        let mut stop = stop.unwrap_or(length);
        if stop < 0 {
            stop += length;
        }
        stop = stop.clamp(start, length);
        (start, stop)
    } else {
        let mut start = start.unwrap_or(length - 1);
        if start < 0 {
            start += length;
        }
        start = start.clamp(-1, length - 1);
        // An unspecified stop means "past element 0"; only explicit bounds
        // wrap, so the sentinel never collides with a wrapped -1.
        let stop = match stop {
            None => -1,
            Some(mut stop) => {
                if stop < 0 {
                    stop += length;
                }
                stop.clamp(-1, start)
            }
        };
        (start, stop)
    }
}

/// The extent selected by a regularized `(start, stop, step)` triple.
pub fn range_extent(start: i64, stop: i64, step: i64) -> usize {
    let numer = (start - stop).unsigned_abs();
    let denom = step.unsigned_abs();
    (numer / denom + u64::from(numer % denom != 0)) as usize
}

/// An identity carry: `[0, 1, ..., len)`.
pub fn carry_arange(len: usize) -> Buffer<i64> {
    Buffer::from_iter(0..len as i64)
}

/// Combine a carry with a single in-range position `at` in a dimension of
/// `skip` elements.
pub fn next_at(carry: &[i64], skip: i64, at: i64) -> Buffer<i64> {
    carry.iter().map(|&c| skip * c + at).collect()
}

/// Combine a carry with a regularized range over a dimension of `skip`
/// elements, producing the cross product of retained rows and selected
/// positions.
pub fn next_range(carry: &[i64], lenhead: usize, skip: i64, start: i64, step: i64) -> Buffer<i64> {
    let mut out = BufferMut::<i64>::with_capacity(carry.len() * lenhead);
    for &c in carry {
        for j in 0..lenhead as i64 {
            out.push(skip * c + start + j * step);
        }
    }
    out.freeze()
}

/// Like [`next_range`], with an outstanding advanced index: each retained row
/// keeps its advanced position across the selected range.
pub fn next_range_advanced(
    carry: &[i64],
    advanced: &[i64],
    lenhead: usize,
    skip: i64,
    start: i64,
    step: i64,
) -> (Buffer<i64>, Buffer<i64>) {
    let mut nextcarry = BufferMut::<i64>::with_capacity(carry.len() * lenhead);
    let mut nextadvanced = BufferMut::<i64>::with_capacity(carry.len() * lenhead);
    for (&c, &a) in carry.iter().zip(advanced) {
        for j in 0..lenhead as i64 {
            nextcarry.push(skip * c + start + j * step);
            nextadvanced.push(a);
        }
    }
    (nextcarry.freeze(), nextadvanced.freeze())
}

/// Wrap negative entries of an index array against a dimension of `length`
/// elements and bounds-check the result.
pub fn regularize_index(index: &[i64], length: i64) -> JaggedResult<Buffer<i64>> {
    let mut out = BufferMut::<i64>::with_capacity(index.len());
    for &raw in index {
        let wrapped = if raw < 0 { raw + length } else { raw };
        if wrapped < 0 || wrapped >= length {
            jagged_bail!(IndexError: "index {} out of range for dimension of length {}", raw, length);
        }
        out.push(wrapped);
    }
    Ok(out.freeze())
}

/// Combine a carry with a fresh advanced index over a dimension of `skip`
/// elements: the cross product of retained rows and index entries, with the
/// companion advanced array recording each entry's position in the index.
pub fn next_array(carry: &[i64], flathead: &[i64], skip: i64) -> (Buffer<i64>, Buffer<i64>) {
    let mut nextcarry = BufferMut::<i64>::with_capacity(carry.len() * flathead.len());
    let mut nextadvanced = BufferMut::<i64>::with_capacity(carry.len() * flathead.len());
    for &c in carry {
        for (j, &h) in flathead.iter().enumerate() {
            nextcarry.push(skip * c + h);
            nextadvanced.push(j as i64);
        }
    }
    (nextcarry.freeze(), nextadvanced.freeze())
}

/// Combine a carry with a subsequent advanced index: no new dimension is
/// produced; each retained row reads the index entry named by its advanced
/// position.
pub fn next_array_advanced(
    carry: &[i64],
    advanced: &[i64],
    flathead: &[i64],
    skip: i64,
) -> JaggedResult<Buffer<i64>> {
    carry
        .iter()
        .zip(advanced)
        .map(|(&c, &a)| {
            let h = flathead.get(a as usize).ok_or_else(|| {
                jagged_err!(
                    IndexError: "advanced position {} out of range for an index of {} entries",
                    a,
                    flathead.len()
                )
            })?;
            Ok(skip * c + h)
        })
        .collect()
}

/// Count the true elements of strided one-byte boolean data.
pub fn count_true(src: &[u8], byte_offset: isize, length: usize, stride: isize) -> usize {
    (0..length)
        .filter(|&i| src[(byte_offset + i as isize * stride) as usize] != 0)
        .count()
}

/// The positions of the true elements of strided one-byte boolean data, in
/// order.
pub fn nonzero_positions(
    src: &[u8],
    byte_offset: isize,
    length: usize,
    stride: isize,
) -> Buffer<i64> {
    (0..length as i64)
        .filter(|&i| src[(byte_offset + i as isize * stride) as usize] != 0)
        .collect()
}

/// A buffer of `reps` copies of `value`.
pub fn repeat_i64(value: i64, reps: usize) -> Buffer<i64> {
    Buffer::full(value, reps)
}

/// Derive run boundaries from a parents array: the sorted positions at which
/// the group id changes, bracketed by `0` and `parents.len()`.
pub fn sorting_ranges(parents: &[i64]) -> Buffer<i64> {
    let mut ranges = BufferMut::<i64>::empty();
    ranges.push(0);
    for (i, (prev, next)) in parents.iter().tuple_windows().enumerate() {
        if prev != next {
            ranges.push(i as i64 + 1);
        }
    }
    ranges.push(parents.len() as i64);
    ranges.freeze()
}

fn ordering<T: PartialOrd>(a: &T, b: &T, ascending: bool) -> Ordering {
    let ord = a.partial_cmp(b).unwrap_or(Ordering::Equal);
    if ascending { ord } else { ord.reverse() }
}

/// Sort each run of `data` independently into a new buffer. Runs are the
/// half-open windows between consecutive entries of `ranges`.
pub fn sort_runs<T: NativeDType>(
    data: &[T],
    ranges: &[i64],
    ascending: bool,
    stable: bool,
) -> Buffer<T> {
    let mut out = BufferMut::<T>::copy_from(data);
    let sorted = out.as_mut_slice();
    for window in ranges.windows(2) {
        let run = &mut sorted[window[0] as usize..window[1] as usize];
        if stable {
            run.sort_by(|a, b| ordering(a, b, ascending));
        } else {
            run.sort_unstable_by(|a, b| ordering(a, b, ascending));
        }
    }
    out.freeze()
}

/// Argsort each run of `data` independently: output position `i` holds the
/// run-local offset of the element that sorts to position `i` within its run.
pub fn argsort_runs<T: NativeDType>(
    data: &[T],
    ranges: &[i64],
    ascending: bool,
    stable: bool,
) -> Buffer<i64> {
    let mut out = BufferMut::<i64>::zeroed(data.len());
    let positions = out.as_mut_slice();
    for window in ranges.windows(2) {
        let (lo, hi) = (window[0] as usize, window[1] as usize);
        let mut run: Vec<usize> = (lo..hi).collect();
        if stable {
            run.sort_by(|&a, &b| ordering(&data[a], &data[b], ascending));
        } else {
            run.sort_unstable_by(|&a, &b| ordering(&data[a], &data[b], ascending));
        }
        for (i, &source) in run.iter().enumerate() {
            positions[lo + i] = (source - lo) as i64;
        }
    }
    out.freeze()
}

/// Widen integers to a flat `int64` index.
pub fn fill_index<T: NativeDType + AsPrimitive<i64>>(src: &[T]) -> Buffer<i64> {
    src.iter().map(|x| x.as_()).collect()
}

/// Fold each run of `data` into one accumulator slot selected by `parents`.
pub fn run_fold<T: Copy, A: Copy>(
    data: &[T],
    parents: &[i64],
    outlength: usize,
    init: A,
    f: impl Fn(A, T) -> A,
) -> JaggedResult<Buffer<A>> {
    let mut out = vec![init; outlength];
    for (&x, &p) in data.iter().zip(parents) {
        let slot = out
            .get_mut(p as usize)
            .ok_or_else(|| jagged_err!(IndexError: "parent id {} out of range for {} groups", p, outlength))?;
        *slot = f(*slot, x);
    }
    Ok(Buffer::from(out))
}

/// The number of elements in each run.
pub fn run_count(parents: &[i64], outlength: usize) -> JaggedResult<Buffer<i64>> {
    run_fold(parents, parents, outlength, 0i64, |a, _| a.wrapping_add(1))
}

/// Whether each run has at least one element; the validity mask of a masked
/// reduction.
pub fn run_nonempty(parents: &[i64], outlength: usize) -> JaggedResult<Buffer<bool>> {
    run_fold(parents, parents, outlength, false, |_, _| true)
}

/// The typed cross-backend copy of an array's elements.
pub fn copy_typed<T: NativeDType>(
    to: BackendId,
    from: BackendId,
    src: &[T],
) -> JaggedResult<Buffer<T>> {
    match (to, from) {
        (BackendId::Host, BackendId::Host) => Ok(Buffer::copy_from(src)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn regularize_forward() {
        assert_eq!(regularize_range(None, None, 1, 5), (0, 5));
        assert_eq!(regularize_range(Some(-2), None, 1, 5), (3, 5));
        assert_eq!(regularize_range(Some(2), Some(100), 1, 5), (2, 5));
        assert_eq!(regularize_range(Some(4), Some(2), 1, 5), (4, 4));
    }

    #[test]
    fn regularize_backward() {
        assert_eq!(regularize_range(None, None, -1, 5), (4, -1));
        assert_eq!(regularize_range(Some(3), Some(0), -1, 5), (3, 0));
        assert_eq!(regularize_range(Some(-1), None, -2, 5), (4, -1));
        // An explicit negative stop wraps; only the unspecified stop reaches
        // past element 0.
        assert_eq!(regularize_range(Some(3), Some(-5), -1, 5), (3, 0));
        assert_eq!(regularize_range(None, Some(-1), -1, 5), (4, 4));
    }

    #[test]
    fn extents() {
        assert_eq!(range_extent(0, 5, 1), 5);
        assert_eq!(range_extent(0, 5, 2), 3);
        assert_eq!(range_extent(4, -1, -1), 5);
        assert_eq!(range_extent(4, -1, -2), 3);
        assert_eq!(range_extent(2, 2, 1), 0);
    }

    #[test]
    fn carry_combination() {
        assert_eq!(next_at(&[0, 2], 3, 1).as_slice(), &[1, 7]);
        assert_eq!(next_range(&[0, 2], 2, 3, 0, 2).as_slice(), &[0, 2, 6, 8]);
        let (carry, advanced) = next_array(&[0, 1], &[2, 0], 3);
        assert_eq!(carry.as_slice(), &[2, 0, 5, 3]);
        assert_eq!(advanced.as_slice(), &[0, 1, 0, 1]);
        let aligned = next_array_advanced(&[0, 1], &[0, 1], &[2, 0], 3).unwrap();
        assert_eq!(aligned.as_slice(), &[2, 3]);
    }

    #[test]
    fn index_wraparound() {
        let regular = regularize_index(&[-1, 0, -3], 3).unwrap();
        assert_eq!(regular.as_slice(), &[2, 0, 0]);
        assert!(regularize_index(&[3], 3).is_err());
        assert!(regularize_index(&[-4], 3).is_err());
    }

    #[test]
    fn gather_rows() {
        let src: Vec<u8> = (0..12).collect();
        let out = gather_bytes(BackendId::Host, &src, 0, 4, &[2, 0]).unwrap();
        assert_eq!(out.as_slice(), &[8, 9, 10, 11, 0, 1, 2, 3]);
        assert!(gather_bytes(BackendId::Host, &src, 0, 4, &[3]).is_err());
    }

    #[test]
    fn boolean_positions() {
        let data = [1u8, 0, 1, 1];
        assert_eq!(count_true(&data, 0, 4, 1), 3);
        assert_eq!(nonzero_positions(&data, 0, 4, 1).as_slice(), &[0, 2, 3]);
    }

    #[test]
    fn ranges_from_parents() {
        assert_eq!(sorting_ranges(&[0, 0, 1, 1, 1]).as_slice(), &[0, 2, 5]);
        assert_eq!(sorting_ranges(&[7]).as_slice(), &[0, 1]);
    }

    #[test]
    fn run_sorting() {
        let sorted = sort_runs(&[3i32, 1, 2, 9, 7, 8], &[0, 3, 6], true, true);
        assert_eq!(sorted.as_slice(), &[1, 2, 3, 7, 8, 9]);
        let descending = sort_runs(&[3i32, 1, 2], &[0, 3], false, false);
        assert_eq!(descending.as_slice(), &[3, 2, 1]);
    }

    #[test]
    fn run_argsorting() {
        let positions = argsort_runs(&[3i32, 1, 2, 9, 7, 8], &[0, 3, 6], true, true);
        assert_eq!(positions.as_slice(), &[1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn folds() {
        let parents = [0i64, 0, 1, 1, 1];
        let sums = run_fold(&[10i64, 20, 30, 40, 50], &parents, 2, 0i64, |a, x| a + x).unwrap();
        assert_eq!(sums.as_slice(), &[30, 120]);
        assert_eq!(run_count(&parents, 2).unwrap().as_slice(), &[2, 3]);
        assert_eq!(run_nonempty(&[1], 2).unwrap().as_slice(), &[false, true]);
    }
}

use bytes::BytesMut;

use crate::{Alignment, Buffer};

/// A mutable, growable buffer of items of `T`, freezable into a [`Buffer`].
///
/// The backing allocation is always aligned to at least the natural alignment
/// of `T`; growth re-establishes alignment when the underlying allocator
/// would not.
pub struct BufferMut<T> {
    bytes: BytesMut,
    alignment: Alignment,
    _marker: std::marker::PhantomData<T>,
}

impl<T> BufferMut<T> {
    /// Create a new empty buffer.
    pub fn empty() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new buffer with capacity for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_aligned(capacity, Alignment::of::<T>())
    }

    /// Create a new buffer with the given capacity and alignment.
    pub fn with_capacity_aligned(capacity: usize, alignment: Alignment) -> Self {
        let alignment = if alignment.is_aligned_to(Alignment::of::<T>()) {
            alignment
        } else {
            Alignment::of::<T>()
        };
        Self {
            bytes: aligned_bytes(capacity * size_of::<T>(), alignment),
            alignment,
            _marker: Default::default(),
        }
    }

    /// Returns the length of the buffer in elements of type `T`.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len() / size_of::<T>()
    }

    /// Returns whether the buffer is empty.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the capacity of the buffer in elements of type `T`.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity() / size_of::<T>()
    }

    /// Freeze into an immutable [`Buffer`].
    pub fn freeze(self) -> Buffer<T> {
        let length = self.len();
        Buffer {
            bytes: self.bytes.freeze(),
            length,
            alignment: self.alignment,
            _marker: Default::default(),
        }
    }

    /// Reserve space for at least `additional` more elements, re-aligning the
    /// allocation if growth would lose alignment.
    pub fn reserve(&mut self, additional: usize) {
        let needed = self.bytes.len() + additional * size_of::<T>();
        if needed > self.bytes.capacity() {
            let capacity = needed.next_power_of_two().max(64);
            let mut grown = aligned_bytes(capacity, self.alignment);
            grown.extend_from_slice(&self.bytes);
            self.bytes = grown;
        }
    }
}

impl<T: Copy> BufferMut<T> {
    /// Returns a new buffer copied from the provided slice.
    pub fn copy_from(values: impl AsRef<[T]>) -> Self {
        let values = values.as_ref();
        let mut buffer = Self::with_capacity(values.len());
        buffer.extend_from_slice(values);
        buffer
    }

    /// Create a new buffer of `len` copies of `item`.
    pub fn full(item: T, len: usize) -> Self {
        let mut buffer = Self::with_capacity(len);
        for _ in 0..len {
            buffer.push(item);
        }
        buffer
    }

    /// Create a new buffer of `len` elements with every byte set to zero.
    pub fn zeroed(len: usize) -> Self {
        Self::zeroed_aligned(len, Alignment::of::<T>())
    }

    /// Create a new buffer of `len` zero elements with the given alignment.
    pub fn zeroed_aligned(len: usize, alignment: Alignment) -> Self {
        let mut buffer = Self::with_capacity_aligned(len, alignment);
        buffer.bytes.resize(len * size_of::<T>(), 0);
        buffer
    }

    /// Append a single element.
    #[inline]
    pub fn push(&mut self, item: T) {
        self.reserve(1);
        // SAFETY: T is Copy (plain old data), so its bytes are valid to read.
        let raw =
            unsafe { std::slice::from_raw_parts((&raw const item).cast::<u8>(), size_of::<T>()) };
        self.bytes.extend_from_slice(raw);
    }

    /// Append every element of a slice.
    pub fn extend_from_slice(&mut self, values: &[T]) {
        self.reserve(values.len());
        // SAFETY: T is Copy (plain old data), so its bytes are valid to read.
        let raw = unsafe {
            std::slice::from_raw_parts(values.as_ptr().cast::<u8>(), size_of_val(values))
        };
        self.bytes.extend_from_slice(raw);
    }

    /// Returns a slice over the buffer of elements of type `T`.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: alignment is maintained by construction and growth.
        unsafe { std::slice::from_raw_parts(self.bytes.as_ptr().cast(), self.len()) }
    }

    /// Returns a mutable slice over the buffer of elements of type `T`.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len();
        // SAFETY: alignment is maintained by construction and growth.
        unsafe { std::slice::from_raw_parts_mut(self.bytes.as_mut_ptr().cast(), len) }
    }
}

/// Allocate an empty `BytesMut` whose start is aligned to `alignment`.
fn aligned_bytes(capacity: usize, alignment: Alignment) -> BytesMut {
    let mut bytes = BytesMut::with_capacity(capacity + *alignment);
    let padding = bytes.as_ptr().align_offset(*alignment);
    // The head of the split keeps the padding; dropping it leaves the
    // aligned tail owning the allocation.
    bytes.split_off(padding)
}

impl<T: Copy> Extend<T> for BufferMut<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T: Copy> FromIterator<T> for BufferMut<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut buffer = Self::with_capacity(iter.size_hint().0);
        buffer.extend(iter);
        buffer
    }
}

impl<T> Default for BufferMut<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::{Alignment, BufferMut};

    #[test]
    fn push_and_freeze() {
        let mut buffer = BufferMut::<i64>::empty();
        for i in 0..100 {
            buffer.push(i);
        }
        let frozen = buffer.freeze();
        assert_eq!(frozen.len(), 100);
        assert_eq!(frozen.as_slice()[99], 99);
        assert!(frozen.alignment().is_aligned_to(Alignment::of::<i64>()));
    }

    #[test]
    fn zeroed_is_writable() {
        let mut buffer = BufferMut::<u32>::zeroed(4);
        buffer.as_mut_slice()[2] = 7;
        assert_eq!(buffer.freeze().as_slice(), &[0, 0, 7, 0]);
    }

    #[test]
    fn growth_keeps_alignment() {
        let mut buffer = BufferMut::<u64>::with_capacity(1);
        for i in 0..1000 {
            buffer.push(i);
        }
        assert_eq!(buffer.as_slice().len(), 1000);
        assert!(buffer.freeze().alignment().is_aligned_to(Alignment::of::<u64>()));
    }
}

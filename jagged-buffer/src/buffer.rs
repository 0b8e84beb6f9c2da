use std::fmt::{Debug, Formatter};
use std::ops::{Bound, Deref, RangeBounds};

use bytes::Bytes;
use jagged_error::jagged_panic;

use crate::{Alignment, BufferMut, ByteBuffer};

/// An immutable, reference-counted buffer of items of `T`.
///
/// Cloning is cheap (a refcount bump); the backing allocation is freed when
/// the last clone is dropped.
#[derive(Clone, PartialEq, Eq, PartialOrd)]
pub struct Buffer<T> {
    pub(crate) bytes: Bytes,
    pub(crate) length: usize,
    pub(crate) alignment: Alignment,
    pub(crate) _marker: std::marker::PhantomData<T>,
}

impl<T> Buffer<T> {
    /// Returns a new `Buffer<T>` copied from the provided `Vec<T>`, `&[T]`, etc.
    pub fn copy_from(values: impl AsRef<[T]>) -> Self
    where
        T: Copy,
    {
        BufferMut::copy_from(values).freeze()
    }

    /// Create a new empty buffer.
    pub fn empty() -> Self {
        BufferMut::empty().freeze()
    }

    /// Create a new buffer of `len` copies of `item`.
    pub fn full(item: T, len: usize) -> Self
    where
        T: Copy,
    {
        BufferMut::full(item, len).freeze()
    }

    /// Create a `Buffer<T>` zero-copy from a [`ByteBuffer`].
    ///
    /// ## Panics
    ///
    /// Panics if the buffer is not aligned to `T`, or its byte length is not
    /// a multiple of the size of `T`.
    pub fn from_byte_buffer(buffer: ByteBuffer) -> Self {
        Self::from_bytes_aligned(buffer.into_inner(), Alignment::of::<T>())
    }

    /// Create a `Buffer<T>` zero-copy from a `Bytes`.
    ///
    /// ## Panics
    ///
    /// Panics if the bytes are not aligned to the requested alignment, if the
    /// requested alignment is weaker than that of `T`, or if the length is
    /// not a multiple of the size of `T`.
    pub fn from_bytes_aligned(bytes: Bytes, alignment: Alignment) -> Self {
        if !alignment.is_aligned_to(Alignment::of::<T>()) {
            jagged_panic!(
                "Alignment {} must be compatible with the scalar type's alignment {}",
                alignment,
                Alignment::of::<T>(),
            );
        }
        if bytes.as_ptr().align_offset(*alignment) != 0 {
            jagged_panic!(
                "Bytes must be aligned to the scalar type's alignment {}",
                Alignment::of::<T>()
            );
        }
        if bytes.len() % size_of::<T>() != 0 {
            jagged_panic!(
                "Bytes length {} must be a multiple of the scalar type's size {}",
                bytes.len(),
                size_of::<T>()
            );
        }
        let length = bytes.len() / size_of::<T>();
        Self {
            bytes,
            length,
            alignment,
            _marker: Default::default(),
        }
    }

    /// Returns the length of the buffer in elements of type `T`.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns whether the buffer is empty.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the alignment of the buffer.
    #[inline(always)]
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Returns a slice over the buffer of elements of type `T`.
    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        let raw_slice = self.bytes.as_ref();
        // SAFETY: alignment and length are checked on construction
        unsafe { std::slice::from_raw_parts(raw_slice.as_ptr().cast(), self.length) }
    }

    /// Returns an iterator over the buffer of elements of type `T`.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.as_slice().iter()
    }

    /// Returns a zero-copy slice of self for the provided element range.
    ///
    /// ## Panics
    ///
    /// Panics if the range is out of bounds or if the sliced start would not
    /// be aligned to `T`.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s + 1,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e + 1,
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.length,
        };
        if start > end || end > self.length {
            jagged_panic!(
                "Buffer slice [{}, {}) out of bounds for length {}",
                start,
                end,
                self.length
            );
        }
        if start == end {
            return Self::empty();
        }
        let bytes = self
            .bytes
            .slice(start * size_of::<T>()..end * size_of::<T>());
        // A non-zero start may weaken the alignment of the backing bytes.
        let alignment = if bytes.as_ptr().align_offset(*self.alignment) == 0 {
            self.alignment
        } else {
            Alignment::of::<T>()
        };
        Self {
            bytes,
            length: end - start,
            alignment,
            _marker: Default::default(),
        }
    }

    /// Consume self, returning the backing `Bytes`.
    pub fn into_inner(self) -> Bytes {
        self.bytes
    }

    /// Reinterpret this buffer as raw bytes.
    pub fn into_byte_buffer(self) -> ByteBuffer {
        ByteBuffer {
            bytes: self.bytes,
            length: self.length * size_of::<T>(),
            alignment: self.alignment,
            _marker: Default::default(),
        }
    }

    /// The address of the backing allocation, used as a stable identity for
    /// memory accounting. Buffers sharing an allocation report the same
    /// address.
    pub fn ptr_addr(&self) -> usize {
        self.bytes.as_ptr() as usize
    }
}

impl<T> Default for Buffer<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for Buffer<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T> AsRef<[T]> for Buffer<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy> From<&[T]> for Buffer<T> {
    fn from(value: &[T]) -> Self {
        Self::copy_from(value)
    }
}

impl<T: Copy> From<Vec<T>> for Buffer<T> {
    fn from(value: Vec<T>) -> Self {
        Self::from_iter(value)
    }
}

impl<T: Copy> FromIterator<T> for Buffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        BufferMut::from_iter(iter).freeze()
    }
}

impl<T: Debug> Debug for Buffer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        const TRUNC_SIZE: usize = 16;
        let mut binding = f.debug_struct("Buffer");
        let mut fields = binding
            .field("length", &self.length)
            .field("alignment", &self.alignment);
        if self.len() <= TRUNC_SIZE {
            fields = fields.field("as_slice", &self.as_slice());
        } else {
            fields = fields.field("as_slice", &format!("{:?}...", &self.as_slice()[0..TRUNC_SIZE]));
        }
        fields.finish()
    }
}

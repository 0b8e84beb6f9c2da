use jagged_buffer::{Buffer, BufferMut};
use jagged_error::{JaggedResult, jagged_bail};

/// Per-element provenance: one fixed-width row of int64 coordinates for each
/// element along the leading dimension, tracing it back to its position in
/// the original tree.
///
/// Any operation that selects or reorders along the leading dimension must
/// apply the identical selection here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identities {
    buffer: Buffer<i64>,
    width: usize,
}

impl Identities {
    /// Create identities from a row-major buffer of `width` coordinates per
    /// element.
    pub fn try_new(buffer: Buffer<i64>, width: usize) -> JaggedResult<Self> {
        if width == 0 {
            jagged_bail!(InvalidArgument: "identities width must be non-zero");
        }
        if buffer.len() % width != 0 {
            jagged_bail!(
                InvalidArgument: "identities buffer length {} is not a multiple of width {}",
                buffer.len(),
                width
            );
        }
        Ok(Self { buffer, width })
    }

    /// The number of identified elements.
    pub fn len(&self) -> usize {
        self.buffer.len() / self.width
    }

    /// Whether there are no identified elements.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The number of coordinates per element.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The coordinates of element `at`.
    pub fn row(&self, at: usize) -> &[i64] {
        &self.buffer.as_slice()[at * self.width..(at + 1) * self.width]
    }

    /// Zero-copy selection of the rows in `[start, stop)`.
    pub fn slice_rows(&self, start: usize, stop: usize) -> Self {
        Self {
            buffer: self.buffer.slice(start * self.width..stop * self.width),
            width: self.width,
        }
    }

    /// A copy owning a fresh coordinate buffer.
    pub fn deep_copy(&self) -> Self {
        Self {
            buffer: Buffer::copy_from(self.buffer.as_slice()),
            width: self.width,
        }
    }

    /// Gather the rows named by `carry` into a new identities block.
    pub fn carry(&self, carry: &[i64]) -> JaggedResult<Self> {
        let len = self.len();
        let mut rows = BufferMut::<i64>::with_capacity(carry.len() * self.width);
        for &c in carry {
            if c < 0 || c as usize >= len {
                jagged_bail!(IndexError: "identities carry index {} out of range for length {}", c, len);
            }
            rows.extend_from_slice(self.row(c as usize));
        }
        Ok(Self {
            buffer: rows.freeze(),
            width: self.width,
        })
    }

    /// Report this block's backing allocation into a memory accounting map,
    /// keyed by allocation address, keeping the largest extent per key.
    pub fn nbytes_part(&self, largest: &mut std::collections::HashMap<usize, usize>) {
        let nbytes = self.buffer.len() * size_of::<i64>();
        let entry = largest.entry(self.buffer.ptr_addr()).or_insert(0);
        if *entry < nbytes {
            *entry = nbytes;
        }
    }
}

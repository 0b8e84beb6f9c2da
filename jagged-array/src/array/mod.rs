//! The strided leaf array and its operations.

mod contiguous;
mod getitem;
mod index;
mod json;
mod merge;
mod reduce;
mod sort;
mod structure;

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use jagged_buffer::{Buffer, ByteBuffer};
use jagged_dtype::{DType, NativeDType};
use jagged_error::{JaggedResult, jagged_bail};

pub use reduce::{Reduced, Reducer};
pub use structure::Padded;

use crate::backend::BackendId;
use crate::{Form, Identities, Parameters};

/// A shaped, strided, typed window over a shared byte buffer.
///
/// `shape` gives the extent of each dimension in elements; `strides` gives the
/// byte distance between consecutive elements of each dimension and may be
/// negative; `byte_offset` locates element `(0, .., 0)` within the buffer. An
/// empty shape is a scalar: a single element with no dimensions.
///
/// Arrays are immutable. Operations return new arrays that either alias the
/// input buffer (cheap, refcounted) or own a fresh allocation.
#[derive(Clone, Debug)]
pub struct StridedArray {
    buffer: ByteBuffer,
    shape: Vec<usize>,
    strides: Vec<isize>,
    byte_offset: isize,
    dtype: DType,
    backend: BackendId,
    parameters: Parameters,
    identities: Option<Identities>,
}

impl StridedArray {
    /// Create an array over an existing buffer, validating the window
    /// geometry.
    pub fn try_new(
        buffer: ByteBuffer,
        shape: Vec<usize>,
        strides: Vec<isize>,
        byte_offset: isize,
        dtype: DType,
    ) -> JaggedResult<Self> {
        if shape.len() != strides.len() {
            jagged_bail!(
                ShapeError: "shape has {} dimensions but strides has {}",
                shape.len(),
                strides.len()
            );
        }
        let itemsize = dtype.byte_width() as isize;
        if byte_offset % itemsize != 0 {
            jagged_bail!(
                ShapeError: "byte offset {} is not a multiple of the {}-byte item size",
                byte_offset,
                itemsize
            );
        }
        for &stride in &strides {
            if stride % itemsize != 0 {
                jagged_bail!(
                    ShapeError: "stride {} is not a multiple of the {}-byte item size",
                    stride,
                    itemsize
                );
            }
        }
        Ok(Self::new_unchecked(
            buffer,
            shape,
            strides,
            byte_offset,
            dtype,
        ))
    }

    /// Construct without validation. Callers guarantee the window geometry.
    pub(crate) fn new_unchecked(
        buffer: ByteBuffer,
        shape: Vec<usize>,
        strides: Vec<isize>,
        byte_offset: isize,
        dtype: DType,
    ) -> Self {
        Self {
            buffer,
            shape,
            strides,
            byte_offset,
            dtype,
            backend: BackendId::Host,
            parameters: Parameters::new(),
            identities: None,
        }
    }

    /// A packed 1-D array over an existing typed buffer.
    pub fn from_buffer<T: NativeDType>(buffer: Buffer<T>) -> Self {
        let len = buffer.len();
        Self::new_unchecked(
            buffer.into_byte_buffer(),
            vec![len],
            vec![size_of::<T>() as isize],
            0,
            T::DTYPE,
        )
    }

    /// A scalar holding a single value.
    pub fn scalar<T: NativeDType>(value: T) -> Self {
        Self::new_unchecked(
            Buffer::full(value, 1).into_byte_buffer(),
            vec![],
            vec![],
            0,
            T::DTYPE,
        )
    }

    /// Attach node metadata.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Attach per-element provenance.
    pub fn with_identities(mut self, identities: Option<Identities>) -> Self {
        self.identities = identities;
        self
    }

    /// The backing byte buffer.
    pub fn buffer(&self) -> &ByteBuffer {
        &self.buffer
    }

    /// The element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Bytes per element.
    pub fn item_size(&self) -> usize {
        self.dtype.byte_width()
    }

    /// Extent of each dimension, in elements.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Byte distance between consecutive elements of each dimension.
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Byte position of the first element within the buffer.
    pub fn byte_offset(&self) -> isize {
        self.byte_offset
    }

    /// The number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Whether this array is a dimensionless scalar.
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// The extent of the leading dimension, or `-1` for a scalar.
    pub fn len(&self) -> i64 {
        match self.shape.first() {
            Some(&extent) => extent as i64,
            None => -1,
        }
    }

    /// Whether the leading dimension is empty. A scalar is never empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The total number of elements in the window. A scalar has one.
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// The backend on which the buffer is resident.
    pub fn backend(&self) -> BackendId {
        self.backend
    }

    /// Node metadata.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Per-element provenance, if attached.
    pub fn identities(&self) -> Option<&Identities> {
        self.identities.as_ref()
    }

    /// The buffer-free structural description of this array.
    pub fn form(&self) -> Form {
        Form::new(
            self.shape.get(1..).unwrap_or_default().to_vec(),
            self.dtype,
            self.parameters.clone(),
            self.identities.is_some(),
        )
    }

    /// Raise `IndexError` if the identities are too short to cover iteration
    /// over the leading dimension.
    pub fn check_for_iteration(&self) -> JaggedResult<()> {
        if let Some(identities) = &self.identities {
            if (identities.len() as i64) < self.len() {
                jagged_bail!(
                    IndexError: "identities cover {} elements but the array has {}",
                    identities.len(),
                    self.len()
                );
            }
        }
        Ok(())
    }

    /// Audit the geometry against the backing buffer, returning a description
    /// of the first inconsistency. `None` means every addressable byte
    /// position lands inside the buffer.
    pub fn validity_error(&self) -> Option<String> {
        if self.shape.len() != self.strides.len() {
            return Some(format!(
                "shape has {} dimensions but strides has {}",
                self.shape.len(),
                self.strides.len()
            ));
        }
        if self.element_count() == 0 {
            return None;
        }
        let mut lowest = self.byte_offset;
        let mut highest = self.byte_offset;
        for (&extent, &stride) in self.shape.iter().zip(self.strides.iter()) {
            let reach = stride * (extent as isize - 1);
            if reach < 0 {
                lowest += reach;
            } else {
                highest += reach;
            }
        }
        if lowest < 0 {
            return Some(format!(
                "window reaches byte position {lowest}, before the buffer start"
            ));
        }
        let end = highest as usize + self.item_size();
        if end > self.buffer.len() {
            return Some(format!(
                "window reaches byte position {} but the buffer holds {}",
                end,
                self.buffer.len()
            ));
        }
        None
    }

    /// The empty selection: a packed length-0 array of the same type.
    pub fn getitem_nothing(&self) -> Self {
        Self::new_unchecked(
            ByteBuffer::empty(),
            vec![0],
            vec![self.item_size() as isize],
            0,
            self.dtype,
        )
        .with_parameters(self.parameters.clone())
    }

    /// A cheap copy sharing the buffer and identities.
    pub fn shallow_copy(&self) -> Self {
        self.clone()
    }

    /// A copy that owns fresh allocations for the buffer and/or identities as
    /// requested; shared otherwise. Copying the buffer forces contiguity
    /// first, so the result holds exactly its own window.
    pub fn deep_copy(&self, copy_buffer: bool, copy_identities: bool) -> JaggedResult<Self> {
        let mut copied = if copy_buffer {
            let contiguous = self.to_contiguous()?;
            let buffer = ByteBuffer::copy_from(contiguous.view_bytes());
            let mut packed = contiguous.clone();
            packed.buffer = buffer;
            packed.byte_offset = 0;
            packed
        } else {
            self.clone()
        };
        if copy_identities {
            copied.identities = copied.identities.as_ref().map(Identities::deep_copy);
        }
        Ok(copied)
    }

    /// Gather rows of the leading dimension by index, preserving the inner
    /// shape. Indices must already be regularized to `[0, len)`.
    pub fn carry(&self, carry: &[i64]) -> JaggedResult<Self> {
        if self.is_scalar() {
            jagged_bail!(ShapeError: "cannot carry a scalar");
        }
        let contiguous = self.to_contiguous()?;
        let row_stride = contiguous.strides[0] as usize;
        let gathered = crate::backend::kernels::gather_bytes(
            self.backend,
            contiguous.view_bytes(),
            0,
            row_stride,
            carry,
        )?;
        let mut shape = self.shape.clone();
        shape[0] = carry.len();
        let identities = match &self.identities {
            Some(identities) => Some(identities.carry(carry)?),
            None => None,
        };
        Ok(Self::new_unchecked(
            gathered,
            shape,
            contiguous.strides.clone(),
            0,
            self.dtype,
        )
        .with_parameters(self.parameters.clone())
        .with_identities(identities))
    }

    /// The bytes of the window, for contiguous arrays only: the packed run
    /// starting at `byte_offset`.
    pub(crate) fn view_bytes(&self) -> &[u8] {
        let start = self.byte_offset as usize;
        &self.buffer.as_slice()[start..start + self.element_count() * self.item_size()]
    }

    /// The typed elements of a contiguous window.
    pub(crate) fn typed_buffer<T: NativeDType>(&self) -> JaggedResult<Buffer<T>> {
        if T::DTYPE != self.dtype {
            jagged_bail!(
                TypeError: "array of dtype {} read as {}",
                self.dtype,
                T::DTYPE
            );
        }
        if !self.is_contiguous() {
            jagged_bail!(ShapeError: "typed access requires a contiguous array");
        }
        let start = self.byte_offset as usize;
        let nbytes = self.element_count() * self.item_size();
        Ok(Buffer::from_byte_buffer(
            self.buffer.slice(start..start + nbytes),
        ))
    }

    /// Rebuild over the same buffer with new geometry, keeping metadata.
    pub(crate) fn with_geometry(
        &self,
        shape: Vec<usize>,
        strides: Vec<isize>,
        byte_offset: isize,
    ) -> Self {
        Self {
            buffer: self.buffer.clone(),
            shape,
            strides,
            byte_offset,
            dtype: self.dtype,
            backend: self.backend,
            parameters: self.parameters.clone(),
            identities: self.identities.clone(),
        }
    }

    /// Rebuild over a fresh packed buffer, keeping metadata.
    pub(crate) fn with_packed_buffer(
        &self,
        buffer: ByteBuffer,
        shape: Vec<usize>,
        dtype: DType,
    ) -> Self {
        Self {
            buffer,
            strides: packed_strides(&shape, dtype.byte_width()),
            shape,
            byte_offset: 0,
            dtype,
            backend: self.backend,
            parameters: self.parameters.clone(),
            identities: self.identities.clone(),
        }
    }

    /// Report this array's backing allocations into a memory accounting map,
    /// keyed by allocation address and keeping the largest extent per key.
    /// Aliasing views are counted once.
    pub fn nbytes_part(&self, largest: &mut HashMap<usize, usize>) {
        let entry = largest.entry(self.buffer.ptr_addr()).or_insert(0);
        if *entry < self.buffer.len() {
            *entry = self.buffer.len();
        }
        if let Some(identities) = &self.identities {
            identities.nbytes_part(largest);
        }
    }

    /// Total bytes held by this array's allocations, counting shared
    /// allocations once.
    pub fn nbytes(&self) -> usize {
        let mut largest = HashMap::new();
        self.nbytes_part(&mut largest);
        largest.values().sum()
    }
}

impl Display for StridedArray {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "StridedArray({}, shape={:?}", self.dtype, self.shape)?;
        if !self.is_contiguous() {
            write!(
                f,
                ", strides={:?}, byte_offset={}",
                self.strides, self.byte_offset
            )?;
        }
        if self.element_count() > 0 {
            let first = self.byte_offset;
            let last = first
                + self
                    .shape
                    .iter()
                    .zip(self.strides.iter())
                    .map(|(&extent, &stride)| (extent as isize - 1) * stride)
                    .sum::<isize>();
            let ends = usize::try_from(first)
                .ok()
                .zip(usize::try_from(last).ok());
            if let Some((first, last)) = ends {
                if let (Ok(first), Ok(last)) = (self.element_at(first), self.element_at(last)) {
                    if self.element_count() == 1 {
                        write!(f, ", [{first}]")?;
                    } else {
                        write!(f, ", [{first} ... {last}]")?;
                    }
                }
            }
        }
        write!(f, ")")
    }
}

/// Row-major strides of a packed array of the given shape.
pub(crate) fn packed_strides(shape: &[usize], itemsize: usize) -> Vec<isize> {
    let mut strides = vec![0isize; shape.len()];
    let mut acc = itemsize as isize;
    for (at, &extent) in shape.iter().enumerate().rev() {
        strides[at] = acc;
        acc *= extent as isize;
    }
    strides
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jagged_buffer::buffer;
    use jagged_error::JaggedError;

    use super::*;

    #[test]
    fn packed_construction() {
        let array = StridedArray::from_buffer(buffer![1i32, 2, 3, 4]);
        assert_eq!(array.dtype(), DType::Int32);
        assert_eq!(array.shape(), &[4]);
        assert_eq!(array.strides(), &[4]);
        assert_eq!(array.len(), 4);
        assert_eq!(array.element_count(), 4);
        assert!(!array.is_scalar());
    }

    #[test]
    fn scalar_length_sentinel() {
        let scalar = StridedArray::scalar(5i64);
        assert!(scalar.is_scalar());
        assert_eq!(scalar.len(), -1);
        assert_eq!(scalar.element_count(), 1);
        assert!(!scalar.is_empty());
    }

    #[test]
    fn geometry_validation() {
        let buffer = buffer![0u8; 32].into_byte_buffer();
        assert!(matches!(
            StridedArray::try_new(buffer.clone(), vec![4], vec![8, 8], 0, DType::Int64),
            Err(JaggedError::ShapeError(_))
        ));
        assert!(matches!(
            StridedArray::try_new(buffer.clone(), vec![4], vec![3], 0, DType::Int64),
            Err(JaggedError::ShapeError(_))
        ));
        assert!(matches!(
            StridedArray::try_new(buffer.clone(), vec![4], vec![8], 2, DType::Int64),
            Err(JaggedError::ShapeError(_))
        ));
        assert!(StridedArray::try_new(buffer, vec![4], vec![8], 0, DType::Int64).is_ok());
    }

    #[test]
    fn validity_audit() {
        let array = StridedArray::from_buffer(buffer![1i32, 2, 3, 4]);
        assert_eq!(array.validity_error(), None);

        let reversed = array.with_geometry(vec![4], vec![-4], 12);
        assert_eq!(reversed.validity_error(), None);

        let overrun = array.with_geometry(vec![5], vec![4], 0);
        assert!(overrun.validity_error().unwrap().contains("buffer holds"));

        let underrun = array.with_geometry(vec![4], vec![-4], 8);
        assert!(underrun
            .validity_error()
            .unwrap()
            .contains("before the buffer start"));
    }

    #[test]
    fn packed_stride_computation() {
        assert_eq!(packed_strides(&[3, 4, 5], 8), &[160, 40, 8]);
        assert_eq!(packed_strides(&[7], 1), &[1]);
        assert!(packed_strides(&[], 8).is_empty());
    }

    #[test]
    fn carry_gathers_rows() {
        let array = StridedArray::from_buffer(buffer![10i64, 20, 30, 40]);
        let carried = array.carry(&[3, 0, 3]).unwrap();
        assert_eq!(carried.shape(), &[3]);
        assert_eq!(
            carried.typed_buffer::<i64>().unwrap().as_slice(),
            &[40, 10, 40]
        );
    }

    #[test]
    fn carry_applies_to_identities() {
        let identities = Identities::try_new(buffer![0, 1, 2], 1).unwrap();
        let array =
            StridedArray::from_buffer(buffer![10i64, 20, 30]).with_identities(Some(identities));
        let carried = array.carry(&[2, 0]).unwrap();
        let ids = carried.identities().unwrap();
        assert_eq!(ids.row(0), &[2]);
        assert_eq!(ids.row(1), &[0]);
    }

    #[test]
    fn deep_copy_forces_contiguity() {
        let base = StridedArray::from_buffer(buffer![0i64, 1, 2, 3, 4, 5, 6, 7]);
        let evens = base.with_geometry(vec![4], vec![16], 0);
        let copied = evens.deep_copy(true, false).unwrap();
        assert!(copied.is_contiguous());
        assert_eq!(copied.byte_offset(), 0);
        assert_eq!(copied.buffer().len(), 32);
        assert_ne!(copied.buffer().ptr_addr(), base.buffer().ptr_addr());
        assert_eq!(
            copied.typed_buffer::<i64>().unwrap().as_slice(),
            &[0, 2, 4, 6]
        );
    }

    #[test]
    fn deep_copy_of_identities_owns_fresh_rows() {
        let ids = Identities::try_new(buffer![0, 1, 2], 1).unwrap();
        let array = StridedArray::from_buffer(buffer![1i8, 2, 3]).with_identities(Some(ids));
        let copied = array.deep_copy(false, true).unwrap();
        // Buffer still shared; identities reconstructed.
        assert_eq!(copied.buffer().ptr_addr(), array.buffer().ptr_addr());
        let copied_ids = copied.identities().unwrap();
        assert_eq!(copied_ids.len(), 3);
        assert_eq!(copied_ids.row(2), &[2]);
    }

    #[test]
    fn iteration_check() {
        let identities = Identities::try_new(buffer![0, 1], 1).unwrap();
        let array =
            StridedArray::from_buffer(buffer![1i8, 2, 3]).with_identities(Some(identities));
        assert!(matches!(
            array.check_for_iteration(),
            Err(JaggedError::IndexError(_))
        ));
    }

    #[test]
    fn nothing_is_empty_and_typed() {
        let nothing = StridedArray::from_buffer(buffer![1.5f64]).getitem_nothing();
        assert_eq!(nothing.len(), 0);
        assert_eq!(nothing.dtype(), DType::Float64);
        assert_eq!(nothing.strides(), &[8]);
    }

    #[test]
    fn display_shows_window_ends() {
        let base = StridedArray::from_buffer(buffer![0i64, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(base.to_string(), "StridedArray(int64, shape=[8], [0 ... 7])");

        let reversed = base.with_geometry(vec![8], vec![-8], 56);
        assert_eq!(
            reversed.to_string(),
            "StridedArray(int64, shape=[8], strides=[-8], byte_offset=56, [7 ... 0])"
        );

        assert_eq!(
            StridedArray::scalar(5i32).to_string(),
            "StridedArray(int32, shape=[], [5])"
        );
    }

    #[test]
    fn nbytes_counts_shared_allocations_once() {
        let array = StridedArray::from_buffer(buffer![1i32, 2, 3, 4]);
        let view = array.with_geometry(vec![2], vec![8], 0);
        let mut largest = HashMap::new();
        array.nbytes_part(&mut largest);
        view.nbytes_part(&mut largest);
        assert_eq!(largest.values().sum::<usize>(), 16);
    }
}

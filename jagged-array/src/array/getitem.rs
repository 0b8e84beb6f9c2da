//! Basic and advanced slicing.
//!
//! A slice spec is resolved one item per recursion level against an array
//! whose leading dimension is a synthetic extent-1 "row of everything"; the
//! result drops that dimension again. Specs with no advanced index and no
//! identities resolve by pure stride arithmetic ([`getitem_bystrides`]) and
//! never touch the data; everything else normalizes to contiguous and builds
//! up a gather index ("carry") level by level.
//!
//! [`getitem_bystrides`]: StridedArray::getitem_bystrides

use jagged_buffer::{Buffer, buffer};
use jagged_error::{JaggedResult, jagged_bail};

use crate::StridedArray;
use crate::backend::kernels;
use crate::slice::{SliceItem, SliceSpec, dimlength};

impl StridedArray {
    /// Select from this array by a slice spec.
    pub fn getitem(&self, spec: &SliceSpec) -> JaggedResult<Self> {
        if self.is_scalar() {
            jagged_bail!(ShapeError: "cannot slice a scalar");
        }

        if spec.is_too_general() {
            if spec
                .items()
                .iter()
                .any(|item| matches!(item, SliceItem::Missing(_)))
            {
                jagged_bail!(
                    NotImplemented: "option-typed slice items are resolved by an indexed-option container"
                );
            }
            if self.ndim() == 1 {
                jagged_bail!(
                    TypeError: "cannot apply a jagged slice to this array because it is one-dimensional"
                );
            }
            jagged_bail!(
                NotImplemented: "jagged slices of a multidimensional array are resolved by a regular container"
            );
        }

        if !spec.is_advanced() && self.identities().is_none() {
            let next = self.prepend_unit_dimension();
            let out = next.getitem_bystrides(spec.items(), 1)?;
            return Ok(out.drop_leading_dimension());
        }

        let safe = self.to_contiguous()?;
        let next = safe.prepend_unit_dimension();
        let stride = next.strides[0] as usize;
        let nextcarry: Buffer<i64> = buffer![0];
        let out = next.getitem_next(spec.items(), &nextcarry, &Buffer::empty(), 1, stride, true)?;
        Ok(out.drop_leading_dimension())
    }

    /// Select one position of the leading dimension, wrapping negatives.
    pub fn getitem_at(&self, at: i64) -> JaggedResult<Self> {
        if self.is_scalar() {
            jagged_bail!(ShapeError: "cannot slice a scalar");
        }
        let length = self.shape[0] as i64;
        let regular = if at < 0 { at + length } else { at };
        if regular < 0 || regular >= length {
            jagged_bail!(IndexError: "index {} out of range for dimension of length {}", at, length);
        }
        self.getitem_at_nowrap(regular)
    }

    /// Select one in-range position of the leading dimension.
    pub fn getitem_at_nowrap(&self, at: i64) -> JaggedResult<Self> {
        if self.is_scalar() {
            jagged_bail!(ShapeError: "cannot slice a scalar");
        }
        if at < 0 || at >= self.shape[0] as i64 {
            jagged_bail!(
                IndexError: "index {} out of range for dimension of length {}",
                at,
                self.shape[0]
            );
        }
        Ok(self
            .with_geometry(
                self.shape[1..].to_vec(),
                self.strides[1..].to_vec(),
                self.byte_offset + at as isize * self.strides[0],
            )
            .with_identities(None))
    }

    /// Select a unit-step range of the leading dimension, with Python slice
    /// semantics for missing and negative bounds.
    pub fn getitem_range(&self, start: Option<i64>, stop: Option<i64>) -> JaggedResult<Self> {
        if self.is_scalar() {
            jagged_bail!(ShapeError: "cannot slice a scalar");
        }
        let (start, stop) = kernels::regularize_range(start, stop, 1, self.shape[0] as i64);
        self.getitem_range_nowrap(start, stop)
    }

    /// Select an in-range `[start, stop)` of the leading dimension.
    pub fn getitem_range_nowrap(&self, start: i64, stop: i64) -> JaggedResult<Self> {
        if self.is_scalar() {
            jagged_bail!(ShapeError: "cannot slice a scalar");
        }
        if start < 0 || stop < start || stop > self.shape[0] as i64 {
            jagged_bail!(
                IndexError: "range [{}, {}) out of bounds for dimension of length {}",
                start,
                stop,
                self.shape[0]
            );
        }
        let identities = match self.identities() {
            Some(identities) => {
                if (identities.len() as i64) < stop {
                    jagged_bail!(
                        IndexError: "identities cover {} elements but the range stops at {}",
                        identities.len(),
                        stop
                    );
                }
                Some(identities.slice_rows(start as usize, stop as usize))
            }
            None => None,
        };
        let mut shape = self.shape.clone();
        shape[0] = (stop - start) as usize;
        Ok(self
            .with_geometry(
                shape,
                self.strides.clone(),
                self.byte_offset + start as isize * self.strides[0],
            )
            .with_identities(identities))
    }

    /// Flat leaves have no fields.
    pub fn getitem_field(&self, key: &str) -> JaggedResult<Self> {
        jagged_bail!(TypeError: "cannot slice by field name {:?} because this array has no fields", key)
    }

    /// Flat leaves have no fields.
    pub fn getitem_fields(&self, keys: &[String]) -> JaggedResult<Self> {
        jagged_bail!(TypeError: "cannot slice by field names {:?} because this array has no fields", keys)
    }

    /// A view with a synthetic extent-1 dimension prepended: the whole array
    /// as a single row.
    fn prepend_unit_dimension(&self) -> Self {
        let mut shape = vec![1];
        shape.extend_from_slice(&self.shape);
        let mut strides = vec![self.shape[0] as isize * self.strides[0]];
        strides.extend_from_slice(&self.strides);
        self.with_geometry(shape, strides, self.byte_offset)
    }

    /// Drop the synthetic leading dimension again.
    fn drop_leading_dimension(&self) -> Self {
        self.with_geometry(
            self.shape[1..].to_vec(),
            self.strides[1..].to_vec(),
            self.byte_offset,
        )
    }

    /// Merge the two leading dimensions, stepping into dimension 1 at the
    /// given byte offset. On a 1-D array the result is a scalar window.
    fn flattened(&self, byte_offset: isize, keep_identities: bool) -> Self {
        let (shape, strides) = if self.ndim() == 1 {
            (vec![], vec![])
        } else {
            let mut shape = vec![self.shape[0] * self.shape[1]];
            shape.extend_from_slice(&self.shape[2..]);
            let mut strides = vec![self.strides[1]];
            strides.extend_from_slice(&self.strides[2..]);
            (shape, strides)
        };
        let flat = self.with_geometry(shape, strides, byte_offset);
        if keep_identities {
            flat
        } else {
            flat.with_identities(None)
        }
    }

    /// Resolve a spec by stride arithmetic alone. `length` is the extent of
    /// everything resolved so far, folded into the leading dimension.
    fn getitem_bystrides(&self, items: &[SliceItem], length: usize) -> JaggedResult<Self> {
        let Some((head, tail)) = items.split_first() else {
            return Ok(self.shallow_copy());
        };
        match head {
            SliceItem::At(at) => self.bystrides_at(*at, tail, length),
            SliceItem::Range { start, stop, step } => {
                self.bystrides_range(*start, *stop, *step, tail, length)
            }
            SliceItem::Ellipsis => self.bystrides_ellipsis(tail, length),
            SliceItem::NewAxis => self.bystrides_newaxis(tail, length),
            SliceItem::Field(key) => self.getitem_field(key),
            SliceItem::Fields(keys) => self.getitem_fields(keys),
            SliceItem::Array(_) | SliceItem::Missing(_) | SliceItem::Jagged(_) => {
                jagged_bail!(
                    InvalidArgument: "slice item cannot be resolved by stride arithmetic"
                )
            }
        }
    }

    fn bystrides_at(&self, at: i64, tail: &[SliceItem], length: usize) -> JaggedResult<Self> {
        if self.ndim() < 2 {
            jagged_bail!(ShapeError: "too many dimensions in slice");
        }
        let extent = self.shape[1] as i64;
        let regular = if at < 0 { at + extent } else { at };
        if regular < 0 || regular >= extent {
            jagged_bail!(IndexError: "index {} out of range for dimension of length {}", at, extent);
        }
        let nextbyteoffset = self.byte_offset + regular as isize * self.strides[1];
        let next = self.flattened(nextbyteoffset, true);
        let out = next.getitem_bystrides(tail, length)?;

        let mut outshape = vec![length];
        outshape.extend_from_slice(&out.shape[1..]);
        Ok(out.with_geometry(outshape, out.strides.clone(), out.byte_offset))
    }

    fn bystrides_range(
        &self,
        start: Option<i64>,
        stop: Option<i64>,
        step: i64,
        tail: &[SliceItem],
        length: usize,
    ) -> JaggedResult<Self> {
        if self.ndim() < 2 {
            jagged_bail!(ShapeError: "too many dimensions in slice");
        }
        let (start, stop) = kernels::regularize_range(start, stop, step, self.shape[1] as i64);
        let lenhead = kernels::range_extent(start, stop, step);

        let nextbyteoffset = self.byte_offset + start as isize * self.strides[1];
        let next = self.flattened(nextbyteoffset, true);
        let out = next.getitem_bystrides(tail, length * lenhead)?;

        let mut outshape = vec![length, lenhead];
        outshape.extend_from_slice(&out.shape[1..]);
        let mut outstrides = vec![self.strides[0], self.strides[1] * step as isize];
        outstrides.extend_from_slice(&out.strides[1..]);
        Ok(out.with_geometry(outshape, outstrides, out.byte_offset))
    }

    fn bystrides_ellipsis(&self, tail: &[SliceItem], length: usize) -> JaggedResult<Self> {
        if tail.is_empty() || self.ndim() - 1 == dimlength(tail) {
            self.getitem_bystrides(tail, length)
        } else {
            // Not yet at the trailing dimensions: spend one full-range slice
            // and keep the ellipsis in play.
            let mut items = vec![SliceItem::full_range(), SliceItem::Ellipsis];
            items.extend_from_slice(tail);
            self.getitem_bystrides(&items, length)
        }
    }

    fn bystrides_newaxis(&self, tail: &[SliceItem], length: usize) -> JaggedResult<Self> {
        let out = self.getitem_bystrides(tail, length)?;

        let mut outshape = vec![length, 1];
        outshape.extend_from_slice(&out.shape[1..]);
        let mut outstrides = vec![out.strides[0]];
        outstrides.extend_from_slice(&out.strides);
        Ok(out.with_geometry(outshape, outstrides, out.byte_offset))
    }

    /// Resolve a spec by building a gather index level by level. `self` is
    /// always contiguous on this path; `stride` is the byte extent of one
    /// row of the leading dimension, and `advanced` is the broadcast position
    /// of each carried row once an advanced index has been seen.
    fn getitem_next(
        &self,
        items: &[SliceItem],
        carry: &Buffer<i64>,
        advanced: &Buffer<i64>,
        length: usize,
        stride: usize,
        first: bool,
    ) -> JaggedResult<Self> {
        let Some((head, tail)) = items.split_first() else {
            let gathered = kernels::gather_bytes(
                self.backend(),
                self.buffer.as_slice(),
                self.byte_offset,
                stride,
                carry,
            )?;
            let identities = match self.identities() {
                Some(identities) => Some(identities.carry(carry)?),
                None => None,
            };
            let mut shape = vec![carry.len()];
            shape.extend_from_slice(&self.shape[1..]);
            let mut strides = vec![stride as isize];
            strides.extend_from_slice(&self.strides[1..]);
            return Ok(self
                .with_packed_view(gathered, shape, strides)
                .with_identities(identities));
        };
        match head {
            SliceItem::At(at) => self.next_at(*at, tail, carry, advanced, length, first),
            SliceItem::Range { start, stop, step } => {
                self.next_range(*start, *stop, *step, tail, carry, advanced, length, first)
            }
            SliceItem::Ellipsis => self.next_ellipsis(tail, carry, advanced, length, stride),
            SliceItem::NewAxis => self.next_newaxis(tail, carry, advanced, length, stride),
            SliceItem::Array(array) => {
                self.next_array(array, tail, carry, advanced, length, first)
            }
            SliceItem::Field(key) => self.getitem_field(key),
            SliceItem::Fields(keys) => self.getitem_fields(keys),
            SliceItem::Missing(_) => {
                jagged_bail!(
                    NotImplemented: "option-typed slice items are resolved by an indexed-option container"
                )
            }
            SliceItem::Jagged(_) => {
                jagged_bail!(
                    NotImplemented: "jagged slices of a multidimensional array are resolved by a regular container"
                )
            }
        }
    }

    fn next_at(
        &self,
        at: i64,
        tail: &[SliceItem],
        carry: &Buffer<i64>,
        advanced: &Buffer<i64>,
        length: usize,
        first: bool,
    ) -> JaggedResult<Self> {
        if self.ndim() < 2 {
            jagged_bail!(ShapeError: "too many dimensions in slice");
        }
        let skip = self.shape[1] as i64;
        let regular = if at < 0 { at + skip } else { at };
        if regular < 0 || regular >= skip {
            jagged_bail!(IndexError: "index {} out of range for dimension of length {}", at, skip);
        }

        let next = self.flattened(self.byte_offset, first);
        let nextcarry = kernels::next_at(carry, skip, regular);
        let stride = next.row_stride();
        let out = next.getitem_next(tail, &nextcarry, advanced, length, stride, false)?;

        let mut outshape = vec![length];
        outshape.extend_from_slice(&out.shape[1..]);
        Ok(out.with_geometry(outshape, out.strides.clone(), out.byte_offset))
    }

    #[allow(clippy::too_many_arguments)]
    fn next_range(
        &self,
        start: Option<i64>,
        stop: Option<i64>,
        step: i64,
        tail: &[SliceItem],
        carry: &Buffer<i64>,
        advanced: &Buffer<i64>,
        length: usize,
        first: bool,
    ) -> JaggedResult<Self> {
        if self.ndim() < 2 {
            jagged_bail!(ShapeError: "too many dimensions in slice");
        }
        let skip = self.shape[1] as i64;
        let (start, stop) = kernels::regularize_range(start, stop, step, skip);
        let lenhead = kernels::range_extent(start, stop, step);

        let next = self.flattened(self.byte_offset, first);
        let stride = next.row_stride();

        let (nextcarry, nextadvanced) = if advanced.is_empty() {
            (
                kernels::next_range(carry, lenhead, skip, start, step),
                Buffer::empty(),
            )
        } else {
            kernels::next_range_advanced(carry, advanced, lenhead, skip, start, step)
        };
        let out = next.getitem_next(
            tail,
            &nextcarry,
            &nextadvanced,
            length * lenhead,
            stride,
            false,
        )?;

        let mut outshape = vec![length, lenhead];
        outshape.extend_from_slice(&out.shape[1..]);
        let mut outstrides = vec![lenhead as isize * out.strides[0]];
        outstrides.extend_from_slice(&out.strides);
        Ok(out.with_geometry(outshape, outstrides, out.byte_offset))
    }

    fn next_ellipsis(
        &self,
        tail: &[SliceItem],
        carry: &Buffer<i64>,
        advanced: &Buffer<i64>,
        length: usize,
        stride: usize,
    ) -> JaggedResult<Self> {
        if tail.is_empty() || self.ndim() - 1 == dimlength(tail) {
            self.getitem_next(tail, carry, advanced, length, stride, false)
        } else {
            let mut items = vec![SliceItem::full_range(), SliceItem::Ellipsis];
            items.extend_from_slice(tail);
            self.getitem_next(&items, carry, advanced, length, stride, false)
        }
    }

    fn next_newaxis(
        &self,
        tail: &[SliceItem],
        carry: &Buffer<i64>,
        advanced: &Buffer<i64>,
        length: usize,
        stride: usize,
    ) -> JaggedResult<Self> {
        let out = self.getitem_next(tail, carry, advanced, length, stride, false)?;

        let mut outshape = vec![length, 1];
        outshape.extend_from_slice(&out.shape[1..]);
        let mut outstrides = vec![out.strides[0]];
        outstrides.extend_from_slice(&out.strides);
        Ok(out.with_geometry(outshape, outstrides, out.byte_offset))
    }

    fn next_array(
        &self,
        array: &crate::slice::IndexArray,
        tail: &[SliceItem],
        carry: &Buffer<i64>,
        advanced: &Buffer<i64>,
        length: usize,
        first: bool,
    ) -> JaggedResult<Self> {
        if self.ndim() < 2 {
            jagged_bail!(ShapeError: "too many dimensions in slice");
        }
        let skip = self.shape[1] as i64;
        let flathead = kernels::regularize_index(array.ravel(), skip)?;

        let next = self.flattened(self.byte_offset, first);
        let stride = next.row_stride();

        if advanced.is_empty() {
            let (nextcarry, nextadvanced) = kernels::next_array(carry, &flathead, skip);
            let out = next.getitem_next(
                tail,
                &nextcarry,
                &nextadvanced,
                length * flathead.len(),
                stride,
                false,
            )?;

            let mut outshape = vec![length];
            outshape.extend_from_slice(array.shape());
            outshape.extend_from_slice(&out.shape[1..]);
            let mut outstrides = out.strides.clone();
            for &extent in array.shape().iter().rev() {
                outstrides.insert(0, extent as isize * outstrides[0]);
            }
            // The broadcast of a multidimensional index scrambles row
            // provenance, so identities survive only the 1-D case.
            let keep_identities = array.shape().len() == 1;
            let mut result = out.with_geometry(outshape, outstrides, out.byte_offset);
            if !keep_identities {
                result = result.with_identities(None);
            }
            Ok(result)
        } else {
            let nextcarry = kernels::next_array_advanced(carry, advanced, &flathead, skip)?;
            let out = next.getitem_next(
                tail,
                &nextcarry,
                advanced,
                length * array.len(),
                stride,
                false,
            )?;

            let mut outshape = vec![length];
            outshape.extend_from_slice(&out.shape[1..]);
            Ok(out.with_geometry(outshape, out.strides.clone(), out.byte_offset))
        }
    }

    /// Byte extent of one row of the leading dimension of a contiguous view,
    /// or the item size for a scalar window.
    fn row_stride(&self) -> usize {
        match self.strides.first() {
            Some(&stride) => stride as usize,
            None => self.item_size(),
        }
    }

    /// Replace the buffer and geometry, keeping metadata. The new view starts
    /// at byte 0 of the new buffer.
    fn with_packed_view(
        &self,
        buffer: jagged_buffer::ByteBuffer,
        shape: Vec<usize>,
        strides: Vec<isize>,
    ) -> Self {
        let mut out = self.with_geometry(shape, strides, 0);
        out.buffer = buffer;
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jagged_buffer::buffer;
    use jagged_dtype::DType;
    use jagged_error::JaggedError;

    use crate::slice::{IndexArray, JaggedRanges, MissingIndex, SliceItem, SliceSpec};
    use crate::{Identities, StridedArray};

    fn arange8() -> StridedArray {
        StridedArray::from_buffer(buffer![0i64, 1, 2, 3, 4, 5, 6, 7])
    }

    fn grid2x3() -> StridedArray {
        StridedArray::try_new(
            buffer![0i32, 1, 2, 3, 4, 5].into_byte_buffer(),
            vec![2, 3],
            vec![12, 4],
            0,
            DType::Int32,
        )
        .unwrap()
    }

    fn values<T: jagged_dtype::NativeDType>(array: &StridedArray) -> Vec<T> {
        array
            .to_contiguous()
            .unwrap()
            .typed_buffer::<T>()
            .unwrap()
            .to_vec()
    }

    #[test]
    fn range_with_step() {
        let spec = SliceSpec::new(vec![SliceItem::Range {
            start: Some(1),
            stop: Some(7),
            step: 2,
        }]);
        let out = arange8().getitem(&spec).unwrap();
        assert_eq!(out.shape(), &[3]);
        assert_eq!(values::<i64>(&out), vec![1, 3, 5]);
    }

    #[test]
    fn negative_step_reverses() {
        let spec = SliceSpec::new(vec![SliceItem::Range {
            start: None,
            stop: None,
            step: -1,
        }]);
        let out = arange8().getitem(&spec).unwrap();
        assert_eq!(values::<i64>(&out), vec![7, 6, 5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn negative_at_wraps() {
        let out = arange8()
            .getitem(&SliceSpec::new(vec![SliceItem::At(-2)]))
            .unwrap();
        assert!(out.is_scalar());
        assert_eq!(values::<i64>(&out), vec![6]);
    }

    #[test]
    fn at_out_of_range() {
        let err = arange8()
            .getitem(&SliceSpec::new(vec![SliceItem::At(10)]))
            .unwrap_err();
        assert!(matches!(err, JaggedError::IndexError(_)));
    }

    #[test]
    fn at_selects_a_row() {
        let out = grid2x3()
            .getitem(&SliceSpec::new(vec![SliceItem::At(1)]))
            .unwrap();
        assert_eq!(out.shape(), &[3]);
        assert_eq!(values::<i32>(&out), vec![3, 4, 5]);
    }

    #[test]
    fn at_at_selects_an_element() {
        let out = grid2x3()
            .getitem(&SliceSpec::new(vec![SliceItem::At(1), SliceItem::At(2)]))
            .unwrap();
        assert!(out.is_scalar());
        assert_eq!(values::<i32>(&out), vec![5]);
    }

    #[test]
    fn ellipsis_fills_leading_dimensions() {
        // grid[..., 1] selects column 1.
        let out = grid2x3()
            .getitem(&SliceSpec::new(vec![SliceItem::Ellipsis, SliceItem::At(1)]))
            .unwrap();
        assert_eq!(out.shape(), &[2]);
        assert_eq!(values::<i32>(&out), vec![1, 4]);
    }

    #[test]
    fn newaxis_inserts_a_dimension() {
        let out = arange8()
            .getitem(&SliceSpec::new(vec![SliceItem::NewAxis]))
            .unwrap();
        assert_eq!(out.shape(), &[1, 8]);
        assert_eq!(values::<i64>(&out), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn advanced_index_gathers() {
        let index = IndexArray::from_positions(buffer![4, 1, 1, -1]);
        let out = arange8()
            .getitem(&SliceSpec::new(vec![SliceItem::Array(index)]))
            .unwrap();
        assert_eq!(out.shape(), &[4]);
        assert_eq!(values::<i64>(&out), vec![4, 1, 1, 7]);
    }

    #[test]
    fn advanced_identity_round_trip() {
        let index = IndexArray::from_positions(buffer![0, 1, 2, 3, 4, 5, 6, 7]);
        let out = arange8()
            .getitem(&SliceSpec::new(vec![SliceItem::Array(index)]))
            .unwrap();
        assert_eq!(values::<i64>(&out), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn paired_advanced_indexes_broadcast() {
        // grid[[1, 0], [0, 2]] pairs up positions.
        let spec = SliceSpec::new(vec![
            SliceItem::Array(IndexArray::from_positions(buffer![1, 0])),
            SliceItem::Array(IndexArray::from_positions(buffer![0, 2])),
        ]);
        let out = grid2x3().getitem(&spec).unwrap();
        assert_eq!(out.shape(), &[2]);
        assert_eq!(values::<i32>(&out), vec![3, 2]);
    }

    #[test]
    fn advanced_index_of_rows() {
        let spec = SliceSpec::new(vec![SliceItem::Array(IndexArray::from_positions(buffer![
            1, 1, 0
        ]))]);
        let out = grid2x3().getitem(&spec).unwrap();
        assert_eq!(out.shape(), &[3, 3]);
        assert_eq!(values::<i32>(&out), vec![3, 4, 5, 3, 4, 5, 0, 1, 2]);
    }

    #[test]
    fn advanced_after_range() {
        // grid[:, [2, 0]]
        let spec = SliceSpec::new(vec![
            SliceItem::full_range(),
            SliceItem::Array(IndexArray::from_positions(buffer![2, 0])),
        ]);
        let out = grid2x3().getitem(&spec).unwrap();
        assert_eq!(out.shape(), &[2, 2]);
        assert_eq!(values::<i32>(&out), vec![2, 0, 5, 3]);
    }

    #[test]
    fn scalar_cannot_be_sliced() {
        let err = StridedArray::scalar(1i32)
            .getitem(&SliceSpec::new(vec![SliceItem::At(0)]))
            .unwrap_err();
        assert!(matches!(err, JaggedError::ShapeError(_)));
    }

    #[test]
    fn fields_are_rejected() {
        let err = arange8()
            .getitem(&SliceSpec::new(vec![SliceItem::Field("x".to_string())]))
            .unwrap_err();
        assert!(matches!(err, JaggedError::TypeError(_)));
    }

    #[test]
    fn jagged_slice_of_flat_array() {
        let jagged = SliceItem::Jagged(JaggedRanges {
            starts: buffer![0],
            stops: buffer![1],
        });
        let err = arange8()
            .getitem(&SliceSpec::new(vec![jagged.clone()]))
            .unwrap_err();
        assert!(matches!(err, JaggedError::TypeError(_)));

        let err = grid2x3()
            .getitem(&SliceSpec::new(vec![jagged]))
            .unwrap_err();
        assert!(matches!(err, JaggedError::NotImplemented(_)));
    }

    #[test]
    fn missing_slice_is_delegated() {
        let missing = SliceItem::Missing(MissingIndex {
            index: buffer![0, 1],
            validity: buffer![true, false],
        });
        let err = arange8()
            .getitem(&SliceSpec::new(vec![missing]))
            .unwrap_err();
        assert!(matches!(err, JaggedError::NotImplemented(_)));
    }

    #[test]
    fn identities_follow_an_advanced_gather() {
        let identities = Identities::try_new(buffer![0, 1, 2, 3, 4, 5, 6, 7], 1).unwrap();
        let array = arange8().with_identities(Some(identities));
        let index = IndexArray::from_positions(buffer![5, 2]);
        let out = array
            .getitem(&SliceSpec::new(vec![SliceItem::Array(index)]))
            .unwrap();
        let ids = out.identities().unwrap();
        assert_eq!(ids.row(0), &[5]);
        assert_eq!(ids.row(1), &[2]);
    }

    #[test]
    fn getitem_at_and_range_views() {
        let array = arange8();
        let element = array.getitem_at(-3).unwrap();
        assert_eq!(values::<i64>(&element), vec![5]);

        let tail = array.getitem_range(Some(-3), None).unwrap();
        assert_eq!(tail.shape(), &[3]);
        assert_eq!(values::<i64>(&tail), vec![5, 6, 7]);
        // The range is a zero-copy view.
        assert_eq!(tail.buffer().ptr_addr(), array.buffer().ptr_addr());
    }

    #[test]
    fn empty_range() {
        let out = arange8().getitem_range(Some(5), Some(2)).unwrap();
        assert_eq!(out.len(), 0);
    }
}

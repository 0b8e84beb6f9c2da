//! Structural queries and whole-array transforms.

use jagged_buffer::Buffer;
use jagged_dtype::{DType, f16, match_each_native_dtype};
use jagged_error::{JaggedResult, jagged_bail};

use crate::StridedArray;
use crate::backend::BackendId;
use crate::backend::kernels;

/// A right-padded array: values plus a validity mask over the leading
/// dimension. Padding slots hold default values and are marked invalid, the
/// flat rendition of an option-typed wrapper.
#[derive(Clone, Debug)]
pub struct Padded {
    /// The padded values; padding positions hold the element default.
    pub values: StridedArray,
    /// `false` exactly at the padding positions.
    pub validity: Buffer<bool>,
}

impl StridedArray {
    /// The number of elements at `axis`: a scalar for the leading dimension,
    /// an `int64` array of repeated inner extents for deeper axes.
    pub fn num(&self, axis: i64) -> JaggedResult<Self> {
        if self.is_scalar() {
            jagged_bail!(ShapeError: "cannot count the elements of a scalar");
        }
        let posaxis = self.wrap_axis(axis)?;
        if posaxis == 0 {
            return Ok(Self::scalar(self.len()));
        }
        if posaxis >= self.ndim() {
            jagged_bail!(InvalidArgument: "axis {} out of range for an array of {} dimensions", axis, self.ndim());
        }
        // One entry per element of the dimensions above the axis, each
        // holding the extent at the axis.
        let shape: Vec<usize> = self.shape[..posaxis].to_vec();
        let reps = shape.iter().product::<usize>();
        let counts = kernels::repeat_i64(self.shape[posaxis] as i64, reps);
        Ok(Self::new_unchecked(
            counts.into_byte_buffer(),
            shape.clone(),
            super::packed_strides(&shape, size_of::<i64>()),
            0,
            DType::Int64,
        ))
    }

    /// Each element's position within the leading dimension, as an `int64`
    /// array.
    pub fn local_index(&self, axis: i64) -> JaggedResult<Self> {
        if self.is_scalar() {
            jagged_bail!(ShapeError: "cannot index the elements of a scalar");
        }
        let posaxis = self.wrap_axis(axis)?;
        if posaxis != 0 {
            jagged_bail!(InvalidArgument: "axis {} out of range for local_index", axis);
        }
        let index = kernels::carry_arange(self.shape[0]);
        Ok(Self::from_buffer(index))
    }

    /// Combinations of `n` distinct elements. A flat leaf delegates the
    /// record-building to its container.
    pub fn combinations(&self, n: i64, _replacement: bool, axis: i64) -> JaggedResult<Self> {
        if n < 1 {
            jagged_bail!(InvalidArgument: "in combinations, 'n' must be at least 1");
        }
        let posaxis = self.wrap_axis(axis)?;
        if posaxis == 0 {
            jagged_bail!(
                NotImplemented: "combinations of a flat array are assembled by a record container"
            );
        }
        if self.ndim() <= 1 {
            jagged_bail!(InvalidArgument: "axis {} out of range for combinations", axis);
        }
        jagged_bail!(
            NotImplemented: "combinations of a multidimensional array are resolved by a regular container"
        )
    }

    /// Pad the leading dimension on the right up to `target` elements,
    /// without clipping: arrays already long enough come back unchanged and
    /// fully valid.
    pub fn rpad(&self, target: usize, axis: i64) -> JaggedResult<Padded> {
        self.check_paddable(axis)?;
        if target < self.shape[0] {
            return Ok(Padded {
                values: self.shallow_copy(),
                validity: Buffer::full(true, self.shape[0]),
            });
        }
        self.rpad_axis0(target)
    }

    /// Pad or clip the leading dimension to exactly `target` elements.
    pub fn rpad_and_clip(&self, target: usize, axis: i64) -> JaggedResult<Padded> {
        self.check_paddable(axis)?;
        self.rpad_axis0(target)
    }

    fn check_paddable(&self, axis: i64) -> JaggedResult<()> {
        if self.is_scalar() {
            jagged_bail!(ShapeError: "cannot pad a scalar");
        }
        if self.ndim() > 1 {
            jagged_bail!(
                NotImplemented: "padding a multidimensional array is resolved by a regular container"
            );
        }
        let posaxis = self.wrap_axis(axis)?;
        if posaxis != 0 {
            jagged_bail!(InvalidArgument: "axis {} exceeds the depth of this array", axis);
        }
        Ok(())
    }

    fn rpad_axis0(&self, target: usize) -> JaggedResult<Padded> {
        let contiguous = self.to_contiguous()?;
        let length = self.shape[0];
        let kept = target.min(length);
        let itemsize = self.item_size();

        let mut bytes = kernels::alloc_bytes(target * itemsize);
        bytes.as_mut_slice()[..kept * itemsize]
            .copy_from_slice(&contiguous.view_bytes()[..kept * itemsize]);
        let mut validity = vec![true; kept];
        validity.resize(target, false);

        Ok(Padded {
            values: self
                .with_packed_buffer(bytes.freeze(), vec![target], self.dtype())
                .with_identities(None),
            validity: Buffer::from(validity),
        })
    }

    /// Replacing missing values is the identity on an array with none.
    pub fn fillna(&self, _value: &StridedArray) -> Self {
        self.shallow_copy()
    }

    /// Move this array's buffer to another backend. A no-op shallow copy when
    /// the data is already resident there.
    pub fn copy_to(&self, backend: BackendId) -> JaggedResult<Self> {
        if backend == self.backend() {
            return Ok(self.shallow_copy());
        }
        let contiguous = self.to_contiguous()?;
        let dtype = contiguous.dtype();
        if dtype == DType::Float16 {
            jagged_bail!(NotImplemented: "no cross-backend transfer kernel for {}", dtype);
        }
        let moved = match_each_native_dtype!(dtype, |$T| {
            let data = contiguous.typed_buffer::<$T>()?;
            kernels::copy_typed(backend, self.backend(), &data)?.into_byte_buffer()
        });
        let mut out = self.with_packed_buffer(moved, self.shape.clone(), dtype);
        out.backend = backend;
        Ok(out)
    }

    /// Wrap a possibly negative axis against this array's dimensionality.
    fn wrap_axis(&self, axis: i64) -> JaggedResult<usize> {
        let wrapped = if axis < 0 {
            axis + self.ndim() as i64
        } else {
            axis
        };
        if wrapped < 0 {
            jagged_bail!(InvalidArgument: "axis {} out of range for an array of {} dimensions", axis, self.ndim());
        }
        Ok(wrapped as usize)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jagged_buffer::buffer;
    use jagged_error::JaggedError;

    use super::*;

    #[test]
    fn num_of_leading_axis_is_a_scalar() {
        let array = StridedArray::from_buffer(buffer![1i32, 2, 3]);
        let num = array.num(0).unwrap();
        assert!(num.is_scalar());
        assert_eq!(num.typed_buffer::<i64>().unwrap().as_slice(), &[3]);
    }

    #[test]
    fn num_of_inner_axis_repeats_the_extent() {
        let grid = StridedArray::from_buffer(buffer![0i16, 1, 2, 3, 4, 5])
            .with_geometry(vec![2, 3], vec![6, 2], 0);
        let num = grid.num(1).unwrap();
        assert_eq!(num.shape(), &[2]);
        assert_eq!(num.typed_buffer::<i64>().unwrap().as_slice(), &[3, 3]);

        let num = grid.num(-1).unwrap();
        assert_eq!(num.typed_buffer::<i64>().unwrap().as_slice(), &[3, 3]);
    }

    #[test]
    fn num_axis_out_of_range() {
        let array = StridedArray::from_buffer(buffer![1i32]);
        assert!(matches!(
            array.num(1),
            Err(JaggedError::InvalidArgument(_))
        ));
    }

    #[test]
    fn local_index_counts_positions() {
        let array = StridedArray::from_buffer(buffer![9f64, 8.0, 7.0]);
        let index = array.local_index(0).unwrap();
        assert_eq!(index.dtype(), DType::Int64);
        assert_eq!(index.typed_buffer::<i64>().unwrap().as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn combinations_validates_n() {
        let array = StridedArray::from_buffer(buffer![1i32, 2]);
        assert!(matches!(
            array.combinations(0, false, 0),
            Err(JaggedError::InvalidArgument(_))
        ));
        assert!(matches!(
            array.combinations(2, false, 0),
            Err(JaggedError::NotImplemented(_))
        ));
    }

    #[test]
    fn rpad_extends_with_invalid_slots() {
        let array = StridedArray::from_buffer(buffer![1i64, 2, 3]);
        let padded = array.rpad(5, 0).unwrap();
        assert_eq!(
            padded.values.typed_buffer::<i64>().unwrap().as_slice(),
            &[1, 2, 3, 0, 0]
        );
        assert_eq!(
            padded.validity.as_slice(),
            &[true, true, true, false, false]
        );
    }

    #[test]
    fn rpad_never_clips() {
        let array = StridedArray::from_buffer(buffer![1i64, 2, 3]);
        let padded = array.rpad(2, 0).unwrap();
        assert_eq!(padded.values.shape(), &[3]);
        assert_eq!(padded.validity.as_slice(), &[true, true, true]);
    }

    #[test]
    fn rpad_and_clip_truncates() {
        let array = StridedArray::from_buffer(buffer![1i64, 2, 3]);
        let padded = array.rpad_and_clip(2, 0).unwrap();
        assert_eq!(
            padded.values.typed_buffer::<i64>().unwrap().as_slice(),
            &[1, 2]
        );
        assert_eq!(padded.validity.as_slice(), &[true, true]);
    }

    #[test]
    fn fillna_is_the_identity() {
        let array = StridedArray::from_buffer(buffer![1u8, 2]);
        let filled = array.fillna(&StridedArray::scalar(0u8));
        assert_eq!(filled.buffer().ptr_addr(), array.buffer().ptr_addr());
    }

    #[test]
    fn copy_to_the_same_backend_is_shallow() {
        let array = StridedArray::from_buffer(buffer![1i32, 2]);
        let copied = array.copy_to(BackendId::Host).unwrap();
        assert_eq!(copied.buffer().ptr_addr(), array.buffer().ptr_addr());
    }
}

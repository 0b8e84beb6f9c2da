//! Conversion of arrays into slice items.

use jagged_dtype::match_each_integer_dtype;
use jagged_error::{JaggedResult, jagged_bail};

use crate::StridedArray;
use crate::backend::kernels;
use crate::slice::IndexArray;

impl StridedArray {
    /// Interpret this array as an advanced index for slicing another array.
    ///
    /// Integer arrays widen to a flat `int64` gather index; boolean arrays
    /// become the positions of their true elements, as NumPy's `nonzero`
    /// would produce. Anything else is a `TypeError`.
    pub fn as_index(&self) -> JaggedResult<IndexArray> {
        if self.ndim() != 1 {
            jagged_bail!(
                TypeError: "slice items can have all fixed-size dimensions or all var-sized dimensions, but not both"
            );
        }

        if self.dtype().is_integer() {
            let contiguous = self.to_contiguous()?;
            let dtype = contiguous.dtype();
            // The widening copy also moves the index onto a fresh aligned
            // allocation, whatever the provenance of the original buffer.
            let index = match_each_integer_dtype!(dtype, |$T| {
                kernels::fill_index(&contiguous.typed_buffer::<$T>()?)
            });
            return Ok(IndexArray::from_positions(index));
        }

        if self.dtype() == jagged_dtype::DType::Bool {
            let positions = kernels::nonzero_positions(
                self.buffer.as_slice(),
                self.byte_offset,
                self.shape[0],
                self.strides[0],
            );
            return Ok(IndexArray::from_bool_positions(positions));
        }

        jagged_bail!(
            TypeError: "only arrays of integers or booleans may be used as a slice, not {}",
            self.dtype()
        )
    }
}

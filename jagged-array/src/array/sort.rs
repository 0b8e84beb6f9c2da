//! Segmented sorting and argsorting over runs described by a parents
//! partition.

use jagged_buffer::Buffer;
use jagged_dtype::{f16, match_each_native_dtype};
use jagged_error::{JaggedResult, jagged_bail};
use log::debug;

use crate::StridedArray;
use crate::backend::kernels;

impl StridedArray {
    /// Sort each run of elements independently, preserving the element type
    /// and parameters.
    ///
    /// `negaxis` counts the sorted axis from the deepest dimension; a flat
    /// leaf only has its one dimension. With `keepdims`, equal-length runs
    /// fold into a trailing dimension instead of staying flat.
    #[allow(clippy::too_many_arguments)]
    pub fn sort_next(
        &self,
        negaxis: usize,
        starts: &Buffer<i64>,
        parents: &Buffer<i64>,
        outlength: usize,
        ascending: bool,
        stable: bool,
        keepdims: bool,
    ) -> JaggedResult<Self> {
        let contiguous = self.check_sortable(negaxis, starts, parents)?;
        let ranges = kernels::sorting_ranges(parents);
        let dtype = contiguous.dtype();

        let sorted = match_each_native_dtype!(dtype, |$T| {
            let data = contiguous.typed_buffer::<$T>()?;
            kernels::sort_runs(&data, &ranges, ascending, stable).into_byte_buffer()
        });

        let shape = sorted_shape(self.shape[0], starts, parents, outlength, keepdims);
        Ok(self
            .with_packed_buffer(sorted, shape, dtype)
            .with_identities(None))
    }

    /// Argsort each run of elements independently: output position `i` holds
    /// the run-local offset of the element that sorts to position `i` within
    /// its run. Parameters do not survive; the result is a plain index.
    #[allow(clippy::too_many_arguments)]
    pub fn argsort_next(
        &self,
        negaxis: usize,
        starts: &Buffer<i64>,
        parents: &Buffer<i64>,
        outlength: usize,
        ascending: bool,
        stable: bool,
        keepdims: bool,
    ) -> JaggedResult<Self> {
        let contiguous = self.check_sortable(negaxis, starts, parents)?;
        let ranges = kernels::sorting_ranges(parents);
        let dtype = contiguous.dtype();

        let positions = match_each_native_dtype!(dtype, |$T| {
            let data = contiguous.typed_buffer::<$T>()?;
            kernels::argsort_runs(&data, &ranges, ascending, stable).into_byte_buffer()
        });

        let shape = sorted_shape(self.shape[0], starts, parents, outlength, keepdims);
        Ok(
            StridedArray::new_unchecked(
                positions,
                shape.clone(),
                super::packed_strides(&shape, size_of::<i64>()),
                0,
                jagged_dtype::DType::Int64,
            ),
        )
    }

    /// Shared validation of the segmented sorting operations; returns the
    /// contiguous rendition of the data.
    fn check_sortable(
        &self,
        negaxis: usize,
        starts: &Buffer<i64>,
        parents: &Buffer<i64>,
    ) -> JaggedResult<Self> {
        if self.is_scalar() {
            jagged_bail!(ShapeError: "cannot sort a scalar");
        }
        if self.ndim() > 1 {
            jagged_bail!(
                NotImplemented: "sorting a multidimensional array is resolved by a regular container"
            );
        }
        if !self.dtype().has_native_kernels() || self.dtype() == jagged_dtype::DType::Float16 {
            jagged_bail!(NotImplemented: "no sorting kernel for dtype {}", self.dtype());
        }
        if negaxis != 1 {
            jagged_bail!(
                InvalidArgument: "axis {} counted from the deepest dimension exceeds the depth of this array",
                negaxis
            );
        }
        if parents.len() != self.shape[0] {
            jagged_bail!(
                InvalidArgument: "parents length {} does not match array length {}",
                parents.len(),
                self.shape[0]
            );
        }
        if starts.len() > parents.len() && !parents.is_empty() {
            jagged_bail!(
                InvalidArgument: "{} run starts for {} elements",
                starts.len(),
                parents.len()
            );
        }
        if !self.is_contiguous() {
            debug!("normalizing a strided array before sorting");
        }
        self.to_contiguous()
    }
}

/// The output shape of a segmented sort: flat, unless `keepdims` folds the
/// equal-length runs into a trailing dimension.
fn sorted_shape(
    length: usize,
    starts: &Buffer<i64>,
    parents: &Buffer<i64>,
    _outlength: usize,
    keepdims: bool,
) -> Vec<usize> {
    if !keepdims {
        return vec![length];
    }
    let size = if starts.is_empty() {
        1
    } else {
        parents.len() / starts.len()
    };
    if size == 0 {
        vec![length, 1]
    } else {
        vec![length / size, size]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jagged_buffer::buffer;
    use jagged_dtype::DType;
    use jagged_error::JaggedError;

    use super::*;

    fn values<T: jagged_dtype::NativeDType>(array: &StridedArray) -> Vec<T> {
        array.typed_buffer::<T>().unwrap().to_vec()
    }

    #[test]
    fn sorts_each_run() {
        let array = StridedArray::from_buffer(buffer![3i64, 1, 2, 9, 7, 8]);
        let sorted = array
            .sort_next(1, &buffer![0, 3], &buffer![0, 0, 0, 1, 1, 1], 2, true, true, false)
            .unwrap();
        assert_eq!(sorted.dtype(), DType::Int64);
        assert_eq!(values::<i64>(&sorted), vec![1, 2, 3, 7, 8, 9]);
    }

    #[test]
    fn descending_sort() {
        let array = StridedArray::from_buffer(buffer![3i32, 1, 2]);
        let sorted = array
            .sort_next(1, &buffer![0], &buffer![0, 0, 0], 1, false, false, false)
            .unwrap();
        assert_eq!(values::<i32>(&sorted), vec![3, 2, 1]);
    }

    #[test]
    fn argsort_gives_run_local_positions() {
        let array = StridedArray::from_buffer(buffer![3i64, 1, 2, 9, 7, 8]);
        let positions = array
            .argsort_next(1, &buffer![0, 3], &buffer![0, 0, 0, 1, 1, 1], 2, true, true, false)
            .unwrap();
        assert_eq!(positions.dtype(), DType::Int64);
        assert_eq!(values::<i64>(&positions), vec![1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn keepdims_folds_equal_runs() {
        let array = StridedArray::from_buffer(buffer![3i64, 1, 2, 9, 7, 8]);
        let sorted = array
            .sort_next(1, &buffer![0, 3], &buffer![0, 0, 0, 1, 1, 1], 2, true, true, true)
            .unwrap();
        assert_eq!(sorted.shape(), &[2, 3]);
        assert_eq!(values::<i64>(&sorted), vec![1, 2, 3, 7, 8, 9]);
    }

    #[test]
    fn sorting_preserves_parameters() {
        let mut params = crate::Parameters::new();
        params.insert("__doc__".to_string(), serde_json::json!("tagged"));
        let array = StridedArray::from_buffer(buffer![2u8, 1]).with_parameters(params.clone());
        let sorted = array
            .sort_next(1, &buffer![0], &buffer![0, 0], 1, true, true, false)
            .unwrap();
        assert_eq!(sorted.parameters(), &params);

        let positions = array
            .argsort_next(1, &buffer![0], &buffer![0, 0], 1, true, true, false)
            .unwrap();
        assert!(positions.parameters().is_empty());
    }

    #[test]
    fn floats_sort_by_value() {
        let array = StridedArray::from_buffer(buffer![2.5f64, -1.0, 0.5]);
        let sorted = array
            .sort_next(1, &buffer![0], &buffer![0, 0, 0], 1, true, true, false)
            .unwrap();
        assert_eq!(values::<f64>(&sorted), vec![-1.0, 0.5, 2.5]);
    }

    #[test]
    fn invalid_axis() {
        let array = StridedArray::from_buffer(buffer![1i32, 2]);
        assert!(matches!(
            array.sort_next(2, &buffer![0], &buffer![0, 0], 1, true, true, false),
            Err(JaggedError::InvalidArgument(_))
        ));
    }

    #[test]
    fn unsupported_dtype() {
        let halves = StridedArray::from_buffer(buffer![f16::from_f32(1.0)]);
        assert!(matches!(
            halves.sort_next(1, &buffer![0], &buffer![0], 1, true, true, false),
            Err(JaggedError::NotImplemented(_))
        ));
    }
}

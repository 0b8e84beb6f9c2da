//! Type-promoting concatenation along the leading dimension.

use jagged_buffer::{BufferMut, ByteBufferMut};
use jagged_dtype::{DType, NativeNumber, f16, match_each_number_dtype, promote};
use jagged_error::{JaggedResult, jagged_bail};

use crate::parameters::is_bytestring;
use crate::StridedArray;

/// A numeric value widened to the top of its kind, the interchange format of
/// the converting merge.
#[derive(Clone, Copy, Debug)]
enum NumValue {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl NumValue {
    fn cast<T: NativeNumber>(self) -> T {
        let value = match self {
            NumValue::I64(x) => num_traits::cast::<_, T>(x),
            NumValue::U64(x) => num_traits::cast::<_, T>(x),
            NumValue::F64(x) => num_traits::cast::<_, T>(x),
        };
        value.unwrap_or_default()
    }
}

impl StridedArray {
    /// Whether this array can concatenate with `other`. With `mergebool`,
    /// booleans additionally mix with any promotable numeric type.
    pub fn mergeable(&self, other: &StridedArray, mergebool: bool) -> bool {
        jagged_dtype::mergeable(self.dtype(), other.dtype(), mergebool)
    }

    /// Concatenate `other` after this array, promoting the element type
    /// through the numeric lattice where the types differ.
    pub fn merge(&self, other: &StridedArray) -> JaggedResult<Self> {
        if self.is_scalar() || other.is_scalar() {
            jagged_bail!(ShapeError: "cannot merge a scalar");
        }

        if self.item_size() == 1
            && other.item_size() == 1
            && self.ndim() == 1
            && other.ndim() == 1
            && is_bytestring(self.parameters())
            && is_bytestring(other.parameters())
        {
            return self.merge_bytes(other);
        }

        if self.ndim() != other.ndim() {
            jagged_bail!(
                ShapeError: "cannot merge a {}-dimensional array with a {}-dimensional array",
                self.ndim(),
                other.ndim()
            );
        }
        if self.shape[1..] != other.shape[1..] {
            jagged_bail!(
                ShapeError: "cannot merge arrays with inner shapes {:?} and {:?}",
                &self.shape[1..],
                &other.shape[1..]
            );
        }

        let Some(promoted) = promote(self.dtype(), other.dtype()) else {
            jagged_bail!(
                TypeError: "cannot merge an array of {} with an array of {}",
                self.dtype(),
                other.dtype()
            );
        };

        let lhs = self.to_contiguous()?;
        let rhs = other.to_contiguous()?;
        let mut shape = self.shape.clone();
        shape[0] += other.shape[0];

        if self.dtype() == promoted && other.dtype() == promoted {
            let mut bytes = ByteBufferMut::with_capacity_aligned(
                lhs.view_bytes().len() + rhs.view_bytes().len(),
                jagged_buffer::Alignment::new(crate::backend::kernels::ALLOC_ALIGNMENT),
            );
            bytes.extend_from_slice(lhs.view_bytes());
            bytes.extend_from_slice(rhs.view_bytes());
            return Ok(self
                .with_packed_buffer(bytes.freeze(), shape, promoted)
                .with_identities(None));
        }

        let mut values = lhs.widened_values()?;
        values.extend(rhs.widened_values()?);
        let buffer = match_each_number_dtype!(promoted, |$T| {
            let mut out = BufferMut::<$T>::with_capacity(values.len());
            for value in values {
                out.push(value.cast::<$T>());
            }
            out.freeze().into_byte_buffer()
        });
        Ok(self
            .with_packed_buffer(buffer, shape, promoted)
            .with_identities(None))
    }

    /// Concatenate byte- or char-interpreted data by raw copy.
    fn merge_bytes(&self, other: &StridedArray) -> JaggedResult<Self> {
        let lhs = self.to_contiguous()?;
        let rhs = other.to_contiguous()?;
        let mut bytes =
            ByteBufferMut::with_capacity(lhs.view_bytes().len() + rhs.view_bytes().len());
        bytes.extend_from_slice(lhs.view_bytes());
        bytes.extend_from_slice(rhs.view_bytes());
        let shape = vec![self.shape[0] + other.shape[0]];
        Ok(self
            .with_packed_buffer(bytes.freeze(), shape, self.dtype())
            .with_identities(None))
    }

    /// The elements of a contiguous numeric array, widened to the top of
    /// their kind.
    fn widened_values(&self) -> JaggedResult<Vec<NumValue>> {
        let dtype = self.dtype();
        match_each_number_dtype!(dtype, |$T| {
            let data = self.typed_buffer::<$T>()?;
            Ok(data.iter().map(|x| widen(x, dtype)).collect())
        })
    }
}

fn widen<T: NativeNumber>(value: &T, dtype: DType) -> NumValue {
    if dtype.is_float() {
        NumValue::F64(value.to_f64().unwrap_or(f64::NAN))
    } else if dtype.is_unsigned_integer() {
        NumValue::U64(value.to_u64().unwrap_or_default())
    } else {
        NumValue::I64(value.to_i64().unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jagged_buffer::buffer;
    use jagged_dtype::DType;
    use jagged_error::JaggedError;
    use serde_json::json;

    use crate::{Parameters, StridedArray};

    fn values<T: jagged_dtype::NativeDType>(array: &StridedArray) -> Vec<T> {
        array.typed_buffer::<T>().unwrap().to_vec()
    }

    #[test]
    fn same_dtype_concatenates_raw() {
        let lhs = StridedArray::from_buffer(buffer![1i32, 2]);
        let rhs = StridedArray::from_buffer(buffer![3i32, 4, 5]);
        let merged = lhs.merge(&rhs).unwrap();
        assert_eq!(merged.dtype(), DType::Int32);
        assert_eq!(merged.shape(), &[5]);
        assert_eq!(values::<i32>(&merged), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn small_int_and_float_promote() {
        let lhs = StridedArray::from_buffer(buffer![1i8, 2, 3]);
        let rhs = StridedArray::from_buffer(buffer![4.5f32, 5.5]);
        let merged = lhs.merge(&rhs).unwrap();
        assert_eq!(merged.dtype(), DType::Float32);
        assert_eq!(values::<f32>(&merged), vec![1.0, 2.0, 3.0, 4.5, 5.5]);
    }

    #[test]
    fn wide_int_and_float32_widen_to_float64() {
        let lhs = StridedArray::from_buffer(buffer![1i32, 2, 3]);
        let rhs = StridedArray::from_buffer(buffer![4.5f32, 5.5]);
        let merged = lhs.merge(&rhs).unwrap();
        assert_eq!(merged.dtype(), DType::Float64);
        assert_eq!(values::<f64>(&merged), vec![1.0, 2.0, 3.0, 4.5, 5.5]);
    }

    #[test]
    fn unsigned_and_signed_widen() {
        let lhs = StridedArray::from_buffer(buffer![250u8, 251]);
        let rhs = StridedArray::from_buffer(buffer![-1i8, -2]);
        let merged = lhs.merge(&rhs).unwrap();
        assert_eq!(merged.dtype(), DType::Int16);
        assert_eq!(values::<i16>(&merged), vec![250, 251, -1, -2]);
    }

    #[test]
    fn merge_commutes_on_dtype() {
        let lhs = StridedArray::from_buffer(buffer![1u32, 2]);
        let rhs = StridedArray::from_buffer(buffer![3i32, 4]);
        assert_eq!(lhs.merge(&rhs).unwrap().dtype(), DType::Int64);
        assert_eq!(rhs.merge(&lhs).unwrap().dtype(), DType::Int64);
    }

    #[test]
    fn strided_operands_are_normalized_first() {
        let base = StridedArray::from_buffer(buffer![0i64, 1, 2, 3, 4, 5]);
        let evens = base.with_geometry(vec![3], vec![16], 0);
        let merged = evens.merge(&StridedArray::from_buffer(buffer![9i64])).unwrap();
        assert_eq!(values::<i64>(&merged), vec![0, 2, 4, 9]);
    }

    #[test]
    fn bool_only_merges_with_bool() {
        let flags = StridedArray::from_buffer(buffer![true, false]);
        assert!(flags.mergeable(&StridedArray::from_buffer(buffer![true]), false));
        let merged = flags
            .merge(&StridedArray::from_buffer(buffer![true]))
            .unwrap();
        assert_eq!(merged.dtype(), DType::Bool);
        assert_eq!(values::<bool>(&merged), vec![true, false, true]);

        let err = flags
            .merge(&StridedArray::from_buffer(buffer![1i32]))
            .unwrap_err();
        assert!(matches!(err, JaggedError::TypeError(_)));
    }

    #[test]
    fn scalars_cannot_merge() {
        let err = StridedArray::scalar(1i32)
            .merge(&StridedArray::from_buffer(buffer![1i32]))
            .unwrap_err();
        assert!(matches!(err, JaggedError::ShapeError(_)));
    }

    #[test]
    fn mismatched_inner_shapes_cannot_merge() {
        let lhs = StridedArray::from_buffer(buffer![1i32, 2, 3, 4])
            .with_geometry(vec![2, 2], vec![8, 4], 0);
        let rhs = StridedArray::from_buffer(buffer![1i32, 2, 3, 4, 5, 6])
            .with_geometry(vec![2, 3], vec![12, 4], 0);
        assert!(matches!(
            lhs.merge(&rhs),
            Err(JaggedError::ShapeError(_))
        ));
    }

    #[test]
    fn char_data_concatenates_as_bytes() {
        let mut params = Parameters::new();
        params.insert("__array__".to_string(), json!("char"));
        let lhs = StridedArray::from_buffer(buffer![b'h', b'e']).with_parameters(params.clone());
        let rhs = StridedArray::from_buffer(buffer![b'y', b'!']).with_parameters(params);
        let merged = lhs.merge(&rhs).unwrap();
        assert_eq!(merged.shape(), &[4]);
        assert_eq!(values::<u8>(&merged), vec![b'h', b'e', b'y', b'!']);
    }
}

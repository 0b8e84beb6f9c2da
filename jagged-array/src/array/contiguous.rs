//! Layout normalization: packing arbitrary strided windows into row-major
//! buffers.

use jagged_buffer::ByteBuffer;
use jagged_error::JaggedResult;

use crate::StridedArray;
use crate::backend::kernels;

impl StridedArray {
    /// Whether the window is packed row-major: scanning from the innermost
    /// dimension outward, each stride is exactly the extent of everything
    /// inside it. A scalar is contiguous.
    pub fn is_contiguous(&self) -> bool {
        let mut expected = self.item_size() as isize;
        for (&extent, &stride) in self.shape.iter().zip(&self.strides).rev() {
            if stride != expected {
                return false;
            }
            expected *= extent as isize;
        }
        true
    }

    /// A row-major packed equivalent of this array: the shallow copy when
    /// already contiguous, otherwise a freshly gathered buffer.
    pub fn to_contiguous(&self) -> JaggedResult<Self> {
        if self.is_contiguous() {
            return Ok(self.shallow_copy());
        }
        let bytepos: Vec<i64> = (0..self.shape[0] as i64)
            .map(|i| i * self.strides[0] as i64)
            .collect();
        let packed = self.contiguous_next(&bytepos)?;
        Ok(self.with_packed_buffer(packed, self.shape.clone(), self.dtype()))
    }

    /// Resolve one dimension of byte positions per recursion level: positions
    /// are byte distances from `byte_offset` to the start of each row.
    fn contiguous_next(&self, bytepos: &[i64]) -> JaggedResult<ByteBuffer> {
        if self.is_contiguous() {
            // Everything below the rows is already packed, so each row is one
            // solid block.
            return kernels::gather_bytes_at(
                self.backend(),
                self.buffer.as_slice(),
                self.byte_offset,
                bytepos,
                self.strides[0] as usize,
            );
        }
        if self.ndim() == 1 {
            return kernels::gather_bytes_at(
                self.backend(),
                self.buffer.as_slice(),
                self.byte_offset,
                bytepos,
                self.item_size(),
            );
        }
        let inner = self.shape[1] as i64;
        let mut nextbytepos = Vec::with_capacity(bytepos.len() * self.shape[1]);
        for &pos in bytepos {
            for j in 0..inner {
                nextbytepos.push(pos + j * self.strides[1] as i64);
            }
        }
        let next = self.with_geometry(
            self.shape[1..].to_vec(),
            self.strides[1..].to_vec(),
            self.byte_offset,
        );
        next.contiguous_next(&nextbytepos)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jagged_buffer::buffer;
    use jagged_dtype::DType;

    use crate::StridedArray;

    #[test]
    fn packed_arrays_are_contiguous() {
        let array = StridedArray::from_buffer(buffer![1i16, 2, 3]);
        assert!(array.is_contiguous());
        assert!(StridedArray::scalar(1.5f32).is_contiguous());
    }

    #[test]
    fn contiguous_is_a_shallow_copy() {
        let array = StridedArray::from_buffer(buffer![1i64, 2, 3]);
        let packed = array.to_contiguous().unwrap();
        assert_eq!(packed.buffer().ptr_addr(), array.buffer().ptr_addr());
    }

    #[test]
    fn packs_a_strided_view() {
        // Every other element of [0, 1, .., 7].
        let base = StridedArray::from_buffer(buffer![0i32, 1, 2, 3, 4, 5, 6, 7]);
        let view = base.with_geometry(vec![4], vec![8], 0);
        assert!(!view.is_contiguous());
        let packed = view.to_contiguous().unwrap();
        assert!(packed.is_contiguous());
        assert_eq!(
            packed.typed_buffer::<i32>().unwrap().as_slice(),
            &[0, 2, 4, 6]
        );
    }

    #[test]
    fn packs_a_reversed_view() {
        let base = StridedArray::from_buffer(buffer![10i64, 20, 30, 40]);
        let view = base.with_geometry(vec![4], vec![-8], 24);
        let packed = view.to_contiguous().unwrap();
        assert_eq!(
            packed.typed_buffer::<i64>().unwrap().as_slice(),
            &[40, 30, 20, 10]
        );
    }

    #[test]
    fn packs_a_transposed_view() {
        // A 2x3 view of a row-major 3x2 block is its transpose.
        let base = StridedArray::try_new(
            buffer![1i32, 2, 3, 4, 5, 6].into_byte_buffer(),
            vec![3, 2],
            vec![8, 4],
            0,
            DType::Int32,
        )
        .unwrap();
        let transposed = base.with_geometry(vec![2, 3], vec![4, 8], 0);
        let packed = transposed.to_contiguous().unwrap();
        assert_eq!(packed.shape(), &[2, 3]);
        assert_eq!(packed.strides(), &[12, 4]);
        assert_eq!(
            packed.typed_buffer::<i32>().unwrap().as_slice(),
            &[1, 3, 5, 2, 4, 6]
        );
    }

    #[test]
    fn round_trip_preserves_values() {
        let base = StridedArray::from_buffer(buffer![0f64, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let view = base.with_geometry(vec![3], vec![16], 8);
        let once = view.to_contiguous().unwrap();
        let twice = once.to_contiguous().unwrap();
        assert_eq!(once.buffer().ptr_addr(), twice.buffer().ptr_addr());
        assert_eq!(
            twice.typed_buffer::<f64>().unwrap().as_slice(),
            &[1.0, 3.0, 5.0]
        );
    }
}

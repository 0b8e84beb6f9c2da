//! JSON rendering.

use jagged_dtype::{DType, NativeDType, f16, match_each_native_dtype};
use jagged_error::{JaggedResult, jagged_bail};
use serde_json::Value;

use crate::StridedArray;
use crate::parameters::is_bytestring;

/// A native element rendered as a JSON value.
trait ToJson: NativeDType {
    fn to_json(&self) -> Value;
}

macro_rules! json_integer {
    ($($T:ty),*) => {$(
        impl ToJson for $T {
            fn to_json(&self) -> Value {
                Value::from(*self)
            }
        }
    )*};
}

json_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl ToJson for bool {
    fn to_json(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToJson for f32 {
    fn to_json(&self) -> Value {
        // Non-finite values have no JSON rendition.
        serde_json::Number::from_f64(f64::from(*self))
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl ToJson for f64 {
    fn to_json(&self) -> Value {
        serde_json::Number::from_f64(*self)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl ToJson for f16 {
    fn to_json(&self) -> Value {
        serde_json::Number::from_f64(self.to_f64())
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl StridedArray {
    /// Render this array as a JSON value: a scalar value, a list, or nested
    /// lists per dimension. Byte- and char-interpreted data renders as a
    /// string.
    pub fn to_json(&self) -> JaggedResult<Value> {
        if is_bytestring(self.parameters()) && self.item_size() == 1 && self.ndim() == 1 {
            let contiguous = self.to_contiguous()?;
            return Ok(Value::String(
                String::from_utf8_lossy(contiguous.view_bytes()).into_owned(),
            ));
        }
        if self.dtype() == DType::Float16 {
            jagged_bail!(NotImplemented: "no JSON rendering for dtype {}", self.dtype());
        }

        let contiguous = self.to_contiguous()?;
        let dtype = contiguous.dtype();
        match_each_native_dtype!(dtype, |$T| {
            let data = contiguous.typed_buffer::<$T>()?;
            Ok(json_level(&data, contiguous.shape(), &|x: &$T| x.to_json()))
        })
    }

    /// Read one element at an absolute byte position in the buffer, rendered
    /// as a JSON value. A diagnostics read; bulk access goes through the
    /// kernels.
    pub fn element_at(&self, byte_offset: usize) -> JaggedResult<Value> {
        if byte_offset + self.item_size() > self.buffer().len() {
            jagged_bail!(
                IndexError: "byte position {} out of range for a buffer of {} bytes",
                byte_offset,
                self.buffer().len()
            );
        }
        let dtype = self.dtype();
        match_each_native_dtype!(dtype, |$T| {
            // One aligned copy; the source position may be unaligned.
            let copied = crate::backend::kernels::gather_bytes_at(
                self.backend(),
                self.buffer().as_slice(),
                0,
                &[byte_offset as i64],
                self.item_size(),
            )?;
            let element = jagged_buffer::Buffer::<$T>::from_byte_buffer(copied);
            Ok(element[0].to_json())
        })
    }
}

/// Render one dimension of packed row-major data.
fn json_level<T>(data: &[T], shape: &[usize], render: &impl Fn(&T) -> Value) -> Value {
    let Some((&extent, inner)) = shape.split_first() else {
        return render(&data[0]);
    };
    if extent == 0 {
        return Value::Array(vec![]);
    }
    let chunk = data.len() / extent;
    if chunk == 0 {
        // An empty inner dimension: rows exist but hold nothing.
        return Value::Array((0..extent).map(|_| json_level(&[], inner, render)).collect());
    }
    Value::Array(
        data.chunks(chunk)
            .map(|row| json_level(row, inner, render))
            .collect(),
    )
}

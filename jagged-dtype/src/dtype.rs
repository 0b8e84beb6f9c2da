use std::fmt::{Display, Formatter};

/// The element type of a flat array.
///
/// Every variant names a fixed-width machine type. The first nine have native
/// Rust representations; `Float16` is backed by [`half::f16`]. `Float128` and
/// the complex variants are carried as raw bytes only, with no kernels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DType {
    /// A boolean, stored as one byte.
    Bool,
    /// A signed 8-bit integer.
    Int8,
    /// A signed 16-bit integer.
    Int16,
    /// A signed 32-bit integer.
    Int32,
    /// A signed 64-bit integer.
    Int64,
    /// An unsigned 8-bit integer.
    UInt8,
    /// An unsigned 16-bit integer.
    UInt16,
    /// An unsigned 32-bit integer.
    UInt32,
    /// An unsigned 64-bit integer.
    UInt64,
    /// A 16-bit IEEE 754 float.
    Float16,
    /// A 32-bit IEEE 754 float.
    Float32,
    /// A 64-bit IEEE 754 float.
    Float64,
    /// A 128-bit float. Bytes only, no kernels.
    Float128,
    /// A complex number of two 32-bit floats. Bytes only, no kernels.
    Complex64,
    /// A complex number of two 64-bit floats. Bytes only, no kernels.
    Complex128,
    /// A complex number of two 128-bit floats. Bytes only, no kernels.
    Complex256,
}

/// Every dtype, in declaration order.
pub const ALL_DTYPES: [DType; 16] = [
    DType::Bool,
    DType::Int8,
    DType::Int16,
    DType::Int32,
    DType::Int64,
    DType::UInt8,
    DType::UInt16,
    DType::UInt32,
    DType::UInt64,
    DType::Float16,
    DType::Float32,
    DType::Float64,
    DType::Float128,
    DType::Complex64,
    DType::Complex128,
    DType::Complex256,
];

impl DType {
    /// The size of one element in bytes.
    pub const fn byte_width(&self) -> usize {
        match self {
            DType::Bool | DType::Int8 | DType::UInt8 => 1,
            DType::Int16 | DType::UInt16 | DType::Float16 => 2,
            DType::Int32 | DType::UInt32 | DType::Float32 => 4,
            DType::Int64 | DType::UInt64 | DType::Float64 | DType::Complex64 => 8,
            DType::Float128 | DType::Complex128 => 16,
            DType::Complex256 => 32,
        }
    }

    /// Whether this is a signed or unsigned integer dtype.
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            DType::Int8
                | DType::Int16
                | DType::Int32
                | DType::Int64
                | DType::UInt8
                | DType::UInt16
                | DType::UInt32
                | DType::UInt64
        )
    }

    /// Whether this is a signed integer dtype.
    pub const fn is_signed_integer(&self) -> bool {
        matches!(self, DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64)
    }

    /// Whether this is an unsigned integer dtype.
    pub const fn is_unsigned_integer(&self) -> bool {
        matches!(
            self,
            DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64
        )
    }

    /// Whether this is a float dtype (of any width).
    pub const fn is_float(&self) -> bool {
        matches!(
            self,
            DType::Float16 | DType::Float32 | DType::Float64 | DType::Float128
        )
    }

    /// Whether this is a complex dtype.
    pub const fn is_complex(&self) -> bool {
        matches!(self, DType::Complex64 | DType::Complex128 | DType::Complex256)
    }

    /// Whether this dtype has a native Rust representation, and therefore
    /// typed kernels. The others are carried as opaque bytes.
    pub const fn has_native_kernels(&self) -> bool {
        !matches!(
            self,
            DType::Float128 | DType::Complex64 | DType::Complex128 | DType::Complex256
        )
    }

    /// The NumPy struct-format string for this dtype.
    pub const fn format(&self) -> &'static str {
        match self {
            DType::Bool => "?",
            DType::Int8 => "b",
            DType::Int16 => "h",
            DType::Int32 => "i",
            DType::Int64 => "q",
            DType::UInt8 => "B",
            DType::UInt16 => "H",
            DType::UInt32 => "I",
            DType::UInt64 => "Q",
            DType::Float16 => "e",
            DType::Float32 => "f",
            DType::Float64 => "d",
            DType::Float128 => "g",
            DType::Complex64 => "Zf",
            DType::Complex128 => "Zd",
            DType::Complex256 => "Zg",
        }
    }

    /// The NumPy-style name of this dtype, e.g. `"float64"`.
    pub const fn name(&self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float16 => "float16",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Float128 => "float128",
            DType::Complex64 => "complex64",
            DType::Complex128 => "complex128",
            DType::Complex256 => "complex256",
        }
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert_eq!(DType::Bool.byte_width(), 1);
        assert_eq!(DType::Float16.byte_width(), 2);
        assert_eq!(DType::Complex256.byte_width(), 32);
    }

    #[test]
    fn predicates() {
        assert!(DType::UInt32.is_integer());
        assert!(!DType::UInt32.is_signed_integer());
        assert!(DType::Float128.is_float());
        assert!(!DType::Float128.has_native_kernels());
        assert!(DType::Float16.has_native_kernels());
        assert!(DType::Complex64.is_complex());
    }

    #[test]
    fn names_and_formats() {
        assert_eq!(DType::Int64.to_string(), "int64");
        assert_eq!(DType::Int64.format(), "q");
        assert_eq!(DType::Complex128.format(), "Zd");
    }
}

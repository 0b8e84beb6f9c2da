use std::fmt::{Debug, Display};

use half::f16;

use crate::DType;

/// A Rust type that is the in-memory representation of a [`DType`].
pub trait NativeDType:
    'static + Copy + Send + Sync + Debug + Display + Default + PartialEq + PartialOrd
{
    /// The dtype this type represents.
    const DTYPE: DType;

    /// Whether this value is "truthy" when converted to a boolean.
    fn is_nonzero(&self) -> bool;
}

/// A [`NativeDType`] with the numeric casts required by conversion kernels.
pub trait NativeNumber: NativeDType + num_traits::NumCast + num_traits::ToPrimitive {}

impl<T: NativeDType + num_traits::NumCast + num_traits::ToPrimitive> NativeNumber for T {}

macro_rules! native_dtype {
    ($T:ty, $variant:ident) => {
        impl NativeDType for $T {
            const DTYPE: DType = DType::$variant;

            #[inline]
            fn is_nonzero(&self) -> bool {
                *self != <$T>::default()
            }
        }
    };
}

native_dtype!(bool, Bool);
native_dtype!(i8, Int8);
native_dtype!(i16, Int16);
native_dtype!(i32, Int32);
native_dtype!(i64, Int64);
native_dtype!(u8, UInt8);
native_dtype!(u16, UInt16);
native_dtype!(u32, UInt32);
native_dtype!(u64, UInt64);
native_dtype!(f16, Float16);
native_dtype!(f32, Float32);
native_dtype!(f64, Float64);

/// Expands a block of code for the native Rust type of a dtype.
///
/// The enclosing function must return a `JaggedResult`: dtypes with no native
/// representation (`Float128` and the complex family) early-return a
/// `NotImplemented` error. Call sites that can see `Float16` data must have
/// [`f16`] in scope.
///
/// ```
/// use jagged_dtype::{match_each_native_dtype, DType, f16};
/// use jagged_error::JaggedResult;
///
/// fn byte_width(dtype: DType) -> JaggedResult<usize> {
///     Ok(match_each_native_dtype!(dtype, |$T| size_of::<$T>()))
/// }
/// ```
#[macro_export]
macro_rules! match_each_native_dtype {
    ($self:expr, | $_:tt $T:ident | $($body:tt)*) => ({
        macro_rules! __with__ {( $_ $T:ident ) => ( $($body)* )}
        match $self {
            $crate::DType::Bool => __with__! { bool },
            $crate::DType::Int8 => __with__! { i8 },
            $crate::DType::Int16 => __with__! { i16 },
            $crate::DType::Int32 => __with__! { i32 },
            $crate::DType::Int64 => __with__! { i64 },
            $crate::DType::UInt8 => __with__! { u8 },
            $crate::DType::UInt16 => __with__! { u16 },
            $crate::DType::UInt32 => __with__! { u32 },
            $crate::DType::UInt64 => __with__! { u64 },
            $crate::DType::Float16 => __with__! { f16 },
            $crate::DType::Float32 => __with__! { f32 },
            $crate::DType::Float64 => __with__! { f64 },
            other => {
                return Err(::jagged_error::jagged_err!(
                    NotImplemented: "no native kernels for dtype {}", other
                ));
            }
        }
    });
}

/// Like [`match_each_native_dtype!`], restricted to the non-boolean numeric
/// dtypes. `Bool` early-returns a `TypeError`.
#[macro_export]
macro_rules! match_each_number_dtype {
    ($self:expr, | $_:tt $T:ident | $($body:tt)*) => ({
        macro_rules! __with__ {( $_ $T:ident ) => ( $($body)* )}
        match $self {
            $crate::DType::Int8 => __with__! { i8 },
            $crate::DType::Int16 => __with__! { i16 },
            $crate::DType::Int32 => __with__! { i32 },
            $crate::DType::Int64 => __with__! { i64 },
            $crate::DType::UInt8 => __with__! { u8 },
            $crate::DType::UInt16 => __with__! { u16 },
            $crate::DType::UInt32 => __with__! { u32 },
            $crate::DType::UInt64 => __with__! { u64 },
            $crate::DType::Float16 => __with__! { f16 },
            $crate::DType::Float32 => __with__! { f32 },
            $crate::DType::Float64 => __with__! { f64 },
            $crate::DType::Bool => {
                return Err(::jagged_error::jagged_err!(
                    TypeError: "expected a numeric dtype, got bool"
                ));
            }
            other => {
                return Err(::jagged_error::jagged_err!(
                    NotImplemented: "no native kernels for dtype {}", other
                ));
            }
        }
    });
}

/// Like [`match_each_native_dtype!`], restricted to integer dtypes. Any other
/// dtype early-returns a `TypeError`.
#[macro_export]
macro_rules! match_each_integer_dtype {
    ($self:expr, | $_:tt $T:ident | $($body:tt)*) => ({
        macro_rules! __with__ {( $_ $T:ident ) => ( $($body)* )}
        match $self {
            $crate::DType::Int8 => __with__! { i8 },
            $crate::DType::Int16 => __with__! { i16 },
            $crate::DType::Int32 => __with__! { i32 },
            $crate::DType::Int64 => __with__! { i64 },
            $crate::DType::UInt8 => __with__! { u8 },
            $crate::DType::UInt16 => __with__! { u16 },
            $crate::DType::UInt32 => __with__! { u32 },
            $crate::DType::UInt64 => __with__! { u64 },
            other => {
                return Err(::jagged_error::jagged_err!(
                    TypeError: "expected an integer dtype, got {}", other
                ));
            }
        }
    });
}

//! Segmented reduction over runs described by a parents partition.

use jagged_buffer::Buffer;
use jagged_dtype::{DType, NativeDType, f16, match_each_native_dtype};
use jagged_error::{JaggedResult, jagged_bail};
use log::debug;

use crate::StridedArray;
use crate::backend::kernels;

/// A monoid to fold each run of elements with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reducer {
    /// The number of elements in the run.
    Count,
    /// The number of truthy elements in the run.
    CountNonzero,
    /// The sum of the run; integer sums wrap.
    Sum,
    /// The product of the run; integer products wrap.
    Prod,
    /// Whether any element of the run is truthy.
    Any,
    /// Whether every element of the run is truthy.
    All,
    /// The smallest element of the run.
    Min,
    /// The largest element of the run.
    Max,
}

impl Reducer {
    /// The element type of the reduction of an array of `dtype`.
    ///
    /// Counts are always `int64`; sums and products widen integers to 64
    /// bits; `any`/`all` are boolean; `min`/`max` preserve the input type.
    pub fn result_dtype(&self, dtype: DType) -> DType {
        match self {
            Reducer::Count | Reducer::CountNonzero => DType::Int64,
            Reducer::Sum | Reducer::Prod => match dtype {
                DType::Bool => DType::Int64,
                d if d.is_signed_integer() => DType::Int64,
                d if d.is_unsigned_integer() => DType::UInt64,
                d => d,
            },
            Reducer::Any | Reducer::All => DType::Bool,
            Reducer::Min | Reducer::Max => dtype,
        }
    }

    /// The canonical name, as surfaced in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Reducer::Count => "count",
            Reducer::CountNonzero => "count_nonzero",
            Reducer::Sum => "sum",
            Reducer::Prod => "prod",
            Reducer::Any => "any",
            Reducer::All => "all",
            Reducer::Min => "min",
            Reducer::Max => "max",
        }
    }
}

/// The outcome of a segmented reduction: one value per run, with a validity
/// mask distinguishing empty runs when one was requested.
#[derive(Clone, Debug)]
pub struct Reduced {
    /// One reduced value per run; empty runs hold the reducer's identity.
    pub values: StridedArray,
    /// Whether each run had at least one element. `None` unless masking was
    /// requested.
    pub validity: Option<Buffer<bool>>,
}

/// Identity elements of the order-based reductions.
trait Extrema: NativeDType {
    const MIN_IDENTITY: Self;
    const MAX_IDENTITY: Self;
}

macro_rules! extrema {
    ($T:ty, $min:expr, $max:expr) => {
        impl Extrema for $T {
            const MIN_IDENTITY: Self = $min;
            const MAX_IDENTITY: Self = $max;
        }
    };
}

// The min of no booleans is true (vacuous all), the max is false (vacuous
// any).
extrema!(bool, true, false);
extrema!(i8, i8::MAX, i8::MIN);
extrema!(i16, i16::MAX, i16::MIN);
extrema!(i32, i32::MAX, i32::MIN);
extrema!(i64, i64::MAX, i64::MIN);
extrema!(u8, u8::MAX, u8::MIN);
extrema!(u16, u16::MAX, u16::MIN);
extrema!(u32, u32::MAX, u32::MIN);
extrema!(u64, u64::MAX, u64::MIN);
extrema!(f16, f16::INFINITY, f16::NEG_INFINITY);
extrema!(f32, f32::INFINITY, f32::NEG_INFINITY);
extrema!(f64, f64::INFINITY, f64::NEG_INFINITY);

impl StridedArray {
    /// Reduce each run of elements into one output slot.
    ///
    /// `parents[i]` names the run of element `i`; runs are contiguous and
    /// `outlength` is the total number of runs, which may exceed the number
    /// that actually occur. With `mask`, the result carries a validity mask
    /// marking runs that had at least one element; with `keepdims`, the
    /// reduced dimension survives with extent 1.
    pub fn reduce_next(
        &self,
        reducer: Reducer,
        starts: &Buffer<i64>,
        parents: &Buffer<i64>,
        outlength: usize,
        mask: bool,
        keepdims: bool,
    ) -> JaggedResult<Reduced> {
        if self.is_scalar() {
            jagged_bail!(ShapeError: "cannot reduce a scalar");
        }
        if self.ndim() > 1 {
            jagged_bail!(
                NotImplemented: "reductions of a multidimensional array are resolved by a regular container"
            );
        }
        if !self.dtype().has_native_kernels() || self.dtype() == DType::Float16 {
            jagged_bail!(NotImplemented: "no {} kernel for dtype {}", reducer.name(), self.dtype());
        }
        if starts.len() > outlength {
            jagged_bail!(
                InvalidArgument: "{} run starts but only {} output slots",
                starts.len(),
                outlength
            );
        }
        if parents.len() != self.shape[0] {
            jagged_bail!(
                InvalidArgument: "parents length {} does not match array length {}",
                parents.len(),
                self.shape[0]
            );
        }

        if !self.is_contiguous() {
            debug!("normalizing a strided array before {}", reducer.name());
        }
        let contiguous = self.to_contiguous()?;
        let values = contiguous.reduce_runs(reducer, parents, outlength)?;

        let shape = if keepdims {
            vec![outlength, 1]
        } else {
            vec![outlength]
        };
        let values = self
            .with_packed_buffer(values, shape, reducer.result_dtype(self.dtype()))
            .with_identities(None);

        let validity = if mask {
            Some(kernels::run_nonempty(parents, outlength)?)
        } else {
            None
        };
        Ok(Reduced { values, validity })
    }

    fn reduce_runs(
        &self,
        reducer: Reducer,
        parents: &[i64],
        outlength: usize,
    ) -> JaggedResult<jagged_buffer::ByteBuffer> {
        let dtype = self.dtype();
        Ok(match reducer {
            Reducer::Count => kernels::run_count(parents, outlength)?.into_byte_buffer(),
            Reducer::CountNonzero => match_each_native_dtype!(dtype, |$T| {
                let data = self.typed_buffer::<$T>()?;
                kernels::run_fold(&data, parents, outlength, 0i64, |acc, x| {
                    acc + i64::from(x.is_nonzero())
                })?
                .into_byte_buffer()
            }),
            Reducer::Sum => match dtype {
                DType::Bool => {
                    let data = self.typed_buffer::<bool>()?;
                    kernels::run_fold(&data, parents, outlength, 0i64, |acc, x| {
                        acc + i64::from(x)
                    })?
                    .into_byte_buffer()
                }
                d if d.is_signed_integer() => self.fold_signed(parents, outlength, 0, |a, x| {
                    a.wrapping_add(x)
                })?,
                d if d.is_unsigned_integer() => {
                    self.fold_unsigned(parents, outlength, 0, |a, x| a.wrapping_add(x))?
                }
                DType::Float32 => {
                    let data = self.typed_buffer::<f32>()?;
                    kernels::run_fold(&data, parents, outlength, 0f32, |a, x| a + x)?
                        .into_byte_buffer()
                }
                _ => {
                    let data = self.typed_buffer::<f64>()?;
                    kernels::run_fold(&data, parents, outlength, 0f64, |a, x| a + x)?
                        .into_byte_buffer()
                }
            },
            Reducer::Prod => match dtype {
                DType::Bool => {
                    let data = self.typed_buffer::<bool>()?;
                    kernels::run_fold(&data, parents, outlength, 1i64, |acc, x| {
                        acc * i64::from(x)
                    })?
                    .into_byte_buffer()
                }
                d if d.is_signed_integer() => self.fold_signed(parents, outlength, 1, |a, x| {
                    a.wrapping_mul(x)
                })?,
                d if d.is_unsigned_integer() => {
                    self.fold_unsigned(parents, outlength, 1, |a, x| a.wrapping_mul(x))?
                }
                DType::Float32 => {
                    let data = self.typed_buffer::<f32>()?;
                    kernels::run_fold(&data, parents, outlength, 1f32, |a, x| a * x)?
                        .into_byte_buffer()
                }
                _ => {
                    let data = self.typed_buffer::<f64>()?;
                    kernels::run_fold(&data, parents, outlength, 1f64, |a, x| a * x)?
                        .into_byte_buffer()
                }
            },
            Reducer::Any => match_each_native_dtype!(dtype, |$T| {
                let data = self.typed_buffer::<$T>()?;
                kernels::run_fold(&data, parents, outlength, false, |acc, x| {
                    acc || x.is_nonzero()
                })?
                .into_byte_buffer()
            }),
            Reducer::All => match_each_native_dtype!(dtype, |$T| {
                let data = self.typed_buffer::<$T>()?;
                kernels::run_fold(&data, parents, outlength, true, |acc, x| {
                    acc && x.is_nonzero()
                })?
                .into_byte_buffer()
            }),
            Reducer::Min => match_each_native_dtype!(dtype, |$T| {
                let data = self.typed_buffer::<$T>()?;
                kernels::run_fold(&data, parents, outlength, <$T as Extrema>::MIN_IDENTITY, |acc, x| {
                    if x < acc { x } else { acc }
                })?
                .into_byte_buffer()
            }),
            Reducer::Max => match_each_native_dtype!(dtype, |$T| {
                let data = self.typed_buffer::<$T>()?;
                kernels::run_fold(&data, parents, outlength, <$T as Extrema>::MAX_IDENTITY, |acc, x| {
                    if x > acc { x } else { acc }
                })?
                .into_byte_buffer()
            }),
        })
    }

    fn fold_signed(
        &self,
        parents: &[i64],
        outlength: usize,
        init: i64,
        f: impl Fn(i64, i64) -> i64,
    ) -> JaggedResult<jagged_buffer::ByteBuffer> {
        let dtype = self.dtype();
        jagged_dtype::match_each_integer_dtype!(dtype, |$T| {
            let data = self.typed_buffer::<$T>()?;
            Ok(kernels::run_fold(&data, parents, outlength, init, |acc, x| {
                f(acc, x.widen_i64())
            })?
            .into_byte_buffer())
        })
    }

    fn fold_unsigned(
        &self,
        parents: &[i64],
        outlength: usize,
        init: u64,
        f: impl Fn(u64, u64) -> u64,
    ) -> JaggedResult<jagged_buffer::ByteBuffer> {
        let dtype = self.dtype();
        jagged_dtype::match_each_integer_dtype!(dtype, |$T| {
            let data = self.typed_buffer::<$T>()?;
            Ok(kernels::run_fold(&data, parents, outlength, init, |acc, x| {
                f(acc, x.widen_u64())
            })?
            .into_byte_buffer())
        })
    }
}

/// Lossless-as-bits widening of native integers to 64-bit accumulators.
trait WidenInt: NativeDType {
    fn widen_i64(self) -> i64;
    fn widen_u64(self) -> u64;
}

macro_rules! widen_int {
    ($($T:ty),*) => {$(
        impl WidenInt for $T {
            #[inline]
            fn widen_i64(self) -> i64 {
                self as i64
            }

            #[inline]
            fn widen_u64(self) -> u64 {
                self as u64
            }
        }
    )*};
}

widen_int!(i8, i16, i32, i64, u8, u16, u32, u64);

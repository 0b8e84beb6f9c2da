use crate::DType;

/// Whether one of the two dtypes is `lhs` while the other satisfies `pred`.
fn either_with(a: DType, b: DType, lhs: DType, pred: impl Fn(&DType) -> bool) -> bool {
    (a == lhs && pred(&b)) || (b == lhs && pred(&a))
}

/// The numeric promotion lattice.
///
/// Returns the element type of a concatenation of arrays of dtypes `a` and
/// `b`, or `None` when the pair is incompatible (e.g. boolean with a number).
/// The lattice is total over its domain, deterministic, and commutative; the
/// rules are applied top-down and mirror NumPy's merge behavior, including the
/// deliberate quirks (`uint64` with a signed integer promotes to `float64`
/// because no integer type holds both ranges).
pub fn promote(a: DType, b: DType) -> Option<DType> {
    use DType::*;

    let complex128_mixers =
        |d: DType| matches!(d, Float64 | UInt64 | Int64 | UInt32 | Int32);
    let float64_mixers = |d: &DType| matches!(d, UInt64 | Int64 | UInt32 | Int32);

    if a == Complex256 || b == Complex256 {
        Some(Complex256)
    } else if either_with(a, b, Float128, DType::is_complex) {
        Some(Complex256)
    } else if a == Complex128 || b == Complex128 {
        Some(Complex128)
    } else if (complex128_mixers(a) && b.is_complex()) || (complex128_mixers(b) && a.is_complex())
    {
        Some(Complex128)
    } else if a == Complex64 || b == Complex64 {
        Some(Complex64)
    } else if a == Float128 || b == Float128 {
        Some(Float128)
    } else if a == Float64 || b == Float64 {
        Some(Float64)
    } else if either_with(a, b, Float32, float64_mixers) {
        Some(Float64)
    } else if a == Float32 || b == Float32 {
        Some(Float32)
    } else if either_with(a, b, Float16, float64_mixers) {
        Some(Float64)
    } else if either_with(a, b, Float16, |d: &DType| matches!(d, UInt16 | Int16)) {
        Some(Float32)
    } else if a == Float16 || b == Float16 {
        Some(Float16)
    } else if either_with(a, b, UInt64, DType::is_signed_integer) {
        Some(Float64)
    } else if a == UInt64 || b == UInt64 {
        Some(UInt64)
    } else if a == Int64 || b == Int64 {
        Some(Int64)
    } else if either_with(a, b, UInt32, DType::is_signed_integer) {
        Some(Int64)
    } else if a == UInt32 || b == UInt32 {
        Some(UInt32)
    } else if a == Int32 || b == Int32 {
        Some(Int32)
    } else if either_with(a, b, UInt16, DType::is_signed_integer) {
        Some(Int32)
    } else if a == UInt16 || b == UInt16 {
        Some(UInt16)
    } else if a == Int16 || b == Int16 {
        Some(Int16)
    } else if either_with(a, b, UInt8, DType::is_signed_integer) {
        Some(Int16)
    } else if a == UInt8 || b == UInt8 {
        Some(UInt8)
    } else if a == Int8 || b == Int8 {
        Some(Int8)
    } else if a == Bool && b == Bool {
        Some(Bool)
    } else {
        None
    }
}

/// Whether arrays of dtypes `a` and `b` can be concatenated.
///
/// Booleans only merge with booleans unless `allow_bool_mix` is set, in which
/// case a boolean counts as compatible with any promotable numeric dtype.
pub fn mergeable(a: DType, b: DType, allow_bool_mix: bool) -> bool {
    if a == DType::Bool && b == DType::Bool {
        return true;
    }
    if a == DType::Bool || b == DType::Bool {
        let other = if a == DType::Bool { b } else { a };
        return allow_bool_mix && promote(other, other).is_some();
    }
    promote(a, b).is_some()
}

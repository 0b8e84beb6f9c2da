#![deny(missing_docs)]

//! Element types for Jagged arrays.
//!
//! A [`DType`] tags the element type of a flat array's backing buffer. Twelve
//! of the dtypes have a native Rust representation and implement
//! [`NativeDType`];
//! operations dispatch over them with [`match_each_native_dtype!`]. The
//! remaining dtypes (`Float128` and the complex family) are representable as
//! raw bytes but have no kernels, and every dispatch over them reports
//! `NotImplemented`.
//!
//! The [`promote`] function is the numeric promotion lattice that decides the
//! element type of a cross-type concatenation.

pub use half;
pub use half::f16;

mod dtype;
mod native;
mod promote;

pub use dtype::*;
pub use native::*;
pub use promote::*;

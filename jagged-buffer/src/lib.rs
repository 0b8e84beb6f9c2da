#![deny(missing_docs)]

//! Byte buffers for Jagged arrays.
//!
//! Every array node in the tree holds its data in one or more [`ByteBuffer`]s:
//! immutable, cheaply cloneable, reference-counted byte regions. A typed
//! [`Buffer<T>`] is a zero-copy reinterpretation of a byte buffer, guarded by
//! alignment and length checks at construction so that `as_slice` never has to
//! re-validate.
//!
//! Buffers are never mutated after [`BufferMut::freeze`]; all transformations
//! in the array crates allocate new buffers.

mod alignment;
mod buffer;
mod buffer_mut;
mod macros;

pub use alignment::*;
pub use buffer::*;
pub use buffer_mut::*;

/// An untyped buffer of bytes.
pub type ByteBuffer = Buffer<u8>;

/// An untyped mutable buffer of bytes.
pub type ByteBufferMut = BufferMut<u8>;

#![deny(missing_docs)]

//! The strided leaf array of the Jagged columnar tree.
//!
//! A [`StridedArray`] is a shaped, strided, typed window over a shared byte
//! buffer: the flat numeric leaf that every other node type (lists, records,
//! unions, options) is ultimately built from. It carries the four algorithms
//! the rest of the tree depends on:
//!
//! - NumPy-style basic and advanced slicing ([`StridedArray::getitem`]),
//!   resolved either by pure stride arithmetic or by materializing a gather
//!   index ("carry");
//! - layout normalization ([`StridedArray::to_contiguous`]) from arbitrary
//!   strided views into packed buffers;
//! - type-promoting concatenation ([`StridedArray::merge`]) over the numeric
//!   promotion lattice;
//! - segmented reduce/sort/argsort ([`StridedArray::reduce_next`],
//!   [`StridedArray::sort_next`], [`StridedArray::argsort_next`]) over runs
//!   described by a parents/starts partition.
//!
//! Every operation is a pure function: arrays are never mutated once
//! constructed, and results either alias the input buffer or own a freshly
//! allocated one.

pub mod backend;
pub mod slice;

mod array;
mod form;
mod identities;
mod parameters;

pub use array::*;
pub use form::*;
pub use identities::*;
pub use parameters::*;

#![deny(missing_docs)]

//! Error types for the Jagged array toolkit.
//!
//! The taxonomy is part of the public contract of the array tree: callers
//! pattern-match on these variants to distinguish structural mistakes
//! (`ShapeError`), out-of-range selections (`IndexError`), ill-typed
//! operations (`TypeError`), and deliberate capability gaps
//! (`NotImplemented`). Nothing in this workspace retries or swallows an
//! error; every failure aborts the in-progress algorithm and surfaces here.

use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

mod ext;

pub use ext::*;

/// A wrapper around a string that can be used as an error message.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        ErrString(msg.into())
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Debug for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The top-level error type for all Jagged operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum JaggedError {
    /// Mismatched shape/stride ranks, operations on a scalar, or shape
    /// disagreements between merge operands.
    #[error("shape error: {0}")]
    ShapeError(ErrString),
    /// An index fell outside the valid range after negative wraparound.
    #[error("index error: {0}")]
    IndexError(ErrString),
    /// An operation that is meaningless for the operand types, such as
    /// slicing a numeric leaf by field name.
    #[error("type error: {0}")]
    TypeError(ErrString),
    /// A type-valid combination that is deliberately unimplemented, such as
    /// reducing a complex-typed array. Distinct from [`JaggedError::TypeError`]
    /// so callers can tell a capability gap from a misuse.
    #[error("not implemented: {0}")]
    NotImplemented(ErrString),
    /// A malformed argument that is neither a shape, index, nor type problem.
    #[error("invalid argument: {0}")]
    InvalidArgument(ErrString),
}

impl JaggedError {
    /// Panic with this error as the panic message.
    ///
    /// This is the only sanctioned panic site in the workspace; use it (via
    /// [`jagged_panic!`]) strictly for programmer-error invariants.
    #[allow(clippy::panic)]
    #[track_caller]
    pub fn panic(self) -> ! {
        panic!("{self}")
    }
}

/// A [`Result`] whose error side is a [`JaggedError`].
pub type JaggedResult<T> = Result<T, JaggedError>;

/// Construct a [`JaggedError`], defaulting to the `InvalidArgument` variant
/// when no variant tag is given.
#[macro_export]
macro_rules! jagged_err {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::JaggedError::$variant(format!($fmt $(, $arg)*).into())
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::JaggedError::InvalidArgument(format!($fmt $(, $arg)*).into())
    };
}

/// Return early with a [`JaggedError`].
#[macro_export]
macro_rules! jagged_bail {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        return Err($crate::jagged_err!($variant: $fmt $(, $arg)*))
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        return Err($crate::jagged_err!($fmt $(, $arg)*))
    };
}

/// Panic with a [`JaggedError`] message. Reserved for unreachable states.
#[macro_export]
macro_rules! jagged_panic {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::jagged_err!($variant: $fmt $(, $arg)*).panic()
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::jagged_err!($fmt $(, $arg)*).panic()
    };
}

/// Expect a result or option to hold a value, panicking with context
/// otherwise. The panic carries the message verbatim; prefer propagating a
/// [`JaggedResult`] wherever the failure is reachable.
pub trait JaggedExpect {
    /// The wrapped value type.
    type Output;

    /// Unwrap, panicking with `msg` on failure.
    fn jagged_expect(self, msg: &str) -> Self::Output;
}

impl<T> JaggedExpect for JaggedResult<T> {
    type Output = T;

    #[track_caller]
    fn jagged_expect(self, msg: &str) -> T {
        self.unwrap_or_else(|e| jagged_panic!("{}: {}", msg, e))
    }
}

impl<T> JaggedExpect for Option<T> {
    type Output = T;

    #[track_caller]
    fn jagged_expect(self, msg: &str) -> T {
        self.unwrap_or_else(|| jagged_panic!("{}", msg))
    }
}

/// Unwrap a fallible value whose error already formats as a [`JaggedError`].
pub trait JaggedUnwrap {
    /// The wrapped value type.
    type Output;

    /// Unwrap, panicking with the error's own message on failure.
    fn jagged_unwrap(self) -> Self::Output;
}

impl<T, E: Into<JaggedError>> JaggedUnwrap for Result<T, E> {
    type Output = T;

    #[track_caller]
    fn jagged_unwrap(self) -> T {
        self.unwrap_or_else(|e| e.into().panic())
    }
}

use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

use jagged_error::jagged_panic;

/// The alignment of a buffer, in bytes. Always a power of two.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Alignment(usize);

impl Alignment {
    /// Create a new alignment.
    ///
    /// ## Panics
    ///
    /// Panics if `alignment` is zero or not a power of two.
    pub fn new(alignment: usize) -> Self {
        if !alignment.is_power_of_two() {
            jagged_panic!("Alignment must be a non-zero power of two, got {}", alignment);
        }
        Self(alignment)
    }

    /// The natural alignment of `T`.
    pub fn of<T>() -> Self {
        Self(align_of::<T>())
    }

    /// Whether an address aligned to `self` is also aligned to `other`.
    pub fn is_aligned_to(&self, other: Alignment) -> bool {
        self.0 % other.0 == 0
    }
}

impl Deref for Alignment {
    type Target = usize;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Alignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Debug for Alignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Alignment({})", self.0)
    }
}

impl From<Alignment> for usize {
    fn from(value: Alignment) -> Self {
        value.0
    }
}

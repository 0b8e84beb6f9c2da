//! Compute-backend selection.
//!
//! Every bulk operation on an array is routed through a [`BackendId`] to the
//! kernel library resident for that backend. Only the host library is linked
//! here; the tag and the dispatch seams are the contract a device backend
//! would plug into. Kernels are logically synchronous pure batch calls: they
//! run to completion and have no visible effect beyond their declared output
//! buffer.

pub mod kernels;

use std::fmt::{Display, Formatter};

/// Identifies the compute backend on which an array's buffer is resident.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum BackendId {
    /// Host memory, vectorized CPU loops.
    #[default]
    Host,
}

impl Display for BackendId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendId::Host => f.write_str("host"),
        }
    }
}

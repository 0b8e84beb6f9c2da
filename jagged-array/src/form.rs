use jagged_dtype::DType;
use serde::Serialize;

use crate::Parameters;

/// The buffer-free description of a strided leaf: everything about the array
/// except its data. Two arrays with equal forms are structurally
/// interchangeable.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Form {
    /// Extents of the non-leading dimensions.
    pub inner_shape: Vec<usize>,
    /// Bytes per element.
    pub itemsize: usize,
    /// NumPy format character of the element type.
    pub format: String,
    /// Canonical name of the element type.
    pub primitive: String,
    /// Node metadata, omitted when empty.
    #[serde(skip_serializing_if = "Parameters::is_empty")]
    pub parameters: Parameters,
    /// Whether the array carries per-element provenance.
    pub has_identities: bool,
}

impl Form {
    pub(crate) fn new(
        inner_shape: Vec<usize>,
        dtype: DType,
        parameters: Parameters,
        has_identities: bool,
    ) -> Self {
        Self {
            inner_shape,
            itemsize: dtype.byte_width(),
            format: dtype.format().to_string(),
            primitive: dtype.name().to_string(),
            parameters,
            has_identities,
        }
    }
}

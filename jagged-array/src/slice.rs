//! Slice items and slice specs.
//!
//! A [`SliceSpec`] is an ordered sequence of [`SliceItem`]s, the closed union
//! of everything an array can be indexed by. Flat leaves resolve `At`,
//! `Range`, `Ellipsis`, `NewAxis` and `Array` themselves; `Field`/`Fields`
//! are rejected outright, and `Missing`/`Jagged` are "too general" — they
//! belong to the option- and list-typed node types of the surrounding tree.

use jagged_buffer::Buffer;
use jagged_error::{JaggedResult, jagged_bail};

/// An advanced (fancy) index: a flat `int64` gather index with the logical
/// shape it was written with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexArray {
    index: Buffer<i64>,
    shape: Vec<usize>,
    from_bool: bool,
}

impl IndexArray {
    /// Create an index array from a flat index and its logical shape.
    pub fn try_new(index: Buffer<i64>, shape: Vec<usize>) -> JaggedResult<Self> {
        if shape.iter().product::<usize>() != index.len() || shape.is_empty() {
            jagged_bail!(
                InvalidArgument: "index array shape {:?} does not describe {} entries",
                shape,
                index.len()
            );
        }
        Ok(Self {
            index,
            shape,
            from_bool: false,
        })
    }

    /// A 1-D index array over the given positions.
    pub fn from_positions(index: Buffer<i64>) -> Self {
        Self {
            shape: vec![index.len()],
            index,
            from_bool: false,
        }
    }

    pub(crate) fn from_bool_positions(index: Buffer<i64>) -> Self {
        Self {
            shape: vec![index.len()],
            index,
            from_bool: true,
        }
    }

    /// The flat gather index, in row-major order.
    pub fn ravel(&self) -> &Buffer<i64> {
        &self.index
    }

    /// The logical shape of the index.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The leading extent of the logical shape.
    pub fn len(&self) -> usize {
        self.shape[0]
    }

    /// Whether the index selects nothing.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether this index was materialized from a boolean mask.
    pub fn from_bool(&self) -> bool {
        self.from_bool
    }
}

/// An integer index with per-element validity, produced by option-typed
/// nodes. Opaque at this leaf: its presence anywhere in a spec routes the
/// whole slice to the option-typed delegate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingIndex {
    /// The underlying gather index.
    pub index: Buffer<i64>,
    /// Validity of each entry; `false` entries select nothing.
    pub validity: Buffer<bool>,
}

/// Per-row ranges produced by list-typed nodes for jagged indexing. Opaque
/// at this leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JaggedRanges {
    /// Start offset of each row's selection.
    pub starts: Buffer<i64>,
    /// Stop offset of each row's selection.
    pub stops: Buffer<i64>,
}

/// One item of a slice spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SliceItem {
    /// Select one position, collapsing a dimension. Negative values wrap.
    At(i64),
    /// Select a strided range of positions. Unspecified bounds take the
    /// Python slice defaults for the sign of `step`.
    Range {
        /// Inclusive start bound, if given.
        start: Option<i64>,
        /// Exclusive stop bound, if given.
        stop: Option<i64>,
        /// Step between selected positions; never zero.
        step: i64,
    },
    /// Consume as many full dimensions as needed for the rest of the spec to
    /// line up with the trailing dimensions.
    Ellipsis,
    /// Insert a new extent-1 dimension.
    NewAxis,
    /// Gather by an integer index array, with NumPy advanced-indexing
    /// broadcast semantics.
    Array(IndexArray),
    /// Select a record field by name. Always a `TypeError` on a flat leaf.
    Field(String),
    /// Select several record fields by name. Always a `TypeError` on a flat
    /// leaf.
    Fields(Vec<String>),
    /// An option-typed index; too general for a flat leaf.
    Missing(MissingIndex),
    /// A jagged per-row range selection; too general for a flat leaf.
    Jagged(JaggedRanges),
}

impl SliceItem {
    /// An unbounded unit-step range, `[:]`.
    pub fn full_range() -> Self {
        SliceItem::Range {
            start: None,
            stop: None,
            step: 1,
        }
    }

    /// The number of array dimensions this item consumes.
    pub fn dimlength(&self) -> usize {
        match self {
            SliceItem::At(_)
            | SliceItem::Range { .. }
            | SliceItem::Array(_)
            | SliceItem::Missing(_)
            | SliceItem::Jagged(_) => 1,
            SliceItem::Ellipsis
            | SliceItem::NewAxis
            | SliceItem::Field(_)
            | SliceItem::Fields(_) => 0,
        }
    }
}

/// An ordered sequence of slice items.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SliceSpec {
    items: Vec<SliceItem>,
}

impl SliceSpec {
    /// Create a spec from its items.
    pub fn new(items: Vec<SliceItem>) -> Self {
        Self { items }
    }

    /// The items of this spec.
    pub fn items(&self) -> &[SliceItem] {
        &self.items
    }

    /// The total number of array dimensions the spec consumes.
    pub fn dimlength(&self) -> usize {
        dimlength(&self.items)
    }

    /// Whether any item is an advanced index.
    pub fn is_advanced(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, SliceItem::Array(_)))
    }

    /// Whether any item is too general for a flat leaf to resolve itself.
    pub fn is_too_general(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, SliceItem::Missing(_) | SliceItem::Jagged(_)))
    }
}

impl From<Vec<SliceItem>> for SliceSpec {
    fn from(items: Vec<SliceItem>) -> Self {
        Self::new(items)
    }
}

/// The number of array dimensions a sub-spec consumes.
pub(crate) fn dimlength(items: &[SliceItem]) -> usize {
    items.iter().map(SliceItem::dimlength).sum()
}

//! Field data provider contract.
//!
//! An `Index*FieldData` is a per-field handle that loads the field's columnar
//! values for one segment. The loaded `Atomic*FieldData` hands out value
//! streams; every stream keeps its segment data alive through an `Arc`, so a
//! stream stays readable after the provider moved on, but it must not be used
//! to answer questions about another segment.
//!
//! Storage guarantees at most one occurrence of a value per document and
//! field, which is what lets field-backed sources report
//! [`Uniqueness::Unique`](crate::Uniqueness::Unique).

pub mod ram;

use std::sync::Arc;

use crate::error::Result;
use crate::segment::SegmentContext;
use crate::values::{BytesValues, DoubleValues, GeoPointValues, LongValues};

/// Physical type of a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericType {
    I64,
    F64,
}

impl NumericType {
    pub fn is_floating_point(&self) -> bool {
        matches!(self, NumericType::F64)
    }

    pub fn name(&self) -> &'static str {
        match self {
            NumericType::I64 => "i64",
            NumericType::F64 => "f64",
        }
    }
}

// ── Segment-level data ───────────────────────────────────────────────────

/// Field values of one segment.
pub trait AtomicFieldData: Send + Sync {
    fn num_docs(&self) -> u32;

    /// Byte-string view. With `needs_hashes`, value hashes are served
    /// precomputed by [`BytesValues::next_value_with_hash`].
    fn bytes_values(self: Arc<Self>, needs_hashes: bool) -> Box<dyn BytesValues>;
}

pub trait AtomicNumericFieldData: AtomicFieldData {
    fn long_values(self: Arc<Self>) -> Box<dyn LongValues>;

    fn double_values(self: Arc<Self>) -> Box<dyn DoubleValues>;
}

pub trait AtomicGeoPointFieldData: AtomicFieldData {
    fn geo_point_values(self: Arc<Self>) -> Box<dyn GeoPointValues>;
}

// ── Field-level handles ──────────────────────────────────────────────────

pub trait IndexFieldData: Send + Sync {
    fn field_name(&self) -> &str;

    fn load(&self, segment: &SegmentContext) -> Result<Arc<dyn AtomicFieldData>>;
}

pub trait IndexNumericFieldData: Send + Sync {
    fn field_name(&self) -> &str;

    fn numeric_type(&self) -> NumericType;

    fn load(&self, segment: &SegmentContext) -> Result<Arc<dyn AtomicNumericFieldData>>;
}

pub trait IndexGeoPointFieldData: Send + Sync {
    fn field_name(&self) -> &str;

    fn load(&self, segment: &SegmentContext) -> Result<Arc<dyn AtomicGeoPointFieldData>>;
}

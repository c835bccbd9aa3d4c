//! Hermes aggregations - per-document value sources
//!
//! Aggregators read field values one document at a time through a
//! [`ValuesSource`]. This crate provides:
//! - Value streams for byte strings, integers, floats and geo points
//! - Field-backed sources over per-segment field data, rebound at every
//!   segment boundary
//! - Script-backed sources and script-transform overlays
//! - A sort/dedupe normalizer that only does work when the delegate cannot
//!   guarantee unique, ordered values
//! - An in-memory field data provider and a config-driven source factory

pub mod config;
pub mod context;
pub mod error;
pub mod fielddata;
pub mod script;
pub mod segment;
pub mod source;
pub mod structures;
pub mod values;

/// Segment-local document id
pub type DocId = u32;

pub use config::ValuesSourceConfig;
pub use context::{AggregationContext, FieldDataRegistry, FieldKind};
pub use error::{Error, Result};
pub use fielddata::NumericType;
pub use script::{
    FnScript, ScriptCompiler, ScriptContext, ScriptValue, ScriptValueType, SearchScript,
    VALUE_VAR,
};
pub use segment::{SegmentContext, SegmentId};
pub use source::{
    BytesFieldData, BytesScript, BytesSortedAndUnique, GeoPointFieldData, GeoPointValuesSource,
    NumericFieldData, NumericScript, NumericSortedAndUnique, NumericValuesSource,
    NumericWithScript, SortedAndUnique, Uniqueness, ValuesSource, WithScript,
};
pub use values::{
    BytesValues, DocCursor, DoubleValues, GeoPoint, GeoPointValues, LongValues, Order,
};

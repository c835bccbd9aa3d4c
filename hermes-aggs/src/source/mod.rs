//! Value sources: per-field producers of value streams.
//!
//! A source is bound to one aggregation traversal. The driver calls
//! [`ValuesSource::set_next_segment`] at every segment boundary, then asks
//! for a stream and walks the segment's documents with it:
//!
//! ```text
//! source.set_next_segment(&segment)?;
//! let values = source.long_values()?;
//! for doc in matching_docs {
//!     for _ in 0..values.set_document(doc)? {
//!         collect(values.next_value());
//!     }
//! }
//! ```
//!
//! Variants compose by ownership: overlays and the sort/dedupe normalizer own
//! their delegate as a `Box<dyn …>`.

mod field_data;
mod geo;
mod script;
mod sorted_unique;
mod with_script;

#[cfg(test)]
mod tests;

use crate::error::Result;
use crate::segment::SegmentContext;
use crate::values::{BytesValues, DoubleValues, GeoPointValues, LongValues};

pub use field_data::{BytesFieldData, NumericFieldData};
pub use geo::GeoPointFieldData;
pub use script::{BytesScript, NumericScript};
pub use sorted_unique::{BytesSortedAndUnique, NumericSortedAndUnique, SortedAndUnique};
pub use with_script::{NumericWithScript, WithScript};

/// Whether a document can carry the same value more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniqueness {
    Unique,
    NotUnique,
    Unknown,
}

// ── Source traits ────────────────────────────────────────────────────────

/// A source of byte-string values.
pub trait ValuesSource: Send {
    fn uniqueness(&self) -> Uniqueness {
        Uniqueness::Unknown
    }

    /// Byte-string stream for the current segment. Created on first request
    /// and cached until the segment changes.
    fn bytes_values(&mut self) -> Result<&mut dyn BytesValues>;

    /// Ask storage for precomputed value hashes. Advisory.
    fn set_needs_hashes(&mut self, _needs_hashes: bool) {}

    /// Rebind to `segment`. Called once per segment before any document of it
    /// is read.
    fn set_next_segment(&mut self, _segment: &SegmentContext) -> Result<()> {
        Ok(())
    }
}

pub trait NumericValuesSource: ValuesSource {
    fn is_floating_point(&self) -> bool;

    fn long_values(&mut self) -> Result<&mut dyn LongValues>;

    fn double_values(&mut self) -> Result<&mut dyn DoubleValues>;
}

pub trait GeoPointValuesSource: ValuesSource {
    fn geo_point_values(&mut self) -> Result<&mut dyn GeoPointValues>;
}

// ── Cached stream slot ───────────────────────────────────────────────────

/// Per stream kind cache.
///
/// `Unbound`: no segment yet, requests panic. `Pending`: segment bound, not
/// requested. `Ready`: requested, rebuilt on every rebind.
#[derive(Debug, Default)]
pub(crate) enum Slot<T> {
    #[default]
    Unbound,
    Pending,
    Ready(T),
}

impl<T> Slot<T> {
    /// A new segment was bound: rebuild if requested before, else stay lazy.
    pub(crate) fn rebind(&mut self, make: impl FnOnce() -> T) {
        match self {
            Slot::Ready(value) => *value = make(),
            _ => *self = Slot::Pending,
        }
    }

    /// Forget the cached value; the next request rebuilds it.
    pub(crate) fn invalidate(&mut self) {
        if let Slot::Ready(_) = self {
            *self = Slot::Pending;
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(self, Slot::Ready(_))
    }

    pub(crate) fn get_or_init(&mut self, make: impl FnOnce() -> T) -> &mut T {
        if let Slot::Pending = self {
            *self = Slot::Ready(make());
        }
        match self {
            Slot::Ready(value) => value,
            _ => panic!("value stream requested before the first segment was bound"),
        }
    }

    pub(crate) fn get_or_try_init(&mut self, make: impl FnOnce() -> Result<T>) -> Result<&mut T> {
        if let Slot::Pending = self {
            *self = Slot::Ready(make()?);
        }
        match self {
            Slot::Ready(value) => Ok(value),
            _ => panic!("value stream requested before the first segment was bound"),
        }
    }
}

//! Per-document value streams.
//!
//! A value stream is a cursor over the values of one document at a time:
//!
//! ```text
//! let n = values.set_document(doc)?;   // select the document, get its count
//! for _ in 0..n {
//!     let v = values.next_value();     // exactly n reads are valid
//! }
//! ```
//!
//! Four families exist: byte strings ([`BytesValues`]), integers
//! ([`LongValues`]), floating point ([`DoubleValues`]) and geo points
//! ([`GeoPointValues`]). Every stream declares whether a document may carry
//! more than one value and the [`Order`] in which values come out.

mod buffer;

use std::hash::Hasher;

use rustc_hash::FxHasher;

use crate::{DocId, Result};

pub use buffer::{BytesBuffer, NumericBuffer};

// ── Order ────────────────────────────────────────────────────────────────

/// Emission order of the values of a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    /// Unordered, duplicates possible.
    None,
    /// Byte-lexicographic ascending, no duplicates.
    Bytes,
    /// Numeric ascending, no duplicates.
    Numeric,
}

// ── Document cursor ──────────────────────────────────────────────────────

/// Read state of a stream for the currently selected document.
///
/// Reads are only valid after [`select`](Self::select) and only as many
/// times as the selected count. Violations are driver bugs and panic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocCursor {
    #[default]
    Unselected,
    Selected { count: usize, pos: usize },
}

impl DocCursor {
    /// Select a document with `count` values. Returns `count`.
    #[inline]
    pub fn select(&mut self, count: usize) -> usize {
        *self = DocCursor::Selected { count, pos: 0 };
        count
    }

    /// Index of the next value to read, advancing the cursor.
    #[inline]
    pub fn next_index(&mut self) -> usize {
        match self {
            DocCursor::Selected { count, pos } if *pos < *count => {
                let idx = *pos;
                *pos += 1;
                idx
            }
            DocCursor::Selected { count, .. } => {
                panic!("read past the {count} value(s) of the current document")
            }
            DocCursor::Unselected => panic!("value read before a document was selected"),
        }
    }
}

// ── Geo point ────────────────────────────────────────────────────────────

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

// ── Hashing ──────────────────────────────────────────────────────────────

/// Hash used for byte-string values, both by storage that precomputes hashes
/// and by consumers that hash on the fly. The two must agree.
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(bytes);
    hasher.finish()
}

// ── Stream traits ────────────────────────────────────────────────────────

/// Byte-string view of a document's values.
pub trait BytesValues: Send {
    /// Whether a document can have more than one value.
    fn is_multi_valued(&self) -> bool;

    fn order(&self) -> Order {
        Order::None
    }

    /// Select `doc` and return its number of values.
    fn set_document(&mut self, doc: DocId) -> Result<usize>;

    /// Next value of the selected document. The slice is valid until the next
    /// call on this stream.
    fn next_value(&mut self) -> &[u8];

    /// Next value together with its [`hash_bytes`] hash. Storage that was
    /// asked for hashes serves them precomputed.
    fn next_value_with_hash(&mut self) -> (&[u8], u64) {
        let value = self.next_value();
        let hash = hash_bytes(value);
        (value, hash)
    }
}

/// Integer view of a document's values.
pub trait LongValues: Send {
    fn is_multi_valued(&self) -> bool;

    fn order(&self) -> Order {
        Order::None
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize>;

    fn next_value(&mut self) -> i64;
}

/// Floating-point view of a document's values.
pub trait DoubleValues: Send {
    fn is_multi_valued(&self) -> bool;

    fn order(&self) -> Order {
        Order::None
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize>;

    fn next_value(&mut self) -> f64;
}

/// Geo-point view of a document's values.
pub trait GeoPointValues: Send {
    fn is_multi_valued(&self) -> bool;

    fn set_document(&mut self, doc: DocId) -> Result<usize>;

    fn next_value(&mut self) -> GeoPoint;
}

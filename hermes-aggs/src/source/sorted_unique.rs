//! Sort/dedupe normalizer.
//!
//! [`SortedAndUnique`] wraps a source and guarantees that every stream it
//! hands out yields the distinct values of a document in canonical order
//! (byte order for strings, ascending for numbers). When the delegate's stream
//! already guarantees it, the delegate's stream is handed out as is.
//!
//! Floating-point values compare with all NaNs equal to each other and
//! greater than any number; `-0.0` and `0.0` are equal and the first one the
//! delegate emits is kept.

use std::cmp::Ordering;

use super::{NumericValuesSource, Slot, Uniqueness, ValuesSource};
use crate::DocId;
use crate::error::Result;
use crate::segment::SegmentContext;
use crate::structures::BytesHash;
use crate::values::{BytesValues, DocCursor, DoubleValues, LongValues, NumericBuffer, Order};

/// How a stream kind is served for the current segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    Passthrough,
    Normalize,
}

impl Policy {
    fn choose(kind: &str, multi: bool, unique: bool, order: Order, canonical: Order) -> Policy {
        let policy = if !multi || (unique && order == canonical) {
            Policy::Passthrough
        } else {
            Policy::Normalize
        };
        log::debug!(
            "SortedAndUnique: {kind} values multi={multi} unique={unique} order={order:?} -> {policy:?}"
        );
        policy
    }
}

pub struct SortedAndUnique<S: ?Sized> {
    bytes_policy: Slot<Policy>,
    long_policy: Slot<Policy>,
    double_policy: Slot<Policy>,
    inner: Normalizing<S>,
}

pub type BytesSortedAndUnique = SortedAndUnique<dyn ValuesSource>;
pub type NumericSortedAndUnique = SortedAndUnique<dyn NumericValuesSource>;

impl<S: ?Sized> SortedAndUnique<S> {
    pub fn new(delegate: Box<S>) -> Self {
        Self {
            bytes_policy: Slot::Pending,
            long_policy: Slot::Pending,
            double_policy: Slot::Pending,
            inner: Normalizing {
                bytes: SortedUniqueBytes::default(),
                longs: NumericBuffer::new(),
                doubles: NumericBuffer::new(),
                delegate,
            },
        }
    }

    pub fn delegate(&self) -> &S {
        &self.inner.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut S {
        &mut self.inner.delegate
    }
}

impl<S: ValuesSource + ?Sized> ValuesSource for SortedAndUnique<S> {
    fn uniqueness(&self) -> Uniqueness {
        Uniqueness::Unique
    }

    fn bytes_values(&mut self) -> Result<&mut dyn BytesValues> {
        let inner = &mut self.inner;
        let policy = *self.bytes_policy.get_or_try_init(|| {
            let unique = inner.delegate.uniqueness() == Uniqueness::Unique;
            let values = inner.delegate.bytes_values()?;
            Ok(Policy::choose(
                "bytes",
                values.is_multi_valued(),
                unique,
                values.order(),
                Order::Bytes,
            ))
        })?;
        match policy {
            Policy::Passthrough => self.inner.delegate.bytes_values(),
            Policy::Normalize => Ok(&mut self.inner),
        }
    }

    fn set_needs_hashes(&mut self, needs_hashes: bool) {
        self.inner.delegate.set_needs_hashes(needs_hashes);
    }

    fn set_next_segment(&mut self, segment: &SegmentContext) -> Result<()> {
        self.inner.delegate.set_next_segment(segment)?;
        self.bytes_policy.invalidate();
        self.long_policy.invalidate();
        self.double_policy.invalidate();
        Ok(())
    }
}

impl<S: NumericValuesSource + ?Sized> NumericValuesSource for SortedAndUnique<S> {
    fn is_floating_point(&self) -> bool {
        self.inner.delegate.is_floating_point()
    }

    fn long_values(&mut self) -> Result<&mut dyn LongValues> {
        let inner = &mut self.inner;
        let policy = *self.long_policy.get_or_try_init(|| {
            let unique = inner.delegate.uniqueness() == Uniqueness::Unique;
            let values = inner.delegate.long_values()?;
            Ok(Policy::choose(
                "long",
                values.is_multi_valued(),
                unique,
                values.order(),
                Order::Numeric,
            ))
        })?;
        match policy {
            Policy::Passthrough => self.inner.delegate.long_values(),
            Policy::Normalize => Ok(&mut self.inner),
        }
    }

    fn double_values(&mut self) -> Result<&mut dyn DoubleValues> {
        let inner = &mut self.inner;
        let policy = *self.double_policy.get_or_try_init(|| {
            let unique = inner.delegate.uniqueness() == Uniqueness::Unique;
            let values = inner.delegate.double_values()?;
            Ok(Policy::choose(
                "double",
                values.is_multi_valued(),
                unique,
                values.order(),
                Order::Numeric,
            ))
        })?;
        match policy {
            Policy::Passthrough => self.inner.delegate.double_values(),
            Policy::Normalize => Ok(&mut self.inner),
        }
    }
}

// ── Normalizing streams ──────────────────────────────────────────────────

/// The delegate plus the scratch state of every normalizing stream kind.
struct Normalizing<S: ?Sized> {
    bytes: SortedUniqueBytes,
    longs: NumericBuffer<i64>,
    doubles: NumericBuffer<f64>,
    delegate: Box<S>,
}

impl<S: ValuesSource + ?Sized> BytesValues for Normalizing<S> {
    fn is_multi_valued(&self) -> bool {
        true
    }

    fn order(&self) -> Order {
        Order::Bytes
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        let values = self.delegate.bytes_values()?;
        let count = values.set_document(doc)?;
        Ok(self.bytes.fill(values, count))
    }

    fn next_value(&mut self) -> &[u8] {
        let id = self.bytes.next_id();
        self.bytes.table.get(id)
    }

    fn next_value_with_hash(&mut self) -> (&[u8], u64) {
        let id = self.bytes.next_id();
        (self.bytes.table.get(id), self.bytes.table.hash(id))
    }
}

impl<S: NumericValuesSource + ?Sized> LongValues for Normalizing<S> {
    fn is_multi_valued(&self) -> bool {
        true
    }

    fn order(&self) -> Order {
        Order::Numeric
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        let values = self.delegate.long_values()?;
        let count = values.set_document(doc)?;
        if count == 0 {
            return Ok(self.longs.select_empty());
        }
        self.longs.clear();
        for _ in 0..count {
            self.longs.push(values.next_value());
        }
        let buf = self.longs.values_mut();
        buf.sort();
        buf.dedup();
        Ok(self.longs.select())
    }

    fn next_value(&mut self) -> i64 {
        self.longs.next()
    }
}

impl<S: NumericValuesSource + ?Sized> DoubleValues for Normalizing<S> {
    fn is_multi_valued(&self) -> bool {
        true
    }

    fn order(&self) -> Order {
        Order::Numeric
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        let values = self.delegate.double_values()?;
        let count = values.set_document(doc)?;
        if count == 0 {
            return Ok(self.doubles.select_empty());
        }
        self.doubles.clear();
        for _ in 0..count {
            self.doubles.push(values.next_value());
        }
        sort_dedup_doubles(self.doubles.values_mut());
        Ok(self.doubles.select())
    }

    fn next_value(&mut self) -> f64 {
        self.doubles.next()
    }
}

/// Dedup table plus the sorted permutation of its ids for the current doc.
#[derive(Default)]
struct SortedUniqueBytes {
    table: BytesHash,
    sorted: Vec<u32>,
    cursor: DocCursor,
}

impl SortedUniqueBytes {
    fn fill(&mut self, values: &mut dyn BytesValues, count: usize) -> usize {
        if count == 0 {
            return self.cursor.select(0);
        }
        self.table.clear();
        for _ in 0..count {
            let (value, hash) = values.next_value_with_hash();
            self.table.add(value, hash);
        }
        self.table.sorted_ids(&mut self.sorted);
        self.cursor.select(self.sorted.len())
    }

    #[inline]
    fn next_id(&mut self) -> u32 {
        self.sorted[self.cursor.next_index()]
    }
}

// ── Float ordering ───────────────────────────────────────────────────────

/// Ascending, NaNs last and equal to each other, `-0.0 == 0.0`.
fn cmp_f64(a: &f64, b: &f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => Ordering::Equal,
    }
}

/// Stable sort, then keep the first of every run of equal values.
fn sort_dedup_doubles(values: &mut Vec<f64>) {
    values.sort_by(cmp_f64);
    values.dedup_by(|a, b| cmp_f64(a, b) == Ordering::Equal);
}

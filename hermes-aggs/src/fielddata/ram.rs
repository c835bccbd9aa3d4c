//! In-memory field data provider.
//!
//! Columns use the multi-value fast-field layout: a flat value array plus a
//! per-document offset array, `offsets[doc]..offsets[doc + 1]` being the value
//! range of `doc`. Documents without values get an empty range.
//!
//! Building a column sorts and deduplicates every document's range, so the
//! streams handed out here are unique per document and, where the view is
//! lossless, ordered:
//!
//! | column  | stored as                      | bytes view         | native view     |
//! |---------|--------------------------------|--------------------|-----------------|
//! | text    | ordinal into sorted dictionary | `Order::Bytes`     | -               |
//! | i64     | order-preserving `u64`         | decimal, unordered | `Order::Numeric`|
//! | f64     | order-preserving `u64`         | decimal, unordered | `Order::Numeric`|
//! | geo     | pair of order-preserving `u64` | `"lat,lon"`        | -               |
//!
//! Cross-type numeric views (long view of an f64 column, double view of an
//! i64 column) are not injective and report `Order::None`.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::ops::Range;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{
    AtomicFieldData, AtomicGeoPointFieldData, AtomicNumericFieldData, IndexFieldData,
    IndexGeoPointFieldData, IndexNumericFieldData, NumericType,
};
use crate::DocId;
use crate::error::{Error, Result};
use crate::segment::{SegmentContext, SegmentId};
use crate::values::{
    BytesValues, DocCursor, DoubleValues, GeoPoint, GeoPointValues, LongValues, Order, hash_bytes,
};

// ── Encoding helpers ──────────────────────────────────────────────────────

/// Encode i64 to u64 preserving order (flip the sign bit).
#[inline]
pub fn i64_to_sortable_u64(v: i64) -> u64 {
    (v as u64) ^ (1u64 << 63)
}

#[inline]
pub fn sortable_u64_to_i64(v: u64) -> i64 {
    (v ^ (1u64 << 63)) as i64
}

/// Encode f64 to u64 preserving total order.
/// Positive floats: flip sign bit (so they sort above negatives).
/// Negative floats: flip all bits (so they sort in reverse magnitude).
#[inline]
pub fn f64_to_sortable_u64(f: f64) -> u64 {
    let bits = f.to_bits();
    if (bits >> 63) == 0 {
        bits ^ (1u64 << 63)
    } else {
        !bits
    }
}

/// Collapse every NaN to one positive quiet NaN and `-0.0` to `0.0`, so the
/// bit-level sort and dedup of a column agree with float equality: all NaNs
/// are one value sorted last, and the two zeros are one value.
#[inline]
pub fn canonical_f64(f: f64) -> f64 {
    if f.is_nan() {
        f64::NAN
    } else if f == 0.0 {
        0.0
    } else {
        f
    }
}

/// Decode sortable u64 back to f64.
#[inline]
pub fn sortable_u64_to_f64(v: u64) -> f64 {
    let bits = if (v >> 63) != 0 { v ^ (1u64 << 63) } else { !v };
    f64::from_bits(bits)
}

// ── Columns ───────────────────────────────────────────────────────────────

/// Immutable multi-value column.
#[derive(Debug, Clone)]
pub struct Column<T> {
    /// Length = num_docs + 1.
    offsets: Vec<u32>,
    values: Vec<T>,
    multi: bool,
}

impl<T: Copy> Column<T> {
    pub fn num_docs(&self) -> u32 {
        (self.offsets.len() - 1) as u32
    }

    /// Index range of `doc`'s values. Out-of-range docs have no values.
    #[inline]
    pub fn doc_range(&self, doc: DocId) -> Range<usize> {
        if doc >= self.num_docs() {
            return 0..0;
        }
        let d = doc as usize;
        self.offsets[d] as usize..self.offsets[d + 1] as usize
    }

    #[inline]
    pub fn value(&self, idx: usize) -> T {
        self.values[idx]
    }

    pub fn doc_values(&self, doc: DocId) -> &[T] {
        &self.values[self.doc_range(doc)]
    }

    /// Whether any document has more than one value.
    pub fn is_multi_valued(&self) -> bool {
        self.multi
    }
}

/// Collects values in ascending doc order and builds a [`Column`].
#[derive(Debug)]
pub struct ColumnWriter<T> {
    /// Start offset of every doc up to `current_doc`.
    offsets: Vec<u32>,
    values: Vec<T>,
    current_doc: u32,
}

impl<T: Copy + Ord> Default for ColumnWriter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Ord> ColumnWriter<T> {
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            values: Vec::new(),
            current_doc: 0,
        }
    }

    /// Record a value for `doc`. Docs must not go backwards.
    pub fn add(&mut self, doc: DocId, value: T) {
        assert!(
            doc >= self.current_doc,
            "doc {doc} added after doc {}",
            self.current_doc
        );
        // Pad offsets for any skipped doc_ids
        while self.current_doc < doc {
            self.current_doc += 1;
            self.offsets.push(self.values.len() as u32);
        }
        self.values.push(value);
    }

    fn remap(&mut self, f: impl Fn(T) -> T) {
        for v in &mut self.values {
            *v = f(*v);
        }
    }

    /// Pad to `num_docs` documents, then sort and deduplicate every
    /// document's values.
    pub fn finish(mut self, num_docs: u32) -> Column<T> {
        assert!(
            self.values.is_empty() || self.current_doc < num_docs,
            "doc {} is out of range for {num_docs} docs",
            self.current_doc
        );
        while self.offsets.len() as u32 <= num_docs {
            self.offsets.push(self.values.len() as u32);
        }

        let mut offsets = Vec::with_capacity(num_docs as usize + 1);
        let mut values = Vec::with_capacity(self.values.len());
        let mut multi = false;
        offsets.push(0u32);
        for doc in 0..num_docs as usize {
            let raw = &self.values[self.offsets[doc] as usize..self.offsets[doc + 1] as usize];
            let start = values.len();
            values.extend_from_slice(raw);

            let doc_values = &mut values[start..];
            doc_values.sort_unstable();
            let mut kept = 0;
            for i in 0..doc_values.len() {
                if kept == 0 || doc_values[i] != doc_values[kept - 1] {
                    doc_values[kept] = doc_values[i];
                    kept += 1;
                }
            }
            values.truncate(start + kept);

            multi |= kept > 1;
            offsets.push(values.len() as u32);
        }

        Column {
            offsets,
            values,
            multi,
        }
    }
}

// ── Text ──────────────────────────────────────────────────────────────────

/// Dictionary-encoded text values of one segment.
#[derive(Debug)]
pub struct RamBytesFieldData {
    /// Sorted, distinct terms. Ordinal order is byte order.
    dict: Vec<Vec<u8>>,
    /// `hash_bytes` of every dictionary entry.
    hashes: Vec<u64>,
    ords: Column<u32>,
}

impl RamBytesFieldData {
    /// Build from per-document values; `docs[i]` are the values of doc `i`.
    pub fn from_docs<V: AsRef<[u8]>>(docs: Vec<Vec<V>>) -> Arc<Self> {
        let mut builder = RamBytesBuilder::new();
        for (doc, values) in docs.iter().enumerate() {
            for v in values {
                builder.add(doc as DocId, v.as_ref());
            }
        }
        builder.build(docs.len() as u32)
    }

    pub fn term(&self, ord: u32) -> &[u8] {
        &self.dict[ord as usize]
    }

    pub fn num_terms(&self) -> usize {
        self.dict.len()
    }
}

/// Collects text values and resolves them to sorted ordinals at build time.
#[derive(Debug, Default)]
pub struct RamBytesBuilder {
    /// term → insertion id
    terms: BTreeMap<Vec<u8>, u32>,
    ords: ColumnWriter<u32>,
}

impl RamBytesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, doc: DocId, value: &[u8]) {
        let next_id = self.terms.len() as u32;
        let id = *self.terms.entry(value.to_vec()).or_insert(next_id);
        self.ords.add(doc, id);
    }

    pub fn build(mut self, num_docs: u32) -> Arc<RamBytesFieldData> {
        // BTreeMap iterates in sorted order: position == sorted ordinal
        let mut remap = vec![0u32; self.terms.len()];
        for (sorted_ord, &insertion_id) in self.terms.values().enumerate() {
            remap[insertion_id as usize] = sorted_ord as u32;
        }
        self.ords.remap(|id| remap[id as usize]);

        let dict: Vec<Vec<u8>> = self.terms.into_keys().collect();
        let hashes = dict.iter().map(|t| hash_bytes(t)).collect();
        Arc::new(RamBytesFieldData {
            dict,
            hashes,
            ords: self.ords.finish(num_docs),
        })
    }
}

impl AtomicFieldData for RamBytesFieldData {
    fn num_docs(&self) -> u32 {
        self.ords.num_docs()
    }

    fn bytes_values(self: Arc<Self>, needs_hashes: bool) -> Box<dyn BytesValues> {
        Box::new(RamBytesValues {
            data: self,
            needs_hashes,
            start: 0,
            cursor: DocCursor::Unselected,
        })
    }
}

struct RamBytesValues {
    data: Arc<RamBytesFieldData>,
    needs_hashes: bool,
    start: usize,
    cursor: DocCursor,
}

impl RamBytesValues {
    #[inline]
    fn next_ord(&mut self) -> u32 {
        let idx = self.cursor.next_index();
        self.data.ords.value(self.start + idx)
    }
}

impl BytesValues for RamBytesValues {
    fn is_multi_valued(&self) -> bool {
        self.data.ords.is_multi_valued()
    }

    fn order(&self) -> Order {
        Order::Bytes
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        let range = self.data.ords.doc_range(doc);
        self.start = range.start;
        Ok(self.cursor.select(range.len()))
    }

    fn next_value(&mut self) -> &[u8] {
        let ord = self.next_ord();
        self.data.term(ord)
    }

    fn next_value_with_hash(&mut self) -> (&[u8], u64) {
        let ord = self.next_ord();
        let term = self.data.term(ord);
        if self.needs_hashes {
            (term, self.data.hashes[ord as usize])
        } else {
            (term, hash_bytes(term))
        }
    }
}

// ── Numeric ───────────────────────────────────────────────────────────────

/// Numeric values of one segment, stored order-preserving.
#[derive(Debug)]
pub struct RamNumericFieldData {
    numeric_type: NumericType,
    column: Column<u64>,
}

impl RamNumericFieldData {
    pub fn from_i64_docs(docs: Vec<Vec<i64>>) -> Arc<Self> {
        let mut builder = RamNumericBuilder::new(NumericType::I64);
        for (doc, values) in docs.iter().enumerate() {
            for &v in values {
                builder.add_i64(doc as DocId, v);
            }
        }
        builder.build(docs.len() as u32)
    }

    pub fn from_f64_docs(docs: Vec<Vec<f64>>) -> Arc<Self> {
        let mut builder = RamNumericBuilder::new(NumericType::F64);
        for (doc, values) in docs.iter().enumerate() {
            for &v in values {
                builder.add_f64(doc as DocId, v);
            }
        }
        builder.build(docs.len() as u32)
    }

    pub fn numeric_type(&self) -> NumericType {
        self.numeric_type
    }

    #[inline]
    fn long(&self, idx: usize) -> i64 {
        let raw = self.column.value(idx);
        match self.numeric_type {
            NumericType::I64 => sortable_u64_to_i64(raw),
            NumericType::F64 => sortable_u64_to_f64(raw) as i64,
        }
    }

    #[inline]
    fn double(&self, idx: usize) -> f64 {
        let raw = self.column.value(idx);
        match self.numeric_type {
            NumericType::I64 => sortable_u64_to_i64(raw) as f64,
            NumericType::F64 => sortable_u64_to_f64(raw),
        }
    }
}

#[derive(Debug)]
pub struct RamNumericBuilder {
    numeric_type: NumericType,
    writer: ColumnWriter<u64>,
}

impl RamNumericBuilder {
    pub fn new(numeric_type: NumericType) -> Self {
        Self {
            numeric_type,
            writer: ColumnWriter::new(),
        }
    }

    /// Record an integer. Widened for f64 columns.
    pub fn add_i64(&mut self, doc: DocId, value: i64) {
        let raw = match self.numeric_type {
            NumericType::I64 => i64_to_sortable_u64(value),
            NumericType::F64 => f64_to_sortable_u64(canonical_f64(value as f64)),
        };
        self.writer.add(doc, raw);
    }

    /// Record a float. Truncated for i64 columns.
    pub fn add_f64(&mut self, doc: DocId, value: f64) {
        let raw = match self.numeric_type {
            NumericType::I64 => i64_to_sortable_u64(value as i64),
            NumericType::F64 => f64_to_sortable_u64(canonical_f64(value)),
        };
        self.writer.add(doc, raw);
    }

    pub fn build(self, num_docs: u32) -> Arc<RamNumericFieldData> {
        Arc::new(RamNumericFieldData {
            numeric_type: self.numeric_type,
            column: self.writer.finish(num_docs),
        })
    }
}

impl AtomicFieldData for RamNumericFieldData {
    fn num_docs(&self) -> u32 {
        self.column.num_docs()
    }

    fn bytes_values(self: Arc<Self>, _needs_hashes: bool) -> Box<dyn BytesValues> {
        Box::new(RamNumericBytesValues {
            data: self,
            start: 0,
            cursor: DocCursor::Unselected,
            scratch: String::new(),
        })
    }
}

impl AtomicNumericFieldData for RamNumericFieldData {
    fn long_values(self: Arc<Self>) -> Box<dyn LongValues> {
        Box::new(RamLongValues {
            data: self,
            start: 0,
            cursor: DocCursor::Unselected,
        })
    }

    fn double_values(self: Arc<Self>) -> Box<dyn DoubleValues> {
        Box::new(RamDoubleValues {
            data: self,
            start: 0,
            cursor: DocCursor::Unselected,
        })
    }
}

struct RamLongValues {
    data: Arc<RamNumericFieldData>,
    start: usize,
    cursor: DocCursor,
}

impl LongValues for RamLongValues {
    fn is_multi_valued(&self) -> bool {
        self.data.column.is_multi_valued()
    }

    fn order(&self) -> Order {
        match self.data.numeric_type {
            NumericType::I64 => Order::Numeric,
            NumericType::F64 => Order::None,
        }
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        let range = self.data.column.doc_range(doc);
        self.start = range.start;
        Ok(self.cursor.select(range.len()))
    }

    fn next_value(&mut self) -> i64 {
        let idx = self.cursor.next_index();
        self.data.long(self.start + idx)
    }
}

struct RamDoubleValues {
    data: Arc<RamNumericFieldData>,
    start: usize,
    cursor: DocCursor,
}

impl DoubleValues for RamDoubleValues {
    fn is_multi_valued(&self) -> bool {
        self.data.column.is_multi_valued()
    }

    fn order(&self) -> Order {
        match self.data.numeric_type {
            NumericType::I64 => Order::None,
            NumericType::F64 => Order::Numeric,
        }
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        let range = self.data.column.doc_range(doc);
        self.start = range.start;
        Ok(self.cursor.select(range.len()))
    }

    fn next_value(&mut self) -> f64 {
        let idx = self.cursor.next_index();
        self.data.double(self.start + idx)
    }
}

struct RamNumericBytesValues {
    data: Arc<RamNumericFieldData>,
    start: usize,
    cursor: DocCursor,
    scratch: String,
}

impl BytesValues for RamNumericBytesValues {
    fn is_multi_valued(&self) -> bool {
        self.data.column.is_multi_valued()
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        let range = self.data.column.doc_range(doc);
        self.start = range.start;
        Ok(self.cursor.select(range.len()))
    }

    fn next_value(&mut self) -> &[u8] {
        let idx = self.start + self.cursor.next_index();
        self.scratch.clear();
        // Writing into a String cannot fail
        let _ = match self.data.numeric_type {
            NumericType::I64 => write!(self.scratch, "{}", self.data.long(idx)),
            NumericType::F64 => write!(self.scratch, "{}", self.data.double(idx)),
        };
        self.scratch.as_bytes()
    }
}

// ── Geo points ────────────────────────────────────────────────────────────

/// Geo points of one segment, stored as sortable (lat, lon) pairs.
#[derive(Debug)]
pub struct RamGeoPointFieldData {
    column: Column<(u64, u64)>,
}

impl RamGeoPointFieldData {
    pub fn from_docs(docs: Vec<Vec<GeoPoint>>) -> Arc<Self> {
        let mut writer = ColumnWriter::new();
        for (doc, points) in docs.iter().enumerate() {
            for p in points {
                writer.add(
                    doc as DocId,
                    (
                        f64_to_sortable_u64(canonical_f64(p.lat)),
                        f64_to_sortable_u64(canonical_f64(p.lon)),
                    ),
                );
            }
        }
        Arc::new(Self {
            column: writer.finish(docs.len() as u32),
        })
    }

    #[inline]
    fn point(&self, idx: usize) -> GeoPoint {
        let (lat, lon) = self.column.value(idx);
        GeoPoint::new(sortable_u64_to_f64(lat), sortable_u64_to_f64(lon))
    }
}

impl AtomicFieldData for RamGeoPointFieldData {
    fn num_docs(&self) -> u32 {
        self.column.num_docs()
    }

    fn bytes_values(self: Arc<Self>, _needs_hashes: bool) -> Box<dyn BytesValues> {
        Box::new(RamGeoBytesValues {
            data: self,
            start: 0,
            cursor: DocCursor::Unselected,
            scratch: String::new(),
        })
    }
}

impl AtomicGeoPointFieldData for RamGeoPointFieldData {
    fn geo_point_values(self: Arc<Self>) -> Box<dyn GeoPointValues> {
        Box::new(RamGeoPointValues {
            data: self,
            start: 0,
            cursor: DocCursor::Unselected,
        })
    }
}

struct RamGeoPointValues {
    data: Arc<RamGeoPointFieldData>,
    start: usize,
    cursor: DocCursor,
}

impl GeoPointValues for RamGeoPointValues {
    fn is_multi_valued(&self) -> bool {
        self.data.column.is_multi_valued()
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        let range = self.data.column.doc_range(doc);
        self.start = range.start;
        Ok(self.cursor.select(range.len()))
    }

    fn next_value(&mut self) -> GeoPoint {
        let idx = self.cursor.next_index();
        self.data.point(self.start + idx)
    }
}

struct RamGeoBytesValues {
    data: Arc<RamGeoPointFieldData>,
    start: usize,
    cursor: DocCursor,
    scratch: String,
}

impl BytesValues for RamGeoBytesValues {
    fn is_multi_valued(&self) -> bool {
        self.data.column.is_multi_valued()
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        let range = self.data.column.doc_range(doc);
        self.start = range.start;
        Ok(self.cursor.select(range.len()))
    }

    fn next_value(&mut self) -> &[u8] {
        let point = self.data.point(self.start + self.cursor.next_index());
        self.scratch.clear();
        let _ = write!(self.scratch, "{point}");
        self.scratch.as_bytes()
    }
}

// ── Field-level indexes ───────────────────────────────────────────────────

/// Per-field map of segment → loaded field data.
///
/// Segments can be registered while the index is shared with running
/// aggregations.
pub struct RamIndex<D> {
    field: String,
    segments: RwLock<FxHashMap<SegmentId, Arc<D>>>,
}

pub type RamBytesIndex = RamIndex<RamBytesFieldData>;
pub type RamGeoPointIndex = RamIndex<RamGeoPointFieldData>;

impl<D> RamIndex<D> {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            segments: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn insert(&self, segment: SegmentId, data: Arc<D>) {
        self.segments.write().insert(segment, data);
    }

    pub fn remove(&self, segment: SegmentId) -> Option<Arc<D>> {
        self.segments.write().remove(&segment)
    }

    pub fn num_segments(&self) -> usize {
        self.segments.read().len()
    }

    fn get(&self, segment: &SegmentContext) -> Result<Arc<D>> {
        let data = self.segments.read().get(&segment.id).cloned();
        log::trace!(
            "RamIndex[{}]: load segment {} (ord {}) -> {}",
            self.field,
            segment.id.to_hex(),
            segment.ord,
            if data.is_some() { "hit" } else { "missing" }
        );
        data.ok_or_else(|| Error::FieldDataLoad {
            field: self.field.clone(),
            segment: segment.id,
            reason: "no field data loaded for segment".to_string(),
        })
    }
}

impl IndexFieldData for RamBytesIndex {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn load(&self, segment: &SegmentContext) -> Result<Arc<dyn AtomicFieldData>> {
        let data: Arc<dyn AtomicFieldData> = self.get(segment)?;
        Ok(data)
    }
}

impl IndexGeoPointFieldData for RamGeoPointIndex {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn load(&self, segment: &SegmentContext) -> Result<Arc<dyn AtomicGeoPointFieldData>> {
        let data: Arc<dyn AtomicGeoPointFieldData> = self.get(segment)?;
        Ok(data)
    }
}

/// Numeric field index; every segment must carry the field's numeric type.
pub struct RamNumericIndex {
    numeric_type: NumericType,
    segments: RamIndex<RamNumericFieldData>,
}

impl RamNumericIndex {
    pub fn new(field: impl Into<String>, numeric_type: NumericType) -> Self {
        Self {
            numeric_type,
            segments: RamIndex::new(field),
        }
    }

    pub fn insert(&self, segment: SegmentId, data: Arc<RamNumericFieldData>) {
        assert_eq!(
            data.numeric_type, self.numeric_type,
            "segment data type does not match field type"
        );
        self.segments.insert(segment, data);
    }

    pub fn remove(&self, segment: SegmentId) -> Option<Arc<RamNumericFieldData>> {
        self.segments.remove(segment)
    }
}

impl IndexNumericFieldData for RamNumericIndex {
    fn field_name(&self) -> &str {
        &self.segments.field
    }

    fn numeric_type(&self) -> NumericType {
        self.numeric_type
    }

    fn load(&self, segment: &SegmentContext) -> Result<Arc<dyn AtomicNumericFieldData>> {
        let data: Arc<dyn AtomicNumericFieldData> = self.segments.get(segment)?;
        Ok(data)
    }
}

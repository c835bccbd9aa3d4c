//! Field-backed sources over per-segment field data.

use std::sync::Arc;

use super::{NumericValuesSource, Slot, Uniqueness, ValuesSource};
use crate::error::Result;
use crate::fielddata::{
    AtomicFieldData, AtomicNumericFieldData, IndexFieldData, IndexNumericFieldData,
};
use crate::segment::SegmentContext;
use crate::values::{BytesValues, DoubleValues, LongValues, Order};

/// Byte-string values of an indexed field.
pub struct BytesFieldData {
    index: Arc<dyn IndexFieldData>,
    needs_hashes: bool,
    data: Option<Arc<dyn AtomicFieldData>>,
    bytes: Slot<Box<dyn BytesValues>>,
}

impl BytesFieldData {
    pub fn new(index: Arc<dyn IndexFieldData>) -> Self {
        Self {
            index,
            needs_hashes: false,
            data: None,
            bytes: Slot::Unbound,
        }
    }

    pub fn field_name(&self) -> &str {
        self.index.field_name()
    }
}

impl ValuesSource for BytesFieldData {
    fn uniqueness(&self) -> Uniqueness {
        Uniqueness::Unique
    }

    fn bytes_values(&mut self) -> Result<&mut dyn BytesValues> {
        let needs_hashes = self.needs_hashes;
        let data = &self.data;
        let values = self
            .bytes
            .get_or_init(|| bound(data).clone().bytes_values(needs_hashes));
        Ok(values.as_mut())
    }

    /// Takes effect on the next stream creation.
    fn set_needs_hashes(&mut self, needs_hashes: bool) {
        self.needs_hashes = needs_hashes;
    }

    fn set_next_segment(&mut self, segment: &SegmentContext) -> Result<()> {
        let data = self.index.load(segment)?;
        log::debug!(
            "BytesFieldData[{}]: bound to segment {} (ord {}, {} docs), rebuild={}",
            self.index.field_name(),
            segment.id.to_hex(),
            segment.ord,
            data.num_docs(),
            self.bytes.is_ready()
        );
        let needs_hashes = self.needs_hashes;
        self.bytes
            .rebind(|| data.clone().bytes_values(needs_hashes));
        self.data = Some(data);
        Ok(())
    }
}

/// Numeric values of an indexed field.
///
/// The lossless stream (longs of an integer field, doubles of a
/// floating-point field) comes out in numeric order.
pub struct NumericFieldData {
    index: Arc<dyn IndexNumericFieldData>,
    needs_hashes: bool,
    data: Option<Arc<dyn AtomicNumericFieldData>>,
    bytes: Slot<Box<dyn BytesValues>>,
    longs: Slot<Box<dyn LongValues>>,
    doubles: Slot<Box<dyn DoubleValues>>,
}

impl NumericFieldData {
    pub fn new(index: Arc<dyn IndexNumericFieldData>) -> Self {
        Self {
            index,
            needs_hashes: false,
            data: None,
            bytes: Slot::Unbound,
            longs: Slot::Unbound,
            doubles: Slot::Unbound,
        }
    }

    pub fn field_name(&self) -> &str {
        self.index.field_name()
    }
}

impl ValuesSource for NumericFieldData {
    fn uniqueness(&self) -> Uniqueness {
        Uniqueness::Unique
    }

    fn bytes_values(&mut self) -> Result<&mut dyn BytesValues> {
        let needs_hashes = self.needs_hashes;
        let data = &self.data;
        let values = self
            .bytes
            .get_or_init(|| bound(data).clone().bytes_values(needs_hashes));
        Ok(values.as_mut())
    }

    fn set_needs_hashes(&mut self, needs_hashes: bool) {
        self.needs_hashes = needs_hashes;
    }

    fn set_next_segment(&mut self, segment: &SegmentContext) -> Result<()> {
        let data = self.index.load(segment)?;
        log::debug!(
            "NumericFieldData[{}]: bound to segment {} (ord {}, {} docs), rebuild bytes={} longs={} doubles={}",
            self.index.field_name(),
            segment.id.to_hex(),
            segment.ord,
            data.num_docs(),
            self.bytes.is_ready(),
            self.longs.is_ready(),
            self.doubles.is_ready()
        );
        let needs_hashes = self.needs_hashes;
        self.bytes
            .rebind(|| data.clone().bytes_values(needs_hashes));
        self.longs.rebind(|| data.clone().long_values());
        self.doubles.rebind(|| data.clone().double_values());
        self.data = Some(data);
        Ok(())
    }
}

impl NumericValuesSource for NumericFieldData {
    fn is_floating_point(&self) -> bool {
        self.index.numeric_type().is_floating_point()
    }

    fn long_values(&mut self) -> Result<&mut dyn LongValues> {
        let floating = self.is_floating_point();
        let data = &self.data;
        let values = self
            .longs
            .get_or_init(|| bound(data).clone().long_values());
        debug_assert!(
            floating || values.order() == Order::Numeric,
            "long values of an integer field must be in numeric order"
        );
        Ok(values.as_mut())
    }

    fn double_values(&mut self) -> Result<&mut dyn DoubleValues> {
        let floating = self.is_floating_point();
        let data = &self.data;
        let values = self
            .doubles
            .get_or_init(|| bound(data).clone().double_values());
        debug_assert!(
            !floating || values.order() == Order::Numeric,
            "double values of a floating-point field must be in numeric order"
        );
        Ok(values.as_mut())
    }
}

/// Segment data of a source whose slot is past `Unbound`.
pub(super) fn bound<T: ?Sized>(data: &Option<Arc<T>>) -> &Arc<T> {
    match data {
        Some(data) => data,
        None => panic!("value stream requested before the first segment was bound"),
    }
}

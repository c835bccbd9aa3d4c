//! Field-backed geo-point source.

use std::sync::Arc;

use super::field_data::bound;
use super::{GeoPointValuesSource, Slot, Uniqueness, ValuesSource};
use crate::error::Result;
use crate::fielddata::{AtomicFieldData, AtomicGeoPointFieldData, IndexGeoPointFieldData};
use crate::segment::SegmentContext;
use crate::values::{BytesValues, GeoPointValues};

/// Geo points of an indexed field, as points or as `"lat,lon"` strings.
pub struct GeoPointFieldData {
    index: Arc<dyn IndexGeoPointFieldData>,
    needs_hashes: bool,
    data: Option<Arc<dyn AtomicGeoPointFieldData>>,
    bytes: Slot<Box<dyn BytesValues>>,
    points: Slot<Box<dyn GeoPointValues>>,
}

impl GeoPointFieldData {
    pub fn new(index: Arc<dyn IndexGeoPointFieldData>) -> Self {
        Self {
            index,
            needs_hashes: false,
            data: None,
            bytes: Slot::Unbound,
            points: Slot::Unbound,
        }
    }

    pub fn field_name(&self) -> &str {
        self.index.field_name()
    }
}

impl ValuesSource for GeoPointFieldData {
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
            "GeoPointFieldData[{}]: bound to segment {} (ord {}), rebuild bytes={} points={}",
            self.index.field_name(),
            segment.id.to_hex(),
            segment.ord,
            self.bytes.is_ready(),
            self.points.is_ready()
        );
        let needs_hashes = self.needs_hashes;
        self.bytes
            .rebind(|| data.clone().bytes_values(needs_hashes));
        self.points.rebind(|| data.clone().geo_point_values());
        self.data = Some(data);
        Ok(())
    }
}

impl GeoPointValuesSource for GeoPointFieldData {
    fn geo_point_values(&mut self) -> Result<&mut dyn GeoPointValues> {
        let data = &self.data;
        let values = self
            .points
            .get_or_init(|| bound(data).clone().geo_point_values());
        Ok(values.as_mut())
    }
}

//! Segment identity handed to value sources at segment boundaries

/// Segment identifier, as assigned by the index (UUID7-like).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId(pub u128);

impl SegmentId {
    pub fn from_u128(id: u128) -> Self {
        Self(id)
    }

    /// Convert to hex string (32 chars, zero-padded)
    pub fn to_hex(&self) -> String {
        format!("{:032x}", self.0)
    }
}

/// The segment currently being visited by an aggregation.
///
/// Passed to [`ValuesSource::set_next_segment`](crate::ValuesSource::set_next_segment)
/// once per segment, before any of its documents are read. Doc ids handed to
/// value streams afterwards are segment-local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentContext {
    pub id: SegmentId,
    /// Position of the segment in the searcher's segment list.
    pub ord: u32,
    pub num_docs: u32,
}

impl SegmentContext {
    pub fn new(id: SegmentId, ord: u32, num_docs: u32) -> Self {
        Self { id, ord, num_docs }
    }
}

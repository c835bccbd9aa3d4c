//! Error types for hermes-aggs

use crate::segment::SegmentId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to load field data for '{field}' in segment {}: {reason}", segment.to_hex())]
    FieldDataLoad {
        field: String,
        segment: SegmentId,
        reason: String,
    },

    #[error("Script error: {0}")]
    Script(String),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Invalid field type for '{field}': expected {expected}, got {got}")]
    InvalidFieldType {
        field: String,
        expected: String,
        got: String,
    },

    #[error("Invalid values source config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

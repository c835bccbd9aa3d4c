//! Data structures backing the value sources

mod bytes_hash;

pub use bytes_hash::BytesHash;

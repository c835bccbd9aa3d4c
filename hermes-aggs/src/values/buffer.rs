//! Reusable per-document value buffers.
//!
//! Streams that compute their values (scripts, overlays, sort/dedupe
//! adapters) materialize one document at a time into these buffers. Capacity
//! is kept across documents; each document rewrites the used range before it
//! is read.

use super::DocCursor;

/// Buffered numeric values of the current document.
#[derive(Debug)]
pub struct NumericBuffer<T> {
    values: Vec<T>,
    cursor: DocCursor,
}

impl<T: Copy> Default for NumericBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> NumericBuffer<T> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            cursor: DocCursor::Unselected,
        }
    }

    /// Drop the previous document's values. Capacity is retained.
    #[inline]
    pub fn clear(&mut self) {
        self.values.clear();
        self.cursor = DocCursor::Unselected;
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    /// Mutable access to the buffered values, for in-place sort and compaction.
    #[inline]
    pub fn values_mut(&mut self) -> &mut Vec<T> {
        &mut self.values
    }

    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Select the buffered values as the current document. Returns the count.
    #[inline]
    pub fn select(&mut self) -> usize {
        self.cursor.select(self.values.len())
    }

    /// Select an empty document without touching the buffered values.
    #[inline]
    pub fn select_empty(&mut self) -> usize {
        self.cursor.select(0)
    }

    #[inline]
    pub fn next(&mut self) -> T {
        let idx = self.cursor.next_index();
        self.values[idx]
    }
}

/// Buffered byte-string values of the current document, stored back to back
/// in one arena.
#[derive(Debug, Default)]
pub struct BytesBuffer {
    data: Vec<u8>,
    ends: Vec<usize>,
    cursor: DocCursor,
}

impl BytesBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
        self.ends.clear();
        self.cursor = DocCursor::Unselected;
    }

    #[inline]
    pub fn push(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
        self.ends.push(self.data.len());
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    #[inline]
    pub fn select(&mut self) -> usize {
        self.cursor.select(self.ends.len())
    }

    #[inline]
    pub fn next(&mut self) -> &[u8] {
        let idx = self.cursor.next_index();
        let start = if idx == 0 { 0 } else { self.ends[idx - 1] };
        &self.data[start..self.ends[idx]]
    }
}

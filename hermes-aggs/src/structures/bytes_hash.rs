//! Deduplicating byte-string table.
//!
//! Values are appended to a single arena and indexed by a dense id
//! (`0..len`). Adding bytes that are already present returns the existing id,
//! so `len()` is always the number of distinct values added since the last
//! `clear()`. All allocations are retained across `clear()`.

use hashbrown::HashTable;

#[derive(Default)]
pub struct BytesHash {
    data: Vec<u8>,
    /// End offset in `data` of each id.
    ends: Vec<usize>,
    /// Hash of each id, for rehashing on table growth.
    hashes: Vec<u64>,
    table: HashTable<u32>,
}

impl BytesHash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.ends.clear();
        self.hashes.clear();
        self.table.clear();
    }

    /// Bytes of entry `id`.
    #[inline]
    pub fn get(&self, id: u32) -> &[u8] {
        let idx = id as usize;
        let start = if idx == 0 { 0 } else { self.ends[idx - 1] };
        &self.data[start..self.ends[idx]]
    }

    #[inline]
    pub fn hash(&self, id: u32) -> u64 {
        self.hashes[id as usize]
    }

    /// Add `bytes` with precomputed `hash`. Returns the id of the entry,
    /// existing or new.
    pub fn add(&mut self, bytes: &[u8], hash: u64) -> u32 {
        if let Some(&id) = self.table.find(hash, |&id| self.get(id) == bytes) {
            return id;
        }
        let id = self.ends.len() as u32;
        self.data.extend_from_slice(bytes);
        self.ends.push(self.data.len());
        self.hashes.push(hash);
        let hashes = &self.hashes;
        self.table.insert_unique(hash, id, |&i| hashes[i as usize]);
        id
    }

    /// Fill `out` with all ids ordered by byte-lexicographic value.
    pub fn sorted_ids(&self, out: &mut Vec<u32>) {
        out.clear();
        out.extend(0..self.len() as u32);
        // Entries are distinct, stability is irrelevant.
        out.sort_unstable_by(|&a, &b| self.get(a).cmp(self.get(b)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::hash_bytes;

    fn add(table: &mut BytesHash, bytes: &[u8]) -> u32 {
        table.add(bytes, hash_bytes(bytes))
    }

    #[test]
    fn test_equal_bytes_share_an_id() {
        let mut table = BytesHash::new();
        let a = add(&mut table, b"apple");
        let b = add(&mut table, b"banana");
        assert_eq!(add(&mut table, b"apple"), a);
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(b), b"banana");
    }

    #[test]
    fn test_sorted_ids_are_lexicographic() {
        let mut table = BytesHash::new();
        for v in [&b"b"[..], b"ab", b"a", b"", b"ab"] {
            add(&mut table, v);
        }
        let mut ids = Vec::new();
        table.sorted_ids(&mut ids);
        let sorted: Vec<&[u8]> = ids.iter().map(|&id| table.get(id)).collect();
        assert_eq!(sorted, vec![&b""[..], b"a", b"ab", b"b"]);
    }

    #[test]
    fn test_clear_forgets_entries() {
        let mut table = BytesHash::new();
        add(&mut table, b"x");
        table.clear();
        assert!(table.is_empty());
        assert_eq!(add(&mut table, b"y"), 0);
        assert_eq!(table.get(0), b"y");
    }

    #[test]
    fn test_many_entries_survive_growth() {
        let mut table = BytesHash::new();
        for i in 0..10_000u32 {
            add(&mut table, i.to_string().as_bytes());
        }
        for i in 0..10_000u32 {
            assert_eq!(add(&mut table, i.to_string().as_bytes()), i);
        }
        assert_eq!(table.len(), 10_000);
    }

    #[test]
    fn test_colliding_hashes_compare_bytes() {
        let mut table = BytesHash::new();
        let a = table.add(b"one", 42);
        let b = table.add(b"two", 42);
        assert_ne!(a, b);
        assert_eq!(table.add(b"one", 42), a);
    }
}

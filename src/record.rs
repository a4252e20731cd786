//! Record definition
//!
//! A key/value pair with a tombstone flag and a cached size.

use crate::codec::U32_SIZE;

/// A single key/value pair as buffered and persisted
///
/// `size` is `len(key) + len(value)`, computed once in the constructor.
/// Fields are private so the cached size can never drift from the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    key: Vec<u8>,
    value: Vec<u8>,
    deleted: bool,
    size: u32,
}

impl Record {
    /// Create a live record
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self::build(key.into(), value.into(), false)
    }

    /// Create a tombstone (deleted key, empty value)
    pub fn tombstone(key: impl Into<Vec<u8>>) -> Self {
        Self::build(key.into(), Vec::new(), true)
    }

    fn build(key: Vec<u8>, value: Vec<u8>, deleted: bool) -> Self {
        let size = u32::try_from(key.len() + value.len()).unwrap_or(u32::MAX);
        Self {
            key,
            value,
            deleted,
            size,
        }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Value bytes; always empty for a tombstone
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Whether this record marks its key as deleted
    ///
    /// Never infer this from an empty value: a live record may hold one.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Cached `len(key) + len(value)`
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Bytes this record occupies inside a page (two length prefixes + payload)
    pub fn encoded_len(&self) -> usize {
        2 * U32_SIZE + self.key.len() + self.value.len()
    }

    /// Split into (key, value, deleted)
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>, bool) {
        (self.key, self.value, self.deleted)
    }
}

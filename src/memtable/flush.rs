//! Flush pipeline
//!
//! Turns buffered records into page-sized batches for a sorted table.

use std::collections::BTreeMap;

use crate::record::Record;
use crate::storage::page::PAGE_DATA_SIZE;

/// Order records by key, keeping only the most recent record per key
///
/// The buffer is append-only, so a key may appear several times and in any
/// order; pages need each key once and sorted.
pub fn sorted_run(entries: &[Record]) -> Vec<&Record> {
    let mut latest: BTreeMap<&[u8], &Record> = BTreeMap::new();
    for record in entries {
        // Later entries overwrite earlier ones
        latest.insert(record.key(), record);
    }
    latest.into_values().collect()
}

/// Split `records` into consecutive batches that each fit one page
///
/// A batch is closed as soon as the next record's encoded size would push it
/// past the page data capacity; that record opens the following batch.
pub fn partition_into_pages<'a>(records: &[&'a Record]) -> Vec<Vec<&'a Record>> {
    let capacity = PAGE_DATA_SIZE as usize;
    let mut batches = Vec::new();
    let mut current: Vec<&Record> = Vec::new();
    let mut current_bytes = 0usize;

    for &record in records {
        let len = record.encoded_len();
        if !current.is_empty() && current_bytes + len > capacity {
            batches.push(std::mem::take(&mut current));
            current_bytes = 0;
        }
        current.push(record);
        current_bytes += len;
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

//! MemTable implementation
//!
//! Vec-backed write buffer that flushes itself into a sorted table.

use tracing::{debug, info, warn};

use crate::error::{PageKvError, Result};
use crate::record::Record;
use crate::storage::page::PAGE_DATA_SIZE;
use crate::storage::{SortedTable, TablePaths};

use super::flush::{partition_into_pages, sorted_run};
use super::MemTableEntry;

/// In-memory buffer for recent writes
pub struct MemTable {
    /// Records in arrival order
    entries: Vec<Record>,
    /// Sum of `Record::size` over `entries`
    size: u32,
    /// Flush threshold, fixed at construction
    limit: u32,
    /// Where flushed tables go
    paths: TablePaths,
}

impl MemTable {
    /// Create an empty MemTable that flushes once `limit` bytes are buffered
    pub fn new(limit: u32, paths: TablePaths) -> Self {
        Self {
            entries: Vec::new(),
            size: 0,
            limit,
            paths,
        }
    }

    /// Get the newest record for `key`
    ///
    /// Returns:
    /// - `Some(Value(v))`: live value
    /// - `Some(Tombstone)`: logically deleted; older tables must not be consulted
    /// - `None`: not in the buffer; consult tables
    pub fn get(&self, key: &[u8]) -> Option<MemTableEntry> {
        self.entries
            .iter()
            .rev()
            .find(|record| record.key() == key)
            .map(|record| {
                if record.is_deleted() {
                    MemTableEntry::Tombstone
                } else {
                    MemTableEntry::Value(record.value().to_vec())
                }
            })
    }

    /// Buffer a record, flushing synchronously once the limit is reached
    ///
    /// Returns the table written by that flush, if one happened. If the flush
    /// fails the record stays buffered and the error is returned; the next
    /// `put` or an explicit [`MemTable::flush`] retries it.
    pub fn put(&mut self, record: Record) -> Result<Option<SortedTable>> {
        // A record that cannot fit an empty page would wedge every later flush
        let required = record.encoded_len();
        if required > PAGE_DATA_SIZE as usize {
            return Err(PageKvError::InsufficientSpace {
                required,
                available: PAGE_DATA_SIZE as usize,
            });
        }

        self.size = self.size.saturating_add(record.size());
        self.entries.push(record);

        if self.is_full() {
            return self.flush();
        }
        Ok(None)
    }

    /// Buffer a tombstone for `key`
    pub fn delete(&mut self, key: impl Into<Vec<u8>>) -> Result<Option<SortedTable>> {
        self.put(Record::tombstone(key))
    }

    /// Drain the buffer into a new sorted table
    ///
    /// The buffer is cleared only after the table is durably written.
    /// Returns `Ok(None)` when there is nothing to flush.
    pub fn flush(&mut self) -> Result<Option<SortedTable>> {
        if self.entries.is_empty() {
            return Ok(None);
        }

        let mut table = SortedTable::new(self.paths.current());
        let result = self.fill(&mut table).and_then(|()| table.write());
        if let Err(e) = result {
            warn!(
                path = %table.path().display(),
                buffered = self.entries.len(),
                error = %e,
                "flush failed, records stay buffered"
            );
            return Err(e);
        }

        info!(
            path = %table.path().display(),
            records = self.entries.len(),
            pages = table.page_count(),
            bytes = self.size,
            "write buffer flushed"
        );

        self.paths.advance();
        self.clear();
        Ok(Some(table))
    }

    fn fill(&self, table: &mut SortedTable) -> Result<()> {
        let run = sorted_run(&self.entries);
        for batch in partition_into_pages(&run) {
            table.create_page(batch)?;
        }
        debug!(
            unique_keys = run.len(),
            pages = table.page_count(),
            "flush batches built"
        );
        Ok(())
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.size = 0;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Cumulative size of buffered records
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if the size budget is used up
    pub fn is_full(&self) -> bool {
        self.size >= self.limit
    }

    /// Buffered records in arrival order
    pub fn entries(&self) -> &[Record] {
        &self.entries
    }

    /// Naming cursor for the next flush
    pub fn paths(&self) -> &TablePaths {
        &self.paths
    }
}

//! Sorted Table Module
//!
//! Immutable, page-based sorted key-value storage produced by one flush.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (4 bytes)                                        │
//! │   IndexOffset: u32                                      │
//! ├─────────────────────────────────────────────────────────┤
//! │ Pages (4096 bytes each, in key order)                   │
//! │   Count: u32 | Offset: u32 | Data (4088)                │
//! │   ... repeated for each page ...                        │
//! ├─────────────────────────────────────────────────────────┤
//! │ Index (bincode, from IndexOffset to EOF)                │
//! │   PageCount: u32 | PagesCRC: u32 | [(Key, Offset)]      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Index Offsets
//! Every key maps to the absolute file offset of its record:
//! `4 + page_no * 4096 + page_offset`, where `page_offset` is the page
//! header's offset at the moment the record was appended. A page lookup
//! started there finds the key on its first comparison.

mod index;
mod reader;
mod writer;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PageKvError, Result};
use crate::record::Record;

use super::page::{Page, PAGE_HEADER_SIZE, PAGE_SIZE};

// =============================================================================
// Shared Constants (used by writer, reader)
// =============================================================================

/// Header size: IndexOffset (4)
pub const TABLE_HEADER_SIZE: u32 = 4;

// =============================================================================
// Table Metadata
// =============================================================================

/// Lifecycle of a sorted table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// Freshly constructed, nothing added
    Empty,
    /// Pages are being added
    Building,
    /// Durable on disk; read-only from here on
    Written,
}

/// Sorted table header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableHeader {
    size: u32,
}

impl TableHeader {
    /// Bytes of page data: one page-size unit per page
    pub fn size(&self) -> u32 {
        self.size
    }
}

// =============================================================================
// Sorted Table
// =============================================================================

/// An ordered collection of pages plus a key → file offset index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedTable {
    header: TableHeader,
    /// key → absolute file offset of the key's record
    index: BTreeMap<Vec<u8>, u32>,
    pages: Vec<Page>,
    path: PathBuf,
    state: TableState,
}

impl SortedTable {
    /// Create an empty table backed by `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            header: TableHeader::default(),
            index: BTreeMap::new(),
            pages: Vec::new(),
            path: path.as_ref().to_path_buf(),
            state: TableState::Empty,
        }
    }

    /// Build one page from `records` and add it to the table
    ///
    /// Records must arrive in non-decreasing key order, continuing from the
    /// largest key already in the table. On any error the table is left
    /// exactly as it was.
    pub fn create_page<'a, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        self.ensure_mutable()?;

        let page_no = self.pages.len() as u64;
        let page_base = page_no * PAGE_SIZE as u64 + TABLE_HEADER_SIZE as u64;
        // The index offset written after this page must still fit a u32
        let new_size = u32::try_from((page_no + 1) * PAGE_SIZE as u64)
            .ok()
            .filter(|size| size.checked_add(TABLE_HEADER_SIZE).is_some())
            .ok_or_else(|| {
                PageKvError::Serialization(format!(
                    "table cannot grow past {} pages",
                    page_no
                ))
            })?;

        let table_max = self.max_key();
        let mut previous: Option<&[u8]> = None;
        let mut page = Page::new();
        let mut entries = Vec::new();

        for record in records {
            if let Some(prev) = previous.or(table_max) {
                if record.key() < prev {
                    return Err(PageKvError::OutOfOrder {
                        previous: prev.to_vec(),
                        key: record.key().to_vec(),
                    });
                }
            }

            let record_offset = page_base + page.header().offset() as u64;
            page.append(record)?;
            // page_base + offset <= new_size + TABLE_HEADER_SIZE, checked above
            entries.push((record.key().to_vec(), record_offset as u32));
            previous = Some(record.key());
        }

        debug!(
            page_no,
            records = page.count(),
            used = page.used(),
            "page created"
        );

        self.index.extend(entries);
        self.pages.push(page);
        self.header.size = new_size;
        self.state = TableState::Building;
        Ok(())
    }

    /// Point lookup through the index
    ///
    /// Returns:
    /// - `Ok(Some(value))`: key found with value
    /// - `Ok(None)`: key found but is a tombstone (deleted)
    /// - `Err(NotFound)`: key not in this table
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let offset = *self.index.get(key).ok_or(PageKvError::NotFound)?;
        let (page_no, pos) = locate(offset).ok_or_else(|| {
            PageKvError::Decode(format!("index offset {} is inside a page header", offset))
        })?;
        let page = self.pages.get(page_no).ok_or_else(|| {
            PageKvError::Decode(format!("index offset {} is past the last page", offset))
        })?;
        page.lookup(pos, key)
    }

    /// Iterate over every record, page by page, in key order
    pub fn records(&self) -> impl Iterator<Item = Result<Record>> + '_ {
        self.pages.iter().flat_map(Page::records)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn header(&self) -> TableHeader {
        self.header
    }

    pub fn index(&self) -> &BTreeMap<Vec<u8>, u32> {
        &self.index
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of records across all pages
    pub fn entry_count(&self) -> u64 {
        self.pages.iter().map(|p| p.count() as u64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    /// Smallest key in this table (for range filtering)
    pub fn min_key(&self) -> Option<&[u8]> {
        self.index.keys().next().map(|k| k.as_slice())
    }

    /// Largest key in this table (for range filtering)
    pub fn max_key(&self) -> Option<&[u8]> {
        self.index.keys().next_back().map(|k| k.as_slice())
    }

    /// Quick check if a key might be in this table (range check)
    /// Returns false only if the key is definitely outside [min_key, max_key]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => key >= min && key <= max,
            _ => false,
        }
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.state == TableState::Written {
            return Err(PageKvError::InvalidState {
                expected: TableState::Building,
                actual: self.state,
            });
        }
        Ok(())
    }
}

/// Split an absolute index offset into (page number, data position)
pub(crate) fn locate(offset: u32) -> Option<(usize, u32)> {
    let relative = offset.checked_sub(TABLE_HEADER_SIZE)?;
    let page_no = (relative / PAGE_SIZE) as usize;
    let pos = (relative % PAGE_SIZE).checked_sub(PAGE_HEADER_SIZE)?;
    Some((page_no, pos))
}

//! Page
//!
//! Fixed 4096-byte unit holding a key-sorted run of records.
//!
//! ## Layout
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Header (8 bytes)                                         │
//! │   Count: u32 (4) | Offset: u32 (4)                       │
//! ├──────────────────────────────────────────────────────────┤
//! │ Data (4088 bytes)                                        │
//! │   [KeyLen: u32][ValLen: u32][Key][Value]                 │
//! │   ... repeated in ascending key order ...                │
//! │   (ValLen = u32::MAX means tombstone, no value bytes)    │
//! │   zero padding up to the end of the page                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! `Offset` is page-relative: it starts at 8 (records begin right after the
//! header) and always points one byte past the last written record.

use std::cmp::Ordering;
use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::codec::{decode_u32, encode_u32, U32_SIZE};
use crate::error::{PageKvError, Result};
use crate::record::Record;

// =============================================================================
// Layout Constants
// =============================================================================

/// Total page size on disk and in memory
pub const PAGE_SIZE: u32 = 4096;

/// Header size: Count (4) + Offset (4)
pub const PAGE_HEADER_SIZE: u32 = 8;

/// Bytes available for records
pub const PAGE_DATA_SIZE: u32 = PAGE_SIZE - PAGE_HEADER_SIZE;

/// Width of each record length prefix
pub const LEN_PREFIX_SIZE: u32 = U32_SIZE as u32;

/// Sentinel value length marking a tombstone
pub const TOMBSTONE_MARKER: u32 = u32::MAX;

const RECORD_PREFIX_SIZE: usize = 2 * LEN_PREFIX_SIZE as usize;

// =============================================================================
// Page Header
// =============================================================================

/// Page header: record count and next-write offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    count: u32,
    offset: u32,
}

impl PageHeader {
    pub fn new() -> Self {
        Self {
            count: 0,
            offset: PAGE_HEADER_SIZE,
        }
    }

    /// Number of records appended so far
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Page-relative position of the next free byte
    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl Default for PageHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Page
// =============================================================================

/// A fixed-size page of length-prefixed records
///
/// Records must be appended in non-decreasing key order; [`Page::lookup`]
/// relies on it to stop early.
#[derive(Clone, PartialEq, Eq)]
pub struct Page {
    header: PageHeader,
    data: Box<[u8]>,
}

/// Borrowed view of one encoded record
struct RecordView<'a> {
    key: &'a [u8],
    /// None for a tombstone
    value: Option<&'a [u8]>,
    /// Data position of the following record
    next: usize,
}

impl Page {
    /// Create an empty page
    pub fn new() -> Self {
        Self {
            header: PageHeader::new(),
            data: vec![0u8; PAGE_DATA_SIZE as usize].into_boxed_slice(),
        }
    }

    pub fn header(&self) -> PageHeader {
        self.header
    }

    pub fn count(&self) -> u32 {
        self.header.count
    }

    pub fn is_empty(&self) -> bool {
        self.header.count == 0
    }

    /// Data bytes occupied by records
    pub fn used(&self) -> usize {
        (self.header.offset - PAGE_HEADER_SIZE) as usize
    }

    /// Data bytes still free
    pub fn remaining(&self) -> usize {
        PAGE_DATA_SIZE as usize - self.used()
    }

    /// The written part of the data region
    pub fn data(&self) -> &[u8] {
        &self.data[..self.used()]
    }

    /// Append a record at the current offset
    ///
    /// Fails with `InsufficientSpace` without touching the page when the
    /// encoded record does not fit in the remaining data bytes.
    pub fn append(&mut self, record: &Record) -> Result<()> {
        let required = record.encoded_len();
        let available = self.remaining();
        if required > available {
            return Err(PageKvError::InsufficientSpace {
                required,
                available,
            });
        }

        let key = record.key();
        let value = record.value();
        let value_len = if record.is_deleted() {
            TOMBSTONE_MARKER
        } else {
            value.len() as u32
        };

        let start = self.used();
        let slot = &mut self.data[start..start + required];
        encode_u32(&mut slot[..U32_SIZE], key.len() as u32)?;
        encode_u32(&mut slot[U32_SIZE..RECORD_PREFIX_SIZE], value_len)?;
        let key_end = RECORD_PREFIX_SIZE + key.len();
        slot[RECORD_PREFIX_SIZE..key_end].copy_from_slice(key);
        slot[key_end..].copy_from_slice(value);

        self.header.offset += required as u32;
        self.header.count += 1;
        Ok(())
    }

    /// Scan forward from `start_offset` (a data-region position) for `key`
    ///
    /// Returns:
    /// - `Ok(Some(value))`: key found with value
    /// - `Ok(None)`: key found but is a tombstone
    /// - `Err(NotFound)`: a greater key was reached, or the written data ended
    pub fn lookup(&self, start_offset: u32, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if start_offset >= PAGE_DATA_SIZE {
            return Err(PageKvError::InvalidOffset {
                offset: start_offset,
                limit: PAGE_DATA_SIZE,
            });
        }

        let mut pos = start_offset as usize;
        while pos < self.used() {
            let view = self.decode_at(pos)?;
            match view.key.cmp(key) {
                Ordering::Equal => return Ok(view.value.map(<[u8]>::to_vec)),
                // Sorted: nothing after this can match
                Ordering::Greater => break,
                Ordering::Less => pos = view.next,
            }
        }

        Err(PageKvError::NotFound)
    }

    /// Key of the record starting at data position `pos`
    pub fn key_at(&self, pos: u32) -> Result<&[u8]> {
        Ok(self.decode_at(pos as usize)?.key)
    }

    /// Smallest key on the page
    pub fn first_key(&self) -> Result<Option<&[u8]>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.key_at(0).map(Some)
    }

    /// Largest key on the page (walks every record)
    pub fn last_key(&self) -> Result<Option<&[u8]>> {
        let mut pos = 0;
        let mut last = None;
        while pos < self.used() {
            let view = self.decode_at(pos)?;
            last = Some(view.key);
            pos = view.next;
        }
        Ok(last)
    }

    /// Iterate over the stored records in order
    pub fn records(&self) -> PageRecords<'_> {
        PageRecords {
            page: self,
            pos: 0,
            failed: false,
        }
    }

    /// Serialize to the raw 4096-byte representation (header + data)
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(PAGE_SIZE as usize);
        encode_u32(&mut buf[..U32_SIZE], self.header.count)?;
        encode_u32(&mut buf[U32_SIZE..PAGE_HEADER_SIZE as usize], self.header.offset)?;
        buf[PAGE_HEADER_SIZE as usize..].copy_from_slice(&self.data);
        Ok(buf.freeze())
    }

    /// Parse a raw 4096-byte page, validating header and record layout
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() != PAGE_SIZE as usize {
            return Err(PageKvError::Decode(format!(
                "page must be {} bytes, got {}",
                PAGE_SIZE,
                buf.len()
            )));
        }

        let count = decode_u32(buf)?;
        let offset = decode_u32(&buf[U32_SIZE..])?;
        if !(PAGE_HEADER_SIZE..=PAGE_SIZE).contains(&offset) {
            return Err(PageKvError::Decode(format!(
                "page offset {} outside [{}, {}]",
                offset, PAGE_HEADER_SIZE, PAGE_SIZE
            )));
        }

        let page = Self {
            header: PageHeader { count, offset },
            data: buf[PAGE_HEADER_SIZE as usize..].to_vec().into_boxed_slice(),
        };
        page.validate()?;
        Ok(page)
    }

    /// Walk every record: they must tile the written region exactly, in key
    /// order, and match the header count
    fn validate(&self) -> Result<()> {
        let mut pos = 0;
        let mut seen = 0u32;
        let mut previous: Option<&[u8]> = None;

        while pos < self.used() {
            let view = self.decode_at(pos)?;
            if previous.is_some_and(|prev| prev > view.key) {
                return Err(PageKvError::Decode(format!(
                    "page keys out of order at position {}",
                    pos
                )));
            }
            previous = Some(view.key);
            seen += 1;
            pos = view.next;
        }

        if seen != self.header.count {
            return Err(PageKvError::Decode(format!(
                "page header claims {} records, found {}",
                self.header.count, seen
            )));
        }
        Ok(())
    }

    fn decode_at(&self, pos: usize) -> Result<RecordView<'_>> {
        let end = self.used();
        let data = &self.data[..end];

        let overrun = || {
            PageKvError::Decode(format!(
                "record at position {} overruns written data ({} bytes)",
                pos, end
            ))
        };

        let prefix_end = pos
            .checked_add(RECORD_PREFIX_SIZE)
            .filter(|&e| e <= end)
            .ok_or_else(overrun)?;
        let key_len = decode_u32(&data[pos..])? as usize;
        let raw_value_len = decode_u32(&data[pos + U32_SIZE..])?;

        let (value_len, deleted) = if raw_value_len == TOMBSTONE_MARKER {
            (0, true)
        } else {
            (raw_value_len as usize, false)
        };

        let key_end = prefix_end.checked_add(key_len).ok_or_else(overrun)?;
        let next = key_end
            .checked_add(value_len)
            .filter(|&n| n <= end)
            .ok_or_else(overrun)?;

        Ok(RecordView {
            key: &data[prefix_end..key_end],
            value: (!deleted).then(|| &data[key_end..next]),
            next,
        })
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("header", &self.header)
            .field("used", &self.used())
            .finish()
    }
}

// =============================================================================
// Record Iterator
// =============================================================================

/// Iterator over the records of a page, in stored order
pub struct PageRecords<'a> {
    page: &'a Page,
    pos: usize,
    failed: bool,
}

impl Iterator for PageRecords<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.page.used() {
            return None;
        }

        match self.page.decode_at(self.pos) {
            Ok(view) => {
                self.pos = view.next;
                Some(Ok(match view.value {
                    Some(value) => Record::new(view.key, value),
                    None => Record::tombstone(view.key),
                }))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

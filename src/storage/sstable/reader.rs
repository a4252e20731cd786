//! Sorted Table Reader
//!
//! Loads a table file back into memory and validates every region.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::codec::decode_u32;
use crate::error::{PageKvError, Result};
use crate::storage::page::{Page, PAGE_SIZE};

use super::index::IndexBlock;
use super::{locate, SortedTable, TableHeader, TableState, TABLE_HEADER_SIZE};

impl SortedTable {
    /// Open an existing table file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut table = Self::new(path);
        table.read()?;
        Ok(table)
    }

    /// Populate this (empty) table from its backing file
    ///
    /// The table stays untouched if the file cannot be read or decoded.
    pub fn read(&mut self) -> Result<()> {
        if self.state != TableState::Empty {
            return Err(PageKvError::InvalidState {
                expected: TableState::Empty,
                actual: self.state,
            });
        }

        let raw = {
            let mut file = File::open(&self.path)?;
            let mut raw = Vec::new();
            file.read_to_end(&mut raw)?;
            Bytes::from(raw)
        };

        let (pages, index) = decode_table(&raw)?;

        self.header = TableHeader {
            size: (pages.len() * PAGE_SIZE as usize) as u32,
        };
        self.pages = pages;
        self.index = index;
        self.state = TableState::Written;

        debug!(
            path = %self.path.display(),
            pages = self.pages.len(),
            keys = self.index.len(),
            "sorted table loaded"
        );
        Ok(())
    }
}

fn decode_table(raw: &Bytes) -> Result<(Vec<Page>, BTreeMap<Vec<u8>, u32>)> {
    let header_len = TABLE_HEADER_SIZE as usize;
    let index_offset = decode_u32(raw)? as usize;
    if index_offset < header_len || index_offset > raw.len() {
        return Err(PageKvError::Decode(format!(
            "index offset {} outside file of {} bytes",
            index_offset,
            raw.len()
        )));
    }

    let page_region = raw.slice(header_len..index_offset);
    if page_region.len() % PAGE_SIZE as usize != 0 {
        return Err(PageKvError::Decode(format!(
            "page region of {} bytes is not a whole number of pages",
            page_region.len()
        )));
    }

    let pages = page_region
        .chunks(PAGE_SIZE as usize)
        .map(Page::from_bytes)
        .collect::<Result<Vec<_>>>()?;

    let block = IndexBlock::decode(&raw[index_offset..])?;
    block.verify(&page_region, pages.len())?;

    let mut index = BTreeMap::new();
    for (key, offset) in block.entries {
        let pointed = locate(offset)
            .and_then(|(page_no, pos)| pages.get(page_no).map(|page| page.key_at(pos)));
        match pointed {
            Some(Ok(found)) if found == key.as_slice() => {}
            _ => {
                return Err(PageKvError::Decode(format!(
                    "index entry for {:?} does not point at its record (offset {})",
                    String::from_utf8_lossy(&key),
                    offset
                )))
            }
        }
        index.insert(key, offset);
    }

    Ok((pages, index))
}

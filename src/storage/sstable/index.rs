//! Index region
//!
//! The tail of a sorted table file: every (key, offset) pair plus enough
//! metadata to catch a page region that does not belong to it.

use std::collections::BTreeMap;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::{PageKvError, Result};

/// Serialized form of the index region
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct IndexBlock {
    /// Number of pages between the header and this region
    pub page_count: u32,
    /// CRC32 of the raw page region
    pub pages_crc: u32,
    /// (key, absolute record offset) in key order
    pub entries: Vec<(Vec<u8>, u32)>,
}

impl IndexBlock {
    pub fn build(
        index: &BTreeMap<Vec<u8>, u32>,
        page_region: &[u8],
        page_count: usize,
    ) -> Result<Self> {
        let page_count = u32::try_from(page_count)
            .map_err(|_| PageKvError::Serialization("too many pages".to_string()))?;

        Ok(Self {
            page_count,
            pages_crc: crc32fast::hash(page_region),
            entries: index.iter().map(|(k, &off)| (k.clone(), off)).collect(),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .serialize(self)
            .map_err(|e| PageKvError::Serialization(format!("index region: {}", e)))
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .with_limit(buf.len() as u64)
            .deserialize(buf)
            .map_err(|e| PageKvError::Decode(format!("index region: {}", e)))
    }

    /// Check the region was written for exactly these pages
    pub fn verify(&self, page_region: &[u8], page_count: usize) -> Result<()> {
        if self.page_count as usize != page_count {
            return Err(PageKvError::Decode(format!(
                "index expects {} pages, file holds {}",
                self.page_count, page_count
            )));
        }

        let actual = crc32fast::hash(page_region);
        if actual != self.pages_crc {
            return Err(PageKvError::Decode(format!(
                "page checksum mismatch: expected {:08x}, got {:08x}",
                self.pages_crc, actual
            )));
        }
        Ok(())
    }
}

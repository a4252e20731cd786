//! Sorted Table Writer
//!
//! Serializes a table to its backing file in one shot.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::BytesMut;
use tracing::debug;

use crate::codec::encode_u32;
use crate::error::{PageKvError, Result};

use super::index::IndexBlock;
use super::{SortedTable, TableState, TABLE_HEADER_SIZE};
use crate::storage::page::PAGE_SIZE;

impl SortedTable {
    /// Write the table to its backing file
    ///
    /// The bytes go to `<path>.tmp` first, are fsynced, then renamed over
    /// `path`, so a failed write never leaves a partial table behind.
    /// Creates the file if absent and replaces it if present.
    pub fn write(&mut self) -> Result<()> {
        self.ensure_mutable()?;

        let bytes = self.encode()?;
        let tmp_path = tmp_path(&self.path);

        let persisted =
            write_synced(&tmp_path, &bytes).and_then(|()| fs::rename(&tmp_path, &self.path));
        if let Err(e) = persisted {
            // Cleanup failure is ignored; the write error is returned
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        self.state = TableState::Written;
        debug!(
            path = %self.path.display(),
            pages = self.pages.len(),
            keys = self.index.len(),
            bytes = bytes.len(),
            "sorted table written"
        );
        Ok(())
    }

    /// Assemble `[index offset][pages][index region]`
    fn encode(&self) -> Result<BytesMut> {
        let header_len = TABLE_HEADER_SIZE as usize;
        let pages_len = self.pages.len() * PAGE_SIZE as usize;
        let index_offset = u32::try_from(header_len + pages_len).map_err(|_| {
            PageKvError::Serialization(format!(
                "{} pages overflow the u32 index offset",
                self.pages.len()
            ))
        })?;

        let mut buf = BytesMut::zeroed(header_len);
        encode_u32(&mut buf, index_offset)?;
        buf.reserve(pages_len);
        for page in &self.pages {
            buf.extend_from_slice(&page.to_bytes()?);
        }

        let block = IndexBlock::build(&self.index, &buf[header_len..], self.pages.len())?;
        buf.extend_from_slice(&block.encode()?);
        Ok(buf)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

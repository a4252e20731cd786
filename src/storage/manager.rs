//! Storage Manager
//!
//! Tracks the sorted tables in one directory.
//!
//! ## Responsibilities
//! - Discover existing tables on startup
//! - Search tables newest → oldest for reads
//! - Hand out file names for new tables
//! - Track table lifecycle

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{PageKvError, Result};

use super::SortedTable;

// =============================================================================
// Table Naming
// =============================================================================

/// Naming cursor for new table files: `table_000042.sst`
///
/// `current()` stays stable until `advance()`, so a retried flush
/// overwrites the file its failed attempt was aiming at.
#[derive(Debug, Clone)]
pub struct TablePaths {
    dir: PathBuf,
    next_id: u64,
}

impl TablePaths {
    pub fn new(dir: impl Into<PathBuf>, next_id: u64) -> Self {
        Self {
            dir: dir.into(),
            next_id,
        }
    }

    /// Path for the next table to be written
    pub fn current(&self) -> PathBuf {
        table_path(&self.dir, self.next_id)
    }

    /// Move on after a table was written successfully
    pub fn advance(&mut self) {
        self.next_id += 1;
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// =============================================================================
// Storage Manager
// =============================================================================

/// Manages the persisted tables of one directory
pub struct StorageManager {
    /// Directory where tables are stored
    dir: PathBuf,

    /// Loaded tables, ordered newest → oldest
    tables: Vec<SortedTable>,

    /// Id one past the newest table found on open
    next_table_id: u64,
}

impl StorageManager {
    /// Open or create storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Discover existing table files
    /// 3. Load each one (pages and index into RAM)
    /// 4. Order by id descending (newest first)
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut table_ids: Vec<u64> = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }
            match parse_table_id(&file_path) {
                // Only names this manager would write count as tables
                Some(id) if table_path(path, id) == file_path => table_ids.push(id),
                Some(_) => warn!(
                    path = %file_path.display(),
                    "skipping table file with non-canonical name"
                ),
                None => {}
            }
        }

        // Newest first
        table_ids.sort_unstable_by(|a, b| b.cmp(a));

        let mut tables = Vec::with_capacity(table_ids.len());
        for id in &table_ids {
            let table_path = table_path(path, *id);
            let table = SortedTable::open(&table_path).map_err(|e| match e {
                PageKvError::Decode(msg) => {
                    PageKvError::Decode(format!("{}: {}", table_path.display(), msg))
                }
                other => other,
            })?;
            debug!(id, keys = table.index().len(), "table discovered");
            tables.push(table);
        }

        // Next id = max + 1, or 1 if no tables exist
        let next_table_id = table_ids.first().map(|&id| id + 1).unwrap_or(1);

        info!(
            dir = %path.display(),
            tables = tables.len(),
            next_table_id,
            "storage opened"
        );

        Ok(Self {
            dir: path.to_path_buf(),
            tables,
            next_table_id,
        })
    }

    /// Naming cursor for the write buffer's flushes
    pub fn table_paths(&self) -> TablePaths {
        TablePaths::new(&self.dir, self.next_table_id)
    }

    /// Register a freshly flushed table as the newest one
    pub fn add_table(&mut self, table: SortedTable) {
        self.tables.insert(0, table);
    }

    /// Get a value by key (searches all tables newest → oldest)
    ///
    /// Returns:
    /// - `Ok(Some(value))`: key found with value
    /// - `Ok(None)`: key not found, or found tombstone (deleted)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        for table in &self.tables {
            // Skip table if key is outside its range
            if !table.might_contain(key) {
                continue;
            }

            match table.get(key) {
                Ok(found) => return Ok(found),
                Err(PageKvError::NotFound) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    /// Loaded tables, newest first
    pub fn tables(&self) -> &[SortedTable] {
        &self.tables
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Id the first table written after open will get
    pub fn next_table_id(&self) -> u64 {
        self.next_table_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

fn table_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("table_{:06}.sst", id))
}

/// "table_000042.sst" → Some(42)
fn parse_table_id(path: &Path) -> Option<u64> {
    if path.extension()? != "sst" {
        return None;
    }
    let name = path.file_stem()?.to_string_lossy();
    name.strip_prefix("table_")?.parse().ok()
}

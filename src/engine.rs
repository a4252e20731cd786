//! Engine Module
//!
//! Ties the write buffer and the persisted tables together.
//!
//! ## Responsibilities
//! - Route puts and deletes into the MemTable
//! - Register tables produced by flushes
//! - Answer reads: MemTable first, then tables newest → oldest
//! - Flush remaining records on close

use std::path::Path;

use parking_lot::Mutex;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::memtable::{MemTable, MemTableEntry};
use crate::record::Record;
use crate::storage::{SortedTable, StorageManager};

/// The main storage engine
///
/// ## Concurrency Model: Single Writer
///
/// All operations take the one `state` mutex, so puts, deletes, flushes and
/// reads are serialized. A flush runs under the lock and blocks everyone
/// until the table is on disk.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Write buffer and loaded tables
    state: Mutex<EngineState>,
}

struct EngineState {
    memtable: MemTable,
    storage: StorageManager,
}

impl EngineState {
    fn absorb(&mut self, flushed: Option<SortedTable>) {
        if let Some(table) = flushed {
            self.storage.add_table(table);
        }
    }
}

impl Engine {
    const SSTABLE_DIR: &'static str = "sstables";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Validate config
    /// 2. Load existing tables (creates the directories)
    /// 3. Start with an empty write buffer
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let storage = StorageManager::open(&config.data_dir.join(Self::SSTABLE_DIR))?;
        let memtable = MemTable::new(config.write_buffer_limit, storage.table_paths());

        info!(
            data_dir = %config.data_dir.display(),
            limit = config.write_buffer_limit,
            tables = storage.table_count(),
            "engine opened"
        );

        Ok(Self {
            config,
            state: Mutex::new(EngineState { memtable, storage }),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. Tables (newest to oldest)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let state = self.state.lock();

        if let Some(entry) = state.memtable.get(key) {
            return Ok(match entry {
                MemTableEntry::Value(value) => Some(value),
                MemTableEntry::Tombstone => None,
            });
        }

        state.storage.get(key)
    }

    /// Put a key-value pair
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        let flushed = state.memtable.put(Record::new(key, value))?;
        state.absorb(flushed);
        Ok(())
    }

    /// Delete a key (buffers a tombstone)
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        let flushed = state.memtable.delete(key)?;
        state.absorb(flushed);
        Ok(())
    }

    /// Flush the write buffer regardless of its size
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        let flushed = state.memtable.flush()?;
        state.absorb(flushed);
        Ok(())
    }

    /// Close the engine, persisting anything still buffered
    pub fn close(self) -> Result<()> {
        self.flush()?;
        info!(data_dir = %self.config.data_dir.display(), "engine closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the current write buffer size
    pub fn memtable_size(&self) -> u32 {
        self.state.lock().memtable.size()
    }

    /// Get the write buffer record count
    pub fn memtable_len(&self) -> usize {
        self.state.lock().memtable.len()
    }

    /// Get the number of tables
    pub fn table_count(&self) -> usize {
        self.state.lock().storage.table_count()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

//! Configuration for PageKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{PageKvError, Result};

/// Default write buffer budget before a flush (4 MiB)
pub const DEFAULT_WRITE_BUFFER_LIMIT: u32 = 4096 * 1024;

/// Main configuration for a PageKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── sstables/        (sorted table files)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Write Buffer Configuration
    // -------------------------------------------------------------------------
    /// Cumulative record size (key + value bytes) that triggers a flush
    pub write_buffer_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./pagekv_data"),
            write_buffer_limit: DEFAULT_WRITE_BUFFER_LIMIT,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.write_buffer_limit == 0 {
            return Err(PageKvError::Config(
                "write_buffer_limit must be greater than zero".to_string(),
            ));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(PageKvError::Config("data_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the write buffer limit (in bytes)
    pub fn write_buffer_limit(mut self, limit: u32) -> Self {
        self.config.write_buffer_limit = limit;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

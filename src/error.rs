//! Error types for PageKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::storage::TableState;

/// Result type alias using PageKvError
pub type Result<T> = std::result::Result<T, PageKvError>;

/// Unified error type for PageKV operations
#[derive(Debug, Error)]
pub enum PageKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Page Errors
    // -------------------------------------------------------------------------
    #[error("Invalid offset {offset}: must be below {limit}")]
    InvalidOffset { offset: u32, limit: u32 },

    /// Not fatal: the caller should start a new page.
    #[error("Insufficient space: need {required} bytes, {available} available")]
    InsufficientSpace { required: usize, available: usize },

    #[error("Key not found")]
    NotFound,

    // -------------------------------------------------------------------------
    // Sorted Table Errors
    // -------------------------------------------------------------------------
    #[error("Records out of order: {} after {}", String::from_utf8_lossy(.key), String::from_utf8_lossy(.previous))]
    OutOfOrder { previous: Vec<u8>, key: Vec<u8> },

    #[error("Invalid table state: expected {expected:?}, found {actual:?}")]
    InvalidState {
        expected: TableState,
        actual: TableState,
    },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PageKvError {
    /// Check if the key was simply absent from the scanned scope
    pub fn is_not_found(&self) -> bool {
        matches!(self, PageKvError::NotFound)
    }

    /// Check if retrying the operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, PageKvError::Io(_))
    }

    /// Check if the error indicates corrupted on-disk data
    pub fn is_corruption(&self) -> bool {
        matches!(self, PageKvError::Decode(_))
    }
}

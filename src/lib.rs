//! # PageKV
//!
//! Storage core of a log-structured-merge key-value engine:
//! - Append-only write buffer with a byte budget
//! - Fixed 4 KiB pages of key-sorted, length-prefixed records
//! - One persisted sorted table per flush, with a key → offset index
//! - Single-writer, synchronous, one flush at a time
//!
//! ## Architecture Overview
//!
//! ```text
//!        put / delete                     get
//!             │                            │
//! ┌───────────▼────────────┐               │
//! │        MemTable        │◄──────────────┤ 1. newest write wins
//! │  (Vec<Record>, limit)  │               │
//! └───────────┬────────────┘               │
//!             │ size >= limit              │
//!             ▼                            │
//! ┌────────────────────────┐               │
//! │     Flush pipeline     │               │
//! │ sort → page batches    │               │
//! └───────────┬────────────┘               │
//!             ▼                            │
//! ┌────────────────────────┐               │
//! │      SortedTable       │◄──────────────┘ 2. tables, newest first
//! │  pages + index → file  │
//! └────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod record;
pub mod memtable;
pub mod storage;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PageKvError, Result};
pub use config::Config;
pub use engine::Engine;
pub use record::Record;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of PageKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

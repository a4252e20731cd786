//! Storage Module
//!
//! Persistent storage layer: 4 KiB pages assembled into sorted tables.
//!
//! ## Responsibilities
//! - Pack sorted records into fixed-size pages
//! - Persist pages plus a key → offset index as one table file per flush
//! - Point lookups across tables, newest first
//!
//! ## Table File (V1)
//! ```text
//! ┌────────────────────────────────────────┐
//! │ IndexOffset (u32)                      │
//! ├────────────────────────────────────────┤
//! │ Page 0 (4096)                          │
//! │ ┌────────┬────────┬──────────────────┐ │
//! │ │Count   │Offset  │ Records ...      │ │
//! │ └────────┴────────┴──────────────────┘ │
//! │ ... (repeated for each page)           │
//! ├────────────────────────────────────────┤
//! │ Index                                  │
//! └────────────────────────────────────────┘
//! ```

mod manager;
pub mod page;
mod sstable;

pub use manager::{StorageManager, TablePaths};
pub use page::{Page, PageHeader, PageRecords};
pub use sstable::{SortedTable, TableHeader, TableState, TABLE_HEADER_SIZE};

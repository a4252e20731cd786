//! MemTable Module
//!
//! Size-bounded, append-only write buffer for recent records.
//!
//! ## Responsibilities
//! - Buffer puts and deletes in arrival order
//! - Answer reads newest-write-first
//! - Track size for flush triggers
//! - Drain into a new sorted table when the budget is used up
//!
//! ## Data Structure Choice
//! A plain `Vec<Record>`: appends are O(1) and reads scan backwards, so
//! the most recent write for a key is always seen first. Sorting happens
//! once, at flush time.

mod flush;
mod table;

pub use flush::{partition_into_pages, sorted_run};
pub use table::MemTable;

/// What the write buffer knows about a key
#[derive(Debug, Clone, PartialEq)]
pub enum MemTableEntry {
    /// A live value
    Value(Vec<u8>),

    /// A tombstone (deleted key)
    Tombstone,
}

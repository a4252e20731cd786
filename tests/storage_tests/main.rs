//! Storage layer tests: pages, sorted tables, storage manager

mod sstable_tests;

//! Tests for SortedTable
//!
//! These tests verify:
//! - Page creation and index offsets
//! - Point lookups, tombstones included
//! - The on-disk layout and exact round trip through write/read
//! - Lifecycle: Empty → Building → Written
//! - Corruption detection on read

use std::fs;
use std::path::PathBuf;

use pagekv::storage::page::PAGE_SIZE;
use pagekv::storage::{SortedTable, TableState, TABLE_HEADER_SIZE};
use pagekv::{PageKvError, Record};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_table() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.sst");
    (temp_dir, path)
}

/// Zero-padded keys so lexicographic order matches numeric order
fn numbered(range: std::ops::Range<usize>) -> Vec<Record> {
    range
        .map(|i| Record::new(format!("key{:05}", i), format!("value{}", i)))
        .collect()
}

/// Table with three pages: 0..100, 100..200, 200..300
fn three_page_table(path: &PathBuf) -> (SortedTable, Vec<Record>) {
    let records = numbered(0..300);
    let mut table = SortedTable::new(path);
    for chunk in records.chunks(100) {
        table.create_page(chunk).unwrap();
    }
    (table, records)
}

// =============================================================================
// Building Tests
// =============================================================================

#[test]
fn test_new_table_is_empty() {
    let (_temp, path) = setup_temp_table();
    let table = SortedTable::new(&path);

    assert_eq!(table.state(), TableState::Empty);
    assert_eq!(table.page_count(), 0);
    assert_eq!(table.header().size(), 0);
    assert!(table.is_empty());
    assert_eq!(table.path(), path.as_path());
}

#[test]
fn test_create_page_updates_header_and_state() {
    let (_temp, path) = setup_temp_table();
    let (table, _) = three_page_table(&path);

    assert_eq!(table.state(), TableState::Building);
    assert_eq!(table.page_count(), 3);
    assert_eq!(table.header().size(), 3 * PAGE_SIZE);
    assert_eq!(table.entry_count(), 300);
    assert_eq!(table.index().len(), 300);
}

#[test]
fn test_index_points_at_record_start() {
    let (_temp, path) = setup_temp_table();
    let mut table = SortedTable::new(&path);

    table
        .create_page(&[Record::new("a", "1"), Record::new("b", "22")])
        .unwrap();
    table.create_page(&[Record::new("c", "333")]).unwrap();

    // [index offset (4)][page 0 header (8)]["a": 10 bytes]["b": 11 bytes]
    assert_eq!(table.index()[b"a".as_slice()], 12);
    assert_eq!(table.index()[b"b".as_slice()], 22);
    // Page 1 starts at 4 + 4096, its first record 8 bytes later
    assert_eq!(table.index()[b"c".as_slice()], 4 + 4096 + 8);
}

#[test]
fn test_get_through_index() {
    let (_temp, path) = setup_temp_table();
    let (table, _) = three_page_table(&path);

    assert_eq!(table.get(b"key00000").unwrap(), Some(b"value0".to_vec()));
    assert_eq!(table.get(b"key00150").unwrap(), Some(b"value150".to_vec()));
    assert_eq!(table.get(b"key00299").unwrap(), Some(b"value299".to_vec()));
    assert!(table.get(b"key00300").unwrap_err().is_not_found());
    assert!(table.get(b"nope").unwrap_err().is_not_found());
}

#[test]
fn test_get_tombstone_and_empty_value() {
    let (_temp, path) = setup_temp_table();
    let mut table = SortedTable::new(&path);
    table
        .create_page(&[Record::new("a", ""), Record::tombstone("b")])
        .unwrap();

    assert_eq!(table.get(b"a").unwrap(), Some(Vec::new()));
    assert_eq!(table.get(b"b").unwrap(), None);
}

#[test]
fn test_min_max_and_might_contain() {
    let (_temp, path) = setup_temp_table();
    let (table, _) = three_page_table(&path);

    assert_eq!(table.min_key(), Some(b"key00000".as_slice()));
    assert_eq!(table.max_key(), Some(b"key00299".as_slice()));
    assert!(table.might_contain(b"key00100"));
    assert!(!table.might_contain(b"a"));
    assert!(!table.might_contain(b"z"));
    assert!(!SortedTable::new(&path).might_contain(b"key00100"));
}

#[test]
fn test_create_page_rejects_unsorted_batch() {
    let (_temp, path) = setup_temp_table();
    let mut table = SortedTable::new(&path);

    let err = table
        .create_page(&[Record::new("b", "1"), Record::new("a", "2")])
        .unwrap_err();

    assert!(matches!(err, PageKvError::OutOfOrder { .. }));
    assert_eq!(table.state(), TableState::Empty);
    assert_eq!(table.page_count(), 0);
    assert!(table.index().is_empty());
}

#[test]
fn test_create_page_rejects_key_below_previous_page() {
    let (_temp, path) = setup_temp_table();
    let mut table = SortedTable::new(&path);
    table.create_page(&[Record::new("m", "1")]).unwrap();

    let err = table.create_page(&[Record::new("c", "2")]).unwrap_err();

    assert!(matches!(err, PageKvError::OutOfOrder { .. }));
    assert_eq!(table.page_count(), 1);
    assert_eq!(table.header().size(), PAGE_SIZE);
}

#[test]
fn test_create_page_overflow_leaves_table_unchanged() {
    let (_temp, path) = setup_temp_table();
    let mut table = SortedTable::new(&path);
    let big = vec![b'x'; 3000];

    let err = table
        .create_page(&[Record::new("a", big.clone()), Record::new("b", big)])
        .unwrap_err();

    assert!(matches!(err, PageKvError::InsufficientSpace { .. }));
    assert_eq!(table.page_count(), 0);
    assert!(table.index().is_empty());
}

#[test]
fn test_records_iterates_all_pages_in_order() {
    let (_temp, path) = setup_temp_table();
    let (table, records) = three_page_table(&path);

    let collected: Vec<Record> = table.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(collected, records);
}

// =============================================================================
// Write / Read Tests
// =============================================================================

#[test]
fn test_write_creates_file_with_layout() {
    let (_temp, path) = setup_temp_table();
    let (mut table, _) = three_page_table(&path);

    table.write().unwrap();

    assert_eq!(table.state(), TableState::Written);
    let bytes = fs::read(&path).unwrap();
    let index_offset = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
    assert_eq!(index_offset, TABLE_HEADER_SIZE + 3 * PAGE_SIZE);
    assert!(bytes.len() > index_offset as usize);

    let first_page = &bytes[4..4 + PAGE_SIZE as usize];
    assert_eq!(first_page, &table.pages()[0].to_bytes().unwrap()[..]);
}

#[test]
fn test_write_leaves_no_temp_file() {
    let (temp, path) = setup_temp_table();
    let (mut table, _) = three_page_table(&path);
    table.write().unwrap();

    let names: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("test.sst")]);
}

#[test]
fn test_failed_rename_cleans_up_and_allows_retry() {
    let (temp, path) = setup_temp_table();
    // A non-empty directory at the target makes the final rename fail
    fs::create_dir(&path).unwrap();
    fs::write(path.join("occupant"), b"x").unwrap();

    let (mut table, _) = three_page_table(&path);
    let err = table.write().unwrap_err();

    assert!(matches!(err, PageKvError::Io(_)));
    assert!(!temp.path().join("test.sst.tmp").exists());
    assert!(path.is_dir());
    assert_eq!(table.state(), TableState::Building);

    fs::remove_dir_all(&path).unwrap();
    table.write().unwrap();

    assert_eq!(table.state(), TableState::Written);
    assert_eq!(SortedTable::open(&path).unwrap().page_count(), 3);
}

#[test]
fn test_write_overwrites_existing_file() {
    let (_temp, path) = setup_temp_table();
    fs::write(&path, b"stale garbage that is not a table").unwrap();

    let (mut table, _) = three_page_table(&path);
    table.write().unwrap();

    let loaded = SortedTable::open(&path).unwrap();
    assert_eq!(loaded.page_count(), 3);
}

#[test]
fn test_round_trip() {
    let (_temp, path) = setup_temp_table();
    let mut table = SortedTable::new(&path);
    let records = vec![
        Record::new("apple", "red"),
        Record::new("banana", ""),
        Record::tombstone("cherry"),
        Record::new("date", "brown"),
    ];
    table.create_page(&records[..2]).unwrap();
    table.create_page(&records[2..]).unwrap();
    table.write().unwrap();

    let mut loaded = SortedTable::new(&path);
    loaded.read().unwrap();

    assert_eq!(loaded.state(), TableState::Written);
    assert_eq!(loaded.header(), table.header());
    assert_eq!(loaded.index(), table.index());
    assert_eq!(loaded.pages(), table.pages());
    let collected: Vec<Record> = loaded.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(collected, records);
    assert_eq!(loaded, table);
}

#[test]
fn test_round_trip_lookups_after_open() {
    let (_temp, path) = setup_temp_table();
    let (mut table, records) = three_page_table(&path);
    table.write().unwrap();

    let loaded = SortedTable::open(&path).unwrap();
    for record in &records {
        assert_eq!(loaded.get(record.key()).unwrap(), Some(record.value().to_vec()));
    }
}

#[test]
fn test_empty_table_round_trip() {
    let (_temp, path) = setup_temp_table();
    let mut table = SortedTable::new(&path);
    table.write().unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[0..4], &TABLE_HEADER_SIZE.to_le_bytes());

    let loaded = SortedTable::open(&path).unwrap();
    assert_eq!(loaded.page_count(), 0);
    assert!(loaded.is_empty());
    assert!(loaded.get(b"a").unwrap_err().is_not_found());
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_written_table_is_immutable() {
    let (_temp, path) = setup_temp_table();
    let (mut table, _) = three_page_table(&path);
    table.write().unwrap();

    let err = table.create_page(&[Record::new("zzz", "1")]).unwrap_err();
    assert!(matches!(
        err,
        PageKvError::InvalidState {
            actual: TableState::Written,
            ..
        }
    ));
    assert!(table.write().is_err());
}

#[test]
fn test_loaded_table_is_immutable() {
    let (_temp, path) = setup_temp_table();
    let (mut table, _) = three_page_table(&path);
    table.write().unwrap();

    let mut loaded = SortedTable::open(&path).unwrap();
    assert!(loaded.create_page(&[Record::new("zzz", "1")]).is_err());
    assert!(loaded.read().is_err());
}

#[test]
fn test_read_requires_empty_table() {
    let (_temp, path) = setup_temp_table();
    let (mut table, _) = three_page_table(&path);

    let err = table.read().unwrap_err();
    assert!(matches!(
        err,
        PageKvError::InvalidState {
            expected: TableState::Empty,
            actual: TableState::Building
        }
    ));
}

// =============================================================================
// Error Tests
// =============================================================================

fn written_table() -> (TempDir, PathBuf) {
    let (temp, path) = setup_temp_table();
    let (mut table, _) = three_page_table(&path);
    table.write().unwrap();
    (temp, path)
}

#[test]
fn test_read_missing_file() {
    let (_temp, path) = setup_temp_table();
    let err = SortedTable::open(&path).unwrap_err();
    assert!(matches!(err, PageKvError::Io(_)));
}

#[test]
fn test_read_tiny_file() {
    let (_temp, path) = setup_temp_table();
    fs::write(&path, [1u8, 2]).unwrap();
    assert!(SortedTable::open(&path).unwrap_err().is_corruption());
}

#[test]
fn test_read_index_offset_past_eof() {
    let (_temp, path) = written_table();
    let mut bytes = fs::read(&path).unwrap();
    bytes[0..4].copy_from_slice(&u32::MAX.to_le_bytes());
    fs::write(&path, &bytes).unwrap();

    assert!(SortedTable::open(&path).unwrap_err().is_corruption());
}

#[test]
fn test_read_partial_page_region() {
    let (_temp, path) = written_table();
    let mut bytes = fs::read(&path).unwrap();
    bytes[0..4].copy_from_slice(&(TABLE_HEADER_SIZE + PAGE_SIZE + 100).to_le_bytes());
    fs::write(&path, &bytes).unwrap();

    assert!(SortedTable::open(&path).unwrap_err().is_corruption());
}

#[test]
fn test_read_truncated_index() {
    let (_temp, path) = written_table();
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 10]).unwrap();

    assert!(SortedTable::open(&path).unwrap_err().is_corruption());
}

#[test]
fn test_read_detects_flipped_padding_byte() {
    let (_temp, path) = written_table();
    let mut bytes = fs::read(&path).unwrap();
    // Last byte of page 0: unused padding, so only the checksum can notice
    let pos = TABLE_HEADER_SIZE as usize + PAGE_SIZE as usize - 1;
    bytes[pos] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let err = SortedTable::open(&path).unwrap_err();
    assert!(err.is_corruption());
    assert!(err.to_string().contains("checksum"));
}

#[test]
fn test_read_detects_flipped_key_byte() {
    let (_temp, path) = written_table();
    let mut bytes = fs::read(&path).unwrap();
    // Third key byte of the first record on page 1
    let pos = TABLE_HEADER_SIZE as usize + PAGE_SIZE as usize + 8 + 8 + 2;
    bytes[pos] ^= 0x01;
    fs::write(&path, &bytes).unwrap();

    assert!(SortedTable::open(&path).unwrap_err().is_corruption());
}

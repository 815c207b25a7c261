//! Tests for BlockStore
//!
//! These tests verify:
//! - Opening creates an empty backing file
//! - Whole-block write/read at `block_id * BLOCK_SIZE`
//! - Partial in-block writes
//! - Truncated files are reported as corruption
//! - Truncating the file to a block count

use std::path::PathBuf;

use blocktable::config::SyncStrategy;
use blocktable::storage::{BlockStore, BLOCK_SIZE};
use blocktable::TableError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_file() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("blocks.dat");
    (temp_dir, path)
}

fn filled_block(byte: u8) -> [u8; BLOCK_SIZE] {
    [byte; BLOCK_SIZE]
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_empty_file() {
    let (_temp, path) = setup_temp_file();
    assert!(!path.exists());

    let store = BlockStore::open(&path, SyncStrategy::Flush).unwrap();

    assert!(path.exists());
    assert!(store.is_empty().unwrap());
    assert_eq!(store.blocks_on_disk().unwrap(), 0);
    assert_eq!(store.path(), path.as_path());
}

#[test]
fn test_open_existing_file_keeps_contents() {
    let (_temp, path) = setup_temp_file();

    {
        let mut store = BlockStore::open(&path, SyncStrategy::Flush).unwrap();
        store.write_block(0, &filled_block(7)).unwrap();
    }

    let mut store = BlockStore::open(&path, SyncStrategy::Flush).unwrap();
    assert_eq!(store.len().unwrap(), BLOCK_SIZE as u64);
    assert_eq!(store.read_block(0).unwrap(), filled_block(7));
}

// =============================================================================
// Read/Write Tests
// =============================================================================

#[test]
fn test_write_and_read_blocks_at_their_offsets() {
    let (_temp, path) = setup_temp_file();
    let mut store = BlockStore::open(&path, SyncStrategy::EveryWrite).unwrap();

    store.write_block(0, &filled_block(1)).unwrap();
    store.write_block(1, &filled_block(2)).unwrap();
    store.write_block(2, &filled_block(3)).unwrap();

    assert_eq!(store.blocks_on_disk().unwrap(), 3);
    assert_eq!(store.read_block(1).unwrap(), filled_block(2));
    assert_eq!(store.read_block(2).unwrap(), filled_block(3));

    let raw = std::fs::read(&path).unwrap();
    assert_eq!(raw[BLOCK_SIZE], 2);
    assert_eq!(raw[2 * BLOCK_SIZE - 1], 2);
}

#[test]
fn test_write_at_patches_only_the_range() {
    let (_temp, path) = setup_temp_file();
    let mut store = BlockStore::open(&path, SyncStrategy::Flush).unwrap();

    store.write_block(1, &filled_block(0)).unwrap();
    store.write_at(1, 100, b"hello").unwrap();

    let block = store.read_block(1).unwrap();
    assert_eq!(&block[100..105], b"hello");
    assert_eq!(block[99], 0);
    assert_eq!(block[105], 0);
}

#[test]
fn test_write_at_past_eof_extends_file() {
    let (_temp, path) = setup_temp_file();
    let mut store = BlockStore::open(&path, SyncStrategy::Flush).unwrap();

    store.write_at(2, BLOCK_SIZE - 4, &[9, 9, 9, 9]).unwrap();

    assert_eq!(store.len().unwrap(), 3 * BLOCK_SIZE as u64);
    let block = store.read_block(2).unwrap();
    assert_eq!(&block[BLOCK_SIZE - 4..], &[9, 9, 9, 9]);
    assert_eq!(block[0], 0);
}

#[test]
fn test_write_at_rejects_crossing_block_end() {
    let (_temp, path) = setup_temp_file();
    let mut store = BlockStore::open(&path, SyncStrategy::Flush).unwrap();

    let result = store.write_at(0, BLOCK_SIZE - 2, b"abc");

    assert!(matches!(result, Err(TableError::Validation(_))));
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_read_truncated_block_is_corruption() {
    let (_temp, path) = setup_temp_file();
    std::fs::write(&path, vec![0u8; BLOCK_SIZE + 10]).unwrap();

    let mut store = BlockStore::open(&path, SyncStrategy::Flush).unwrap();

    assert!(store.read_block(0).is_ok());
    assert!(matches!(store.read_block(1), Err(TableError::Corruption(_))));
    assert!(matches!(store.read_block(5), Err(TableError::Corruption(_))));
}

// =============================================================================
// Truncate Tests
// =============================================================================

#[test]
fn test_truncate_blocks() {
    let (_temp, path) = setup_temp_file();
    let mut store = BlockStore::open(&path, SyncStrategy::Flush).unwrap();

    for id in 0..4u32 {
        store.write_block(id, &filled_block(id as u8)).unwrap();
    }
    store.truncate_blocks(2).unwrap();

    assert_eq!(store.blocks_on_disk().unwrap(), 2);
    assert_eq!(store.read_block(1).unwrap(), filled_block(1));
    assert!(store.read_block(2).is_err());
}

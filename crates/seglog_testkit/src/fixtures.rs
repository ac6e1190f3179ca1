//! Test fixtures for stores, indexes and segments.
//!
//! Each fixture lives in its own temporary directory that is removed when
//! the fixture is dropped.

use seglog_storage::{Config, Index, Segment, StorageError, Store};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// File name used for fixture stores.
pub const STORE_FILE: &str = "test.store";

/// File name used for fixture indexes.
pub const INDEX_FILE: &str = "test.index";

/// A temporary directory that opens storage files inside itself.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    /// Creates a new empty temporary directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the path of a file inside the directory.
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Opens the fixture store.
    pub fn store(&self) -> Store {
        Store::open(&self.join(STORE_FILE)).expect("Failed to open store")
    }

    /// Opens the fixture index with the given capacity.
    pub fn index(&self, max_index_bytes: u64) -> Index {
        Index::open(&self.join(INDEX_FILE), max_index_bytes).expect("Failed to open index")
    }

    /// Opens a segment in this directory.
    pub fn segment(&self, base_offset: u64, config: &Config) -> Segment {
        Segment::open(self.path(), base_offset, config).expect("Failed to open segment")
    }

    /// Returns the length of a file inside the directory.
    pub fn file_len(&self, name: &str) -> u64 {
        std::fs::metadata(self.join(name))
            .expect("Failed to stat file")
            .len()
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a test with a store in a temporary directory.
///
/// The store is closed after `f` returns.
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let dir = TestDir::new();
    let store = dir.store();
    let result = f(&store);
    store.close().expect("Failed to close store");
    result
}

/// Runs a test with an index in a temporary directory.
///
/// The index is closed after `f` returns.
pub fn with_temp_index<F, R>(max_index_bytes: u64, f: F) -> R
where
    F: FnOnce(&mut Index) -> R,
{
    let dir = TestDir::new();
    let mut index = dir.index(max_index_bytes);
    let result = f(&mut index);
    index.close().expect("Failed to close index");
    result
}

/// Runs a test with a segment based at the configured initial offset.
pub fn with_temp_segment<F, R>(config: &Config, f: F) -> R
where
    F: FnOnce(&Segment) -> R,
{
    let dir = TestDir::new();
    let segment = dir.segment(config.initial_offset, config);
    let result = f(&segment);
    // The test may already have closed it.
    match segment.close() {
        Ok(()) | Err(StorageError::Closed) => {}
        Err(e) => panic!("Failed to close segment: {e}"),
    }
    result
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Opens a segment and appends `count` records of the form `record-{i}`.
    pub fn populated_segment(dir: &TestDir, config: &Config, count: usize) -> Segment {
        let segment = dir.segment(config.initial_offset, config);
        for i in 0..count {
            segment
                .append(format!("record-{i}").as_bytes())
                .expect("Failed to append record");
        }
        segment
    }
}

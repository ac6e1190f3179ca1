//! A store and its index, kept in step under one lock.

use crate::config::Config;
use crate::encoding::Entry;
use crate::error::{StorageError, StorageResult};
use crate::index::{Index, ReadTarget};
use crate::store::{Frame, Store};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension of a segment's record store.
pub const STORE_EXTENSION: &str = "store";

/// File extension of a segment's offset index.
pub const INDEX_EXTENSION: &str = "index";

/// One segment of a commit log.
///
/// Records get consecutive offsets starting at `base_offset`. Each append
/// writes the record to the store and then the `(relative offset, position)`
/// entry to the index while holding a single lock, so the index never
/// observes a write it did not pair with a record.
///
/// Deciding when to roll over to a new segment is up to the caller;
/// [`Segment::is_maxed`] only reports it.
#[derive(Debug)]
pub struct Segment {
    base_offset: u64,
    config: Config,
    store_path: PathBuf,
    index_path: PathBuf,
    inner: Mutex<Option<SegmentInner>>,
}

#[derive(Debug)]
struct SegmentInner {
    store: Store,
    index: Index,
    /// Relative offset the next record will get. At most `u32::MAX + 1`.
    next_relative: u64,
}

impl Segment {
    /// Opens or creates the segment starting at `base_offset` in `dir`.
    ///
    /// Files are named `{base_offset:020}.store` and `{base_offset:020}.index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or either file
    /// cannot be opened.
    pub fn open(dir: &Path, base_offset: u64, config: &Config) -> StorageResult<Self> {
        config.validate()?;

        let store_path = segment_path(dir, base_offset, STORE_EXTENSION);
        let index_path = segment_path(dir, base_offset, INDEX_EXTENSION);

        let store = Store::open(&store_path)?;
        let index = Index::open(&index_path, config.max_index_bytes)?;

        let next_relative = match index.read(ReadTarget::Last) {
            Ok(entry) => u64::from(entry.relative_offset) + 1,
            Err(StorageError::EndOfStream) => 0,
            Err(e) => return Err(e),
        };

        debug!(base_offset, next_relative, dir = %dir.display(), "segment opened");

        Ok(Self {
            base_offset,
            config: config.clone(),
            store_path,
            index_path,
            inner: Mutex::new(Some(SegmentInner {
                store,
                index,
                next_relative,
            })),
        })
    }

    /// Returns the offset of the first record in this segment.
    #[must_use]
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Returns the offset the next appended record will get.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close, or
    /// [`StorageError::EndOfStream`] if the next offset would not fit in a
    /// `u64`.
    pub fn next_offset(&self) -> StorageResult<u64> {
        let guard = self.inner.lock();
        let inner = guard.as_ref().ok_or(StorageError::Closed)?;
        self.base_offset
            .checked_add(inner.next_relative)
            .ok_or(StorageError::EndOfStream)
    }

    /// Returns the path of the record store.
    #[must_use]
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Returns the path of the offset index.
    #[must_use]
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Appends a record and returns its offset.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EndOfStream`] if the index is full or the
    /// offset space is exhausted; nothing is written in that case. Returns an
    /// I/O error if the store write fails.
    pub fn append(&self, record: &[u8]) -> StorageResult<u64> {
        let mut guard = self.inner.lock();
        let inner = guard.as_mut().ok_or(StorageError::Closed)?;

        if inner.index.is_full() {
            return Err(StorageError::EndOfStream);
        }
        let offset = self
            .base_offset
            .checked_add(inner.next_relative)
            .ok_or(StorageError::EndOfStream)?;
        let relative =
            u32::try_from(inner.next_relative).map_err(|_| StorageError::EndOfStream)?;

        let (_, position) = inner.store.append(record)?;
        inner.index.write(relative, position)?;
        inner.next_relative += 1;

        if inner.index.is_full() {
            debug!(
                base_offset = self.base_offset,
                next_relative = inner.next_relative,
                "segment index full"
            );
        }

        Ok(offset)
    }

    /// Reads the record at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EndOfStream`] if `offset` is not in this
    /// segment.
    pub fn read(&self, offset: u64) -> StorageResult<Vec<u8>> {
        let guard = self.inner.lock();
        let inner = guard.as_ref().ok_or(StorageError::Closed)?;

        let relative = offset
            .checked_sub(self.base_offset)
            .ok_or(StorageError::EndOfStream)?;
        let entry = inner.index.read(ReadTarget::ByIndex(relative))?;

        inner.store.read(entry.position)
    }

    /// Returns `true` once the store reached `max_store_bytes` or the index
    /// cannot take another entry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close.
    pub fn is_maxed(&self) -> StorageResult<bool> {
        let guard = self.inner.lock();
        let inner = guard.as_ref().ok_or(StorageError::Closed)?;
        Ok(inner.store.size()? >= self.config.max_store_bytes || inner.index.is_full())
    }

    /// Returns the current store size in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close.
    pub fn store_size(&self) -> StorageResult<u64> {
        let guard = self.inner.lock();
        let inner = guard.as_ref().ok_or(StorageError::Closed)?;
        inner.store.size()
    }

    /// Returns every index entry written so far.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close.
    pub fn entries(&self) -> StorageResult<Vec<Entry>> {
        let guard = self.inner.lock();
        let inner = guard.as_ref().ok_or(StorageError::Closed)?;
        Ok(inner.index.entries().collect())
    }

    /// Scans the store for every complete record, ignoring the index.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment is closed or a read fails.
    pub fn frames(&self) -> StorageResult<Vec<Frame>> {
        let guard = self.inner.lock();
        let inner = guard.as_ref().ok_or(StorageError::Closed)?;
        inner.store.scan()
    }

    /// Closes the index and the store.
    ///
    /// Both are closed even if the first fails; the first error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] if already closed.
    pub fn close(&self) -> StorageResult<()> {
        let inner = self.inner.lock().take().ok_or(StorageError::Closed)?;

        let index_result = inner.index.close();
        let store_result = inner.store.close();

        debug!(
            base_offset = self.base_offset,
            next_relative = inner.next_relative,
            "segment closed"
        );
        index_result.and(store_result)
    }

    /// Closes the segment if still open and deletes both files.
    ///
    /// # Errors
    ///
    /// Returns an error if closing or deleting fails.
    pub fn remove(self) -> StorageResult<()> {
        match self.close() {
            Ok(()) | Err(StorageError::Closed) => {}
            Err(e) => return Err(e),
        }

        std::fs::remove_file(&self.index_path)?;
        std::fs::remove_file(&self.store_path)?;

        debug!(base_offset = self.base_offset, "segment removed");
        Ok(())
    }
}

fn segment_path(dir: &Path, base_offset: u64, extension: &str) -> PathBuf {
    dir.join(format!("{base_offset:020}.{extension}"))
}

//! Memory-mapped offset index.

use crate::encoding::{Entry, ENTRY_WIDTH};
use crate::error::{StorageError, StorageResult};
use crate::mapped::EntryRegion;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which entry [`Index::read`] should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    /// The entry at this zero-based position.
    ByIndex(u64),
    /// The most recently written entry.
    Last,
}

/// A fixed-capacity index mapping relative offsets to store positions.
///
/// ## On-disk format
///
/// Each entry is exactly 12 bytes:
/// ```text
/// | relative offset: u32 BE | store position: u64 BE |
/// | 4 bytes                 | 8 bytes                |
/// ```
///
/// While open, the file is grown to `max_index_bytes` and mapped in full,
/// because a mapping cannot grow once created. The number of valid bytes is
/// tracked in memory. [`Index::close`] shrinks the file back to exactly the
/// valid entries, so the next [`Index::open`] recovers the entry count from
/// the file length.
///
/// If the process dies before `close`, the file keeps its full length and
/// trailing garbage. Recovering from that is left to the caller.
///
/// ## Ownership
///
/// - The index owns its file and mapping exclusively
/// - No internal locking: writes take `&mut self`, and callers that share an
///   index across threads must serialize access themselves
/// - Offsets are not validated; callers supply them in increasing order
#[derive(Debug)]
pub struct Index {
    path: PathBuf,
    file: File,
    region: EntryRegion,
    /// Bytes of valid entries, always a multiple of `ENTRY_WIDTH`.
    size: u64,
}

impl Index {
    /// Opens or creates an index file at the given path.
    ///
    /// # Errors
    ///
    /// See [`Index::new`].
    pub fn open(path: &Path, max_index_bytes: u64) -> StorageResult<Self> {
        check_capacity(max_index_bytes)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Self::new(file, path, max_index_bytes)
    }

    /// Creates an index over an already open file.
    ///
    /// The current file length becomes the logical size. The file is then
    /// grown to `max_index_bytes` and mapped.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `max_index_bytes` cannot hold a single entry
    /// - The file length is not a whole number of entries, or exceeds
    ///   `max_index_bytes`
    /// - The file cannot be stat'd, resized or mapped
    pub fn new(file: File, path: impl Into<PathBuf>, max_index_bytes: u64) -> StorageResult<Self> {
        check_capacity(max_index_bytes)?;
        let path = path.into();
        let size = file.metadata()?.len();

        if size % ENTRY_WIDTH != 0 {
            return Err(StorageError::Corrupted(format!(
                "index {} has length {size}, not a multiple of {ENTRY_WIDTH}",
                path.display()
            )));
        }
        if size > max_index_bytes {
            return Err(StorageError::Corrupted(format!(
                "index {} has length {size}, larger than max_index_bytes {max_index_bytes}",
                path.display()
            )));
        }

        file.set_len(max_index_bytes)?;
        let region = EntryRegion::map(&file)?;

        debug!(path = %path.display(), size, max_index_bytes, "index opened");

        Ok(Self {
            path,
            file,
            region,
            size,
        })
    }

    /// Returns the entry selected by `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EndOfStream`] if the index is empty or the
    /// requested entry has not been written.
    pub fn read(&self, target: ReadTarget) -> StorageResult<Entry> {
        if self.size == 0 {
            return Err(StorageError::EndOfStream);
        }

        let slot = match target {
            ReadTarget::ByIndex(n) => n,
            ReadTarget::Last => self.size / ENTRY_WIDTH - 1,
        };

        let end = slot
            .checked_mul(ENTRY_WIDTH)
            .and_then(|start| start.checked_add(ENTRY_WIDTH))
            .ok_or(StorageError::EndOfStream)?;
        if end > self.size {
            return Err(StorageError::EndOfStream);
        }

        self.region.read_entry(slot).ok_or(StorageError::EndOfStream)
    }

    /// Appends an entry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EndOfStream`] if the mapped region has no room
    /// for another entry. The owning segment is full at that point.
    pub fn write(&mut self, relative_offset: u32, position: u64) -> StorageResult<()> {
        if self.region.len().saturating_sub(self.size) < ENTRY_WIDTH {
            return Err(StorageError::EndOfStream);
        }

        let slot = self.size / ENTRY_WIDTH;
        if !self.region.write_entry(slot, Entry::new(relative_offset, position)) {
            return Err(StorageError::EndOfStream);
        }
        self.size += ENTRY_WIDTH;

        Ok(())
    }

    /// Iterates over every written entry in order.
    pub fn entries(&self) -> impl Iterator<Item = Entry> + '_ {
        (0..self.len()).filter_map(move |slot| self.region.read_entry(slot))
    }

    /// Returns the number of written entries.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.size / ENTRY_WIDTH
    }

    /// Returns `true` if no entries have been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the logical size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the number of entries the mapped region can hold.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.region.len() / ENTRY_WIDTH
    }

    /// Returns `true` if another [`Index::write`] would fail.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.region.len().saturating_sub(self.size) < ENTRY_WIDTH
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn name(&self) -> &Path {
        &self.path
    }

    /// Writes mapped entries back to the file and syncs it to disk.
    ///
    /// The file keeps its pre-allocated length.
    ///
    /// # Errors
    ///
    /// Returns an error if either sync fails.
    pub fn sync(&self) -> StorageResult<()> {
        self.region.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Syncs the mapping, fsyncs the file, truncates it to the written
    /// entries and closes it.
    ///
    /// # Errors
    ///
    /// Returns an error if a sync or the truncation fails. The file may then
    /// still carry its pre-allocated tail.
    pub fn close(self) -> StorageResult<()> {
        let Self {
            path,
            file,
            region,
            size,
        } = self;

        region.flush()?;
        file.sync_all()?;

        // The mapping must be gone before the file shrinks underneath it.
        drop(region);
        file.set_len(size)?;

        debug!(path = %path.display(), size, "index closed");
        Ok(())
    }
}

fn check_capacity(max_index_bytes: u64) -> StorageResult<()> {
    if max_index_bytes < ENTRY_WIDTH {
        return Err(StorageError::InvalidConfig(format!(
            "max_index_bytes {max_index_bytes} cannot hold a single {ENTRY_WIDTH}-byte entry"
        )));
    }
    Ok(())
}

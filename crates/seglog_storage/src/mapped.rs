//! Bounds-checked view of a memory-mapped index file.

use crate::encoding::{Entry, ENTRY_WIDTH};
use memmap2::MmapMut;
use std::fs::File;
use std::io;
use std::ops::Range;

/// A writable shared mapping addressed in whole entry slots.
///
/// Slot `n` covers bytes `[n * ENTRY_WIDTH, (n + 1) * ENTRY_WIDTH)`. Nothing
/// outside this type touches the mapped bytes directly.
#[derive(Debug)]
pub(crate) struct EntryRegion {
    mmap: MmapMut,
}

impl EntryRegion {
    /// Maps the whole of `file` read/write, shared with the file.
    ///
    /// The mapping length is the file length at the time of the call.
    #[allow(unsafe_code)]
    pub(crate) fn map(file: &File) -> io::Result<Self> {
        // SAFETY: the index owns `file` exclusively and never changes its
        // length while this mapping is alive; `Index::close` drops the
        // region before truncating. Cross-process modification is outside
        // the supported access pattern.
        let mmap = unsafe { MmapMut::map_mut(file)? };
        Ok(Self { mmap })
    }

    /// Mapped length in bytes.
    pub(crate) fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub(crate) fn read_entry(&self, slot: u64) -> Option<Entry> {
        let range = self.slot_range(slot)?;
        let bytes = <&[u8; ENTRY_WIDTH as usize]>::try_from(&self.mmap[range]).ok()?;
        Some(Entry::decode(bytes))
    }

    /// Returns `false` without writing if the slot lies outside the mapping.
    pub(crate) fn write_entry(&mut self, slot: u64, entry: Entry) -> bool {
        let Some(range) = self.slot_range(slot) else {
            return false;
        };
        self.mmap[range].copy_from_slice(&entry.encode());
        true
    }

    /// Synchronously writes dirty pages back to the file.
    pub(crate) fn flush(&self) -> io::Result<()> {
        self.mmap.flush()
    }

    fn slot_range(&self, slot: u64) -> Option<Range<usize>> {
        let start = slot.checked_mul(ENTRY_WIDTH)?;
        let end = start.checked_add(ENTRY_WIDTH)?;
        if end > self.len() {
            return None;
        }
        Some(usize::try_from(start).ok()?..usize::try_from(end).ok()?)
    }
}

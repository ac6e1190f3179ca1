//! On-disk encoding shared by the store and the index.
//!
//! Every integer persisted by this crate is big-endian. The widths below are
//! part of the file format and never change at runtime.

/// Width of the length prefix in front of every store record.
pub const LEN_WIDTH: u64 = 8;

/// Width of the relative offset in an index entry.
pub const OFF_WIDTH: u64 = 4;

/// Width of the store position in an index entry.
pub const POS_WIDTH: u64 = 8;

/// Width of one index entry.
pub const ENTRY_WIDTH: u64 = OFF_WIDTH + POS_WIDTH;

/// A single index entry: a record's relative offset and its store position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entry {
    /// Logical offset of the record relative to the segment base.
    pub relative_offset: u32,
    /// Byte position of the record's length prefix in the store.
    pub position: u64,
}

impl Entry {
    /// Creates a new entry.
    #[must_use]
    pub const fn new(relative_offset: u32, position: u64) -> Self {
        Self {
            relative_offset,
            position,
        }
    }

    /// Encodes the entry as `[u32 BE offset][u64 BE position]`.
    #[must_use]
    pub fn encode(&self) -> [u8; ENTRY_WIDTH as usize] {
        let mut buf = [0u8; ENTRY_WIDTH as usize];
        buf[..OFF_WIDTH as usize].copy_from_slice(&self.relative_offset.to_be_bytes());
        buf[OFF_WIDTH as usize..].copy_from_slice(&self.position.to_be_bytes());
        buf
    }

    /// Decodes an entry previously produced by [`Entry::encode`].
    #[must_use]
    pub fn decode(buf: &[u8; ENTRY_WIDTH as usize]) -> Self {
        let mut off = [0u8; OFF_WIDTH as usize];
        let mut pos = [0u8; POS_WIDTH as usize];
        off.copy_from_slice(&buf[..OFF_WIDTH as usize]);
        pos.copy_from_slice(&buf[OFF_WIDTH as usize..]);
        Self {
            relative_offset: u32::from_be_bytes(off),
            position: u64::from_be_bytes(pos),
        }
    }
}

/// Encodes a record length prefix.
#[must_use]
pub fn encode_len(len: u64) -> [u8; LEN_WIDTH as usize] {
    len.to_be_bytes()
}

/// Decodes a record length prefix.
#[must_use]
pub fn decode_len(buf: [u8; LEN_WIDTH as usize]) -> u64 {
    u64::from_be_bytes(buf)
}

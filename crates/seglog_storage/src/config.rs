//! Segment configuration.

use crate::encoding::ENTRY_WIDTH;
use crate::error::{StorageError, StorageResult};

/// Configuration for opening a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Store size at which the segment reports itself full.
    pub max_store_bytes: u64,

    /// Size the index file is pre-allocated to. Determines how many
    /// entries (`max_index_bytes / 12`) the segment can hold.
    pub max_index_bytes: u64,

    /// Base offset of the first segment of a log.
    pub initial_offset: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_store_bytes: 1024 * 1024, // 1 MB
            max_index_bytes: 1024 * 1024, // 1 MB
            initial_offset: 0,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum store size.
    #[must_use]
    pub const fn max_store_bytes(mut self, size: u64) -> Self {
        self.max_store_bytes = size;
        self
    }

    /// Sets the maximum index size.
    #[must_use]
    pub const fn max_index_bytes(mut self, size: u64) -> Self {
        self.max_index_bytes = size;
        self
    }

    /// Sets the initial offset.
    #[must_use]
    pub const fn initial_offset(mut self, offset: u64) -> Self {
        self.initial_offset = offset;
        self
    }

    /// Checks that the configuration describes a usable segment.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if the index cannot hold one
    /// entry or the store limit is zero.
    pub fn validate(&self) -> StorageResult<()> {
        if self.max_index_bytes < ENTRY_WIDTH {
            return Err(StorageError::InvalidConfig(format!(
                "max_index_bytes must be at least {ENTRY_WIDTH}, got {}",
                self.max_index_bytes
            )));
        }
        if self.max_store_bytes == 0 {
            return Err(StorageError::InvalidConfig(
                "max_store_bytes must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

//! CLI command implementations.

pub mod append;
pub mod dump_store;
pub mod inspect;
pub mod read;

use seglog_storage::{Config, Segment};
use std::path::Path;

/// Opens the segment a command operates on.
pub fn open_segment(
    dir: &Path,
    base_offset: u64,
    max_index_bytes: u64,
) -> Result<Segment, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;
    let config = Config::new().max_index_bytes(max_index_bytes);
    Ok(Segment::open(dir, base_offset, &config)?)
}

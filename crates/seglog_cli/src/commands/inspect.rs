//! Inspect command implementation.

use seglog_storage::{Segment, ENTRY_WIDTH};
use serde::Serialize;

/// Segment inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store file path.
    pub store_path: String,
    /// Index file path.
    pub index_path: String,
    /// Offset of the first record.
    pub base_offset: u64,
    /// Offset the next record will get.
    pub next_offset: u64,
    /// Store size in bytes.
    pub store_size: u64,
    /// Number of index entries.
    pub entry_count: usize,
    /// Index bytes in use.
    pub index_size: u64,
    /// Whether the segment has reached its limits.
    pub maxed: bool,
    /// Index entries (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<EntryInfo>>,
}

/// One index entry for output.
#[derive(Debug, Serialize)]
pub struct EntryInfo {
    /// Absolute record offset.
    pub offset: u64,
    /// Offset relative to the segment base.
    pub relative_offset: u32,
    /// Position of the record in the store.
    pub position: u64,
}

/// Runs the inspect command.
pub fn run(
    segment: &Segment,
    show_entries: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = collect(segment, show_entries)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn collect(
    segment: &Segment,
    show_entries: bool,
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let entries = segment.entries()?;
    let base_offset = segment.base_offset();

    Ok(InspectResult {
        store_path: segment.store_path().display().to_string(),
        index_path: segment.index_path().display().to_string(),
        base_offset,
        next_offset: segment.next_offset()?,
        store_size: segment.store_size()?,
        entry_count: entries.len(),
        index_size: entries.len() as u64 * ENTRY_WIDTH,
        maxed: segment.is_maxed()?,
        entries: show_entries.then(|| {
            entries
                .iter()
                .map(|e| EntryInfo {
                    offset: base_offset + u64::from(e.relative_offset),
                    relative_offset: e.relative_offset,
                    position: e.position,
                })
                .collect()
        }),
    })
}

fn print_text_output(result: &InspectResult) {
    println!("Segment");
    println!("  Store:        {}", result.store_path);
    println!("  Index:        {}", result.index_path);
    println!("  Base offset:  {}", result.base_offset);
    println!("  Next offset:  {}", result.next_offset);
    println!("  Store size:   {} bytes", result.store_size);
    println!("  Entries:      {}", result.entry_count);
    println!("  Index size:   {} bytes", result.index_size);
    println!("  Maxed:        {}", result.maxed);

    if let Some(entries) = &result.entries {
        println!();
        println!("{:>20}  {:>10}  {:>20}", "OFFSET", "RELATIVE", "POSITION");
        for entry in entries {
            println!(
                "{:>20}  {:>10}  {:>20}",
                entry.offset, entry.relative_offset, entry.position
            );
        }
    }
}

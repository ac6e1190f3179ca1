//! Append command implementation.

use seglog_storage::Segment;
use tracing::info;

/// Runs the append command.
pub fn run(segment: &Segment, payload: &str) -> Result<(), Box<dyn std::error::Error>> {
    let offset = match segment.append(payload.as_bytes()) {
        Ok(offset) => offset,
        Err(e) if e.is_end_of_stream() => {
            return Err("Segment is full; start a new segment at the next offset".into());
        }
        Err(e) => return Err(e.into()),
    };

    info!("Appended {} bytes at offset {}", payload.len(), offset);
    println!("{offset}");
    Ok(())
}

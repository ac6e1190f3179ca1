//! Read command implementation.

use seglog_storage::Segment;

/// Runs the read command.
pub fn run(segment: &Segment, offset: u64) -> Result<(), Box<dyn std::error::Error>> {
    let record = match segment.read(offset) {
        Ok(record) => record,
        Err(e) if e.is_end_of_stream() => {
            return Err(format!("No record at offset {offset}").into());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", String::from_utf8_lossy(&record));
    Ok(())
}

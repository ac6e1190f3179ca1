//! Dump store command implementation.

use seglog_storage::{Segment, LEN_WIDTH};
use serde::Serialize;

/// A store record representation for output.
#[derive(Debug, Serialize)]
pub struct FrameInfo {
    /// Position of the length prefix.
    pub position: u64,
    /// Payload length in bytes.
    pub len: usize,
    /// Leading payload bytes, lossily decoded.
    pub preview: String,
}

const PREVIEW_LEN: usize = 32;

/// Runs the dump-store command.
///
/// Walks the store from position 0 without consulting the index.
pub fn run(
    segment: &Segment,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let frames: Vec<FrameInfo> = segment
        .frames()?
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|frame| FrameInfo {
            position: frame.position,
            len: frame.payload.len(),
            preview: String::from_utf8_lossy(
                &frame.payload[..frame.payload.len().min(PREVIEW_LEN)],
            )
            .into_owned(),
        })
        .collect();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&frames)?);
        }
        _ => {
            print_text_output(&frames);
        }
    }

    Ok(())
}

fn print_text_output(frames: &[FrameInfo]) {
    println!("{:>20}  {:>10}  PREVIEW", "POSITION", "LEN");
    for frame in frames {
        println!("{:>20}  {:>10}  {}", frame.position, frame.len, frame.preview);
    }

    let total: u64 = frames.iter().map(|f| LEN_WIDTH + f.len as u64).sum();
    println!();
    println!("{} records, {} bytes", frames.len(), total);
}

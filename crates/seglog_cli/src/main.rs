//! SegLog CLI
//!
//! Command-line tools for inspecting and poking at a single log segment.
//!
//! # Commands
//!
//! - `append` - Append a record
//! - `read` - Print the record at an offset
//! - `inspect` - Display segment offsets, sizes and index entries
//! - `dump-store` - Walk the record store without the index

mod commands;

use clap::{Parser, Subcommand};
use seglog_storage::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SegLog command-line segment tools.
#[derive(Parser)]
#[command(name = "seglog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the segment files
    #[arg(global = true, short, long)]
    dir: Option<PathBuf>,

    /// Base offset of the segment
    #[arg(global = true, short, long, default_value = "0")]
    base_offset: u64,

    /// Index capacity in bytes
    #[arg(global = true, long, default_value_t = Config::default().max_index_bytes)]
    max_index_bytes: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a record
    Append {
        /// Record payload
        payload: String,
    },

    /// Print the record at an offset
    Read {
        /// Absolute record offset
        offset: u64,
    },

    /// Display segment offsets, sizes and index entries
    Inspect {
        /// List every index entry
        #[arg(short, long)]
        entries: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Walk the record store without the index
    DumpStore {
        /// Maximum number of records to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("SegLog CLI v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let dir = cli.dir.ok_or("Segment directory required")?;
    let segment = commands::open_segment(&dir, cli.base_offset, cli.max_index_bytes)?;

    let result = match cli.command {
        Commands::Append { payload } => commands::append::run(&segment, &payload),
        Commands::Read { offset } => commands::read::run(&segment, offset),
        Commands::Inspect { entries, format } => {
            commands::inspect::run(&segment, entries, &format)
        }
        Commands::DumpStore { limit, format } => {
            commands::dump_store::run(&segment, limit, &format)
        }
        Commands::Version => Ok(()),
    };

    // Close even when the command failed so the index is trimmed on disk.
    let closed = segment.close();
    result?;
    closed?;
    Ok(())
}

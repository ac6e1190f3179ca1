//! # SegLog Storage
//!
//! Durable storage core of an append-only commit-log segment.
//!
//! A segment is two files:
//!
//! - A [`Store`] of length-prefixed records, appended through a buffer
//! - An [`Index`] of fixed 12-byte `(relative offset, store position)`
//!   entries in a memory-mapped, pre-allocated file
//!
//! [`Segment`] keeps the two in step under one lock. Rolling over to new
//! segments, replication and crash recovery belong to higher layers.
//!
//! ## Design Principles
//!
//! - Records are opaque bytes; no checksums
//! - All integers on disk are big-endian
//! - Running out of data and running out of index capacity are both
//!   reported as [`StorageError::EndOfStream`]
//! - Synchronous, blocking I/O
//!
//! ## Example
//!
//! ```rust
//! use seglog_storage::{Config, Segment};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let segment = Segment::open(dir.path(), 0, &Config::default()).unwrap();
//!
//! let offset = segment.append(b"hello world").unwrap();
//! assert_eq!(segment.read(offset).unwrap(), b"hello world");
//! segment.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod encoding;
mod error;
mod index;
mod mapped;
mod segment;
mod store;

pub use config::Config;
pub use encoding::{Entry, ENTRY_WIDTH, LEN_WIDTH, OFF_WIDTH, POS_WIDTH};
pub use error::{StorageError, StorageResult};
pub use index::{Index, ReadTarget};
pub use segment::{Segment, INDEX_EXTENSION, STORE_EXTENSION};
pub use store::{Frame, Store, StoreReader};

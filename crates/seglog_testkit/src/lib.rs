//! # SegLog Testkit
//!
//! Test utilities for SegLog.
//!
//! This crate provides:
//! - Temporary-directory fixtures for stores, indexes and segments
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use seglog_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_segment() {
//!     with_temp_segment(&Config::default(), |segment| {
//!         let offset = segment.append(b"record").unwrap();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use seglog_storage::{Config, Entry, Index, ReadTarget, Segment, StorageError, Store};
}

pub use fixtures::*;
pub use generators::*;

//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random records, index entries and
//! operation sequences.

use proptest::prelude::*;
use seglog_storage::Entry;

/// Strategy for generating a record payload (possibly empty).
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Strategy for generating a batch of record payloads.
pub fn payload_batch_strategy(
    min: usize,
    max: usize,
) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(payload_strategy(), min..max)
}

/// Strategy for generating a run of index entries.
///
/// Relative offsets count up from zero and positions strictly increase,
/// as a segment would write them.
pub fn entry_batch_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<Entry>> {
    prop::collection::vec(1u64..4096, min..max).prop_map(|gaps| {
        let mut position = 0u64;
        gaps.into_iter()
            .enumerate()
            .map(|(i, gap)| {
                let entry = Entry::new(i as u32, position);
                position += gap;
                entry
            })
            .collect()
    })
}

/// An operation against a segment.
#[derive(Debug, Clone)]
pub enum SegmentOperation {
    /// Append a record
    Append {
        /// Record payload
        payload: Vec<u8>,
    },
    /// Read back a previously appended record
    Read {
        /// Picks which appended record to read
        pick: prop::sample::Index,
    },
    /// Close and reopen the segment
    Reopen,
}

/// Strategy for generating segment operations.
pub fn segment_operation_strategy() -> impl Strategy<Value = SegmentOperation> {
    prop_oneof![
        4 => payload_strategy().prop_map(|payload| SegmentOperation::Append { payload }),
        3 => any::<prop::sample::Index>().prop_map(|pick| SegmentOperation::Read { pick }),
        1 => Just(SegmentOperation::Reopen),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<SegmentOperation>> {
    prop::collection::vec(segment_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

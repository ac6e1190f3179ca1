//! Property tests for the store, the index and segments built from them.

use proptest::prelude::*;
use seglog_storage::{Config, ReadTarget, StorageError, ENTRY_WIDTH, LEN_WIDTH};
use seglog_testkit::prelude::*;

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn store_reads_back_every_append(payloads in payload_batch_strategy(0, 32)) {
        let dir = TestDir::new();
        let store = dir.store();

        let mut positions = Vec::with_capacity(payloads.len());
        for payload in &payloads {
            let (written, position) = store.append(payload).unwrap();
            prop_assert_eq!(written, LEN_WIDTH + payload.len() as u64);
            positions.push(position);
        }

        for (payload, position) in payloads.iter().zip(&positions) {
            prop_assert_eq!(&store.read(*position).unwrap(), payload);
        }

        let expected: u64 = payloads.iter().map(|p| LEN_WIDTH + p.len() as u64).sum();
        prop_assert_eq!(store.size().unwrap(), expected);

        let frames = store.scan().unwrap();
        prop_assert_eq!(frames.len(), payloads.len());
        for ((frame, payload), position) in frames.iter().zip(&payloads).zip(&positions) {
            prop_assert_eq!(frame.position, *position);
            prop_assert_eq!(&frame.payload, payload);
        }

        store.close().unwrap();
        prop_assert_eq!(dir.file_len(STORE_FILE), expected);
    }

    #[test]
    fn index_reads_back_every_write(entries in entry_batch_strategy(1, 64)) {
        let dir = TestDir::new();
        let mut index = dir.index(ENTRY_WIDTH * 64);

        for entry in &entries {
            index.write(entry.relative_offset, entry.position).unwrap();
        }

        for (i, entry) in entries.iter().enumerate() {
            prop_assert_eq!(index.read(ReadTarget::ByIndex(i as u64)).unwrap(), *entry);
        }
        prop_assert_eq!(index.read(ReadTarget::Last).unwrap(), *entries.last().unwrap());
        prop_assert!(matches!(
            index.read(ReadTarget::ByIndex(entries.len() as u64)),
            Err(StorageError::EndOfStream)
        ));
    }

    #[test]
    fn index_close_leaves_only_written_entries(entries in entry_batch_strategy(0, 32)) {
        let dir = TestDir::new();
        let max_index_bytes = ENTRY_WIDTH * 32;

        let mut index = dir.index(max_index_bytes);
        for entry in &entries {
            index.write(entry.relative_offset, entry.position).unwrap();
        }
        prop_assert_eq!(dir.file_len(INDEX_FILE), max_index_bytes);
        index.close().unwrap();

        prop_assert_eq!(dir.file_len(INDEX_FILE), ENTRY_WIDTH * entries.len() as u64);

        let index = dir.index(max_index_bytes);
        prop_assert_eq!(index.len(), entries.len() as u64);
        prop_assert_eq!(index.entries().collect::<Vec<_>>(), entries);
    }

    #[test]
    fn index_write_fails_exactly_at_capacity(capacity in 1u64..16, slack in 0u64..ENTRY_WIDTH) {
        let dir = TestDir::new();
        let mut index = dir.index(capacity * ENTRY_WIDTH + slack);

        for i in 0..capacity {
            index.write(i as u32, i * 100).unwrap();
        }
        prop_assert!(matches!(
            index.write(capacity as u32, capacity * 100),
            Err(StorageError::EndOfStream)
        ));
        prop_assert_eq!(index.len(), capacity);
    }

    #[test]
    fn segment_matches_model(ops in operation_sequence_strategy(1, 48), base in 0u64..1_000) {
        let dir = TestDir::new();
        let config = Config::default();
        let mut segment = dir.segment(base, &config);
        let mut model: Vec<Vec<u8>> = Vec::new();

        for op in ops {
            match op {
                SegmentOperation::Append { payload } => {
                    let offset = segment.append(&payload).unwrap();
                    prop_assert_eq!(offset, base + model.len() as u64);
                    model.push(payload);
                }
                SegmentOperation::Read { pick } => {
                    if model.is_empty() {
                        prop_assert!(matches!(segment.read(base), Err(StorageError::EndOfStream)));
                    } else {
                        let i = pick.index(model.len());
                        prop_assert_eq!(&segment.read(base + i as u64).unwrap(), &model[i]);
                    }
                }
                SegmentOperation::Reopen => {
                    segment.close().unwrap();
                    segment = dir.segment(base, &config);
                }
            }
            prop_assert_eq!(segment.next_offset().unwrap(), base + model.len() as u64);
        }

        segment.close().unwrap();
    }
}

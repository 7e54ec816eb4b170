//! Unit tests for strata-types

use bytes::Bytes;

use crate::{CommitLog, CommitLogError, Record};

// ============================================================================
// Record
// ============================================================================

#[test]
fn record_new_leaves_offset_unassigned() {
    let record = Record::new("hello world");
    assert_eq!(record.value, Bytes::from("hello world"));
    assert_eq!(record.offset, 0);
}

#[test]
fn record_with_offset() {
    let record = Record::with_offset(vec![0x00, 0x01, 0x02], 42);
    assert_eq!(record.value.as_ref(), &[0x00, 0x01, 0x02]);
    assert_eq!(record.offset, 42);
}

#[test]
fn record_empty_value() {
    let record = Record::new(Bytes::new());
    assert!(record.value.is_empty());
}

#[test]
fn record_serde_roundtrip() {
    let record = Record::with_offset("payload", 7);
    let json = serde_json::to_string(&record).expect("serialize");
    let decoded: Record = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(record, decoded);
}

// ============================================================================
// CommitLogError
// ============================================================================

#[test]
fn error_display_includes_offset() {
    let err = CommitLogError::OffsetOutOfRange { offset: 99 };
    assert_eq!(err.to_string(), "offset out of range: 99");
}

#[test]
fn error_display_storage() {
    assert_eq!(CommitLogError::Storage.to_string(), "storage I/O error");
}

// ============================================================================
// CommitLog seam
// ============================================================================

/// A minimal in-memory implementation, standing in for the engine the way a
/// request handler would use it.
#[derive(Debug, Default)]
struct VecLog {
    records: std::sync::Mutex<Vec<Bytes>>,
}

impl CommitLog for VecLog {
    fn append(&self, record: Record) -> Result<u64, CommitLogError> {
        let mut records = self.records.lock().expect("lock poisoned");
        records.push(record.value);
        Ok(records.len() as u64 - 1)
    }

    fn read(&self, offset: u64) -> Result<Record, CommitLogError> {
        let records = self.records.lock().expect("lock poisoned");
        records
            .get(offset as usize)
            .map(|value| Record::with_offset(value.clone(), offset))
            .ok_or(CommitLogError::OffsetOutOfRange { offset })
    }
}

#[test]
fn commit_log_trait_object_roundtrip() {
    let log: &dyn CommitLog = &VecLog::default();

    let offset = log.append(Record::new("first")).unwrap();
    assert_eq!(offset, 0);

    let record = log.read(0).unwrap();
    assert_eq!(record.value, Bytes::from("first"));
    assert_eq!(record.offset, 0);

    assert_eq!(
        log.read(1),
        Err(CommitLogError::OffsetOutOfRange { offset: 1 })
    );
}

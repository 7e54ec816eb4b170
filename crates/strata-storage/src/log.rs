//! The commit log: an ordered collection of segments.
//!
//! The log owns a directory and routes every operation to the segment that
//! covers the requested offset. Appends always go to the *active* segment —
//! the last one — and roll a fresh segment when it fills up. All other
//! segments are immutable; they leave the log only through truncation or
//! removal.
//!
//! # Concurrency
//!
//! A readers–writer lock guards the segment list: `append` and `truncate`
//! take it exclusively, `read`, `lowest_offset`, `highest_offset`, and
//! `reader` share it. `close`, `remove`, and `reset` consume the log, so the
//! type system rules out use-after-close. Each store additionally serializes
//! its own I/O on an internal mutex.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use bytes::Bytes;

use strata_types::{CommitLog, CommitLogError, Record};

use crate::config::{Config, SegmentConfig};
use crate::reader::LogReader;
use crate::segment::Segment;
use crate::StorageError;

/// Append-only, offset-addressed commit log.
///
/// # Invariants
///
/// - The segment list is sorted by base offset, ranges contiguous:
///   `segments[i + 1].base_offset == segments[i].next_offset` at creation
/// - There is always at least one segment; the last is the active one and
///   the only one that mutates
/// - For every offset in `[lowest_offset, highest_offset]` exactly one
///   segment contains exactly one record
#[derive(Debug)]
pub struct Log {
    dir: PathBuf,
    config: Config,
    segments: RwLock<Vec<Segment>>,
}

impl Log {
    /// Opens the log in `dir`, creating the directory if needed.
    ///
    /// Every `<base>.store` / `<base>.index` pair already present is opened
    /// as a segment, in base-offset order; a clean-closed log reopens with
    /// its exact offset range. An empty directory gets a single segment at
    /// `config.segment.initial_offset`.
    ///
    /// Zero-valued size limits fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory or any segment file
    /// cannot be opened.
    pub fn open(dir: impl Into<PathBuf>, mut config: Config) -> Result<Self, StorageError> {
        if config.segment.max_store_bytes == 0 {
            config.segment.max_store_bytes = SegmentConfig::DEFAULT_MAX_STORE_BYTES;
        }
        if config.segment.max_index_bytes == 0 {
            config.segment.max_index_bytes = SegmentConfig::DEFAULT_MAX_INDEX_BYTES;
        }

        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let segments = Self::setup(&dir, config)?;
        tracing::info!(
            path = %dir.display(),
            segments = segments.len(),
            "opened log"
        );

        Ok(Self {
            dir,
            config,
            segments: RwLock::new(segments),
        })
    }

    /// Scans the directory and opens one segment per distinct base offset.
    ///
    /// Each base offset appears twice on disk (store and index); collecting
    /// into a `BTreeSet` deduplicates the pair and yields ascending order in
    /// one step.
    fn setup(dir: &Path, config: Config) -> Result<Vec<Segment>, StorageError> {
        let mut base_offsets = BTreeSet::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match stem.parse::<u64>() {
                Ok(base_offset) => {
                    base_offsets.insert(base_offset);
                }
                Err(_) => {
                    tracing::warn!(
                        path = %path.display(),
                        "skipping file with non-numeric stem in log directory"
                    );
                }
            }
        }

        let mut segments = Vec::with_capacity(base_offsets.len().max(1));
        for base_offset in base_offsets {
            segments.push(Segment::open(dir, base_offset, config)?);
        }
        if segments.is_empty() {
            segments.push(Segment::open(dir, config.segment.initial_offset, config)?);
        }

        Ok(segments)
    }

    /// Appends a value, returning the offset assigned to it.
    ///
    /// If the active segment is full after the write, the log rolls: a new
    /// segment is created at `offset + 1` and pushed as the new active
    /// segment.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the store, index, or roll fails. A
    /// failed roll does not undo the append; the offset is already assigned.
    pub fn append(&self, value: &[u8]) -> Result<u64, StorageError> {
        let mut segments = self.segments.write().expect("log lock poisoned");
        let active = segments
            .last_mut()
            .expect("log always holds an active segment");

        let offset = active.append(value)?;

        if active.is_maxed() {
            tracing::debug!(base_offset = offset + 1, "active segment full, rolling");
            let segment = Segment::open(&self.dir, offset + 1, self.config)?;
            segments.push(segment);
        }

        Ok(offset)
    }

    /// Reads the value stored at the given offset.
    ///
    /// # Errors
    ///
    /// - [`StorageError::OffsetOutOfRange`] - no segment contains the offset
    /// - [`StorageError::Io`] - the underlying read failed
    pub fn read(&self, offset: u64) -> Result<Bytes, StorageError> {
        let segments = self.segments.read().expect("log lock poisoned");
        let segment = segments
            .iter()
            .find(|s| s.contains(offset))
            .ok_or(StorageError::OffsetOutOfRange { offset })?;

        segment.read(offset)
    }

    /// Base offset of the oldest retained segment.
    pub fn lowest_offset(&self) -> u64 {
        let segments = self.segments.read().expect("log lock poisoned");
        segments
            .first()
            .expect("log always holds an active segment")
            .base_offset()
    }

    /// Offset of the most recently appended record, or 0 when the log has
    /// never held a record.
    pub fn highest_offset(&self) -> u64 {
        let segments = self.segments.read().expect("log lock poisoned");
        let next_offset = segments
            .last()
            .expect("log always holds an active segment")
            .next_offset();
        if next_offset == 0 {
            0
        } else {
            next_offset - 1
        }
    }

    /// Removes every segment whose records all fall below `lowest`.
    ///
    /// Retention truncation: a segment goes when `next_offset < lowest`, so
    /// `truncate(0)` is a no-op. The active segment is always retained, even
    /// when fully below the cut, so the log keeps accepting appends.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if deleting a segment's files fails;
    /// segments already removed stay removed.
    pub fn truncate(&self, lowest: u64) -> Result<(), StorageError> {
        let mut segments = self.segments.write().expect("log lock poisoned");

        // Segments are sorted, so the ones to drop form a prefix.
        let cut = segments
            .iter()
            .take(segments.len() - 1)
            .take_while(|s| s.next_offset() < lowest)
            .count();

        for segment in segments.drain(..cut) {
            tracing::info!(
                base_offset = segment.base_offset(),
                next_offset = segment.next_offset(),
                lowest,
                "removing segment below retention cut"
            );
            segment.remove()?;
        }

        Ok(())
    }

    /// Returns a sequential reader over the raw bytes of the whole log: the
    /// concatenation, in segment order, of each segment's store content.
    ///
    /// The reader snapshots reference-counted store handles under the read
    /// lock and releases it before streaming, so it observes the segment
    /// list as of this call and stays valid across later truncation.
    pub fn reader(&self) -> LogReader {
        let segments = self.segments.read().expect("log lock poisoned");
        LogReader::new(segments.iter().map(Segment::store).collect())
    }

    /// Closes every segment in order.
    ///
    /// Consumes the log: the compiler rules out reads against closed
    /// segments.
    ///
    /// # Errors
    ///
    /// Returns the first close failure; remaining segments are left
    /// unclosed (their files still release on drop).
    pub fn close(self) -> Result<(), StorageError> {
        let segments = self.segments.into_inner().expect("log lock poisoned");
        for segment in segments {
            segment.close()?;
        }
        Ok(())
    }

    /// Closes the log and deletes its directory tree.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if closing or deleting fails.
    pub fn remove(self) -> Result<(), StorageError> {
        let dir = self.dir.clone();
        self.close()?;
        tracing::info!(path = %dir.display(), "removing log");
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    /// Removes the log and reopens it empty, at the configured initial
    /// offset.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if removal or reopening fails.
    pub fn reset(self) -> Result<Self, StorageError> {
        let dir = self.dir.clone();
        let config = self.config;
        self.remove()?;
        Self::open(dir, config)
    }
}

impl CommitLog for Log {
    fn append(&self, record: Record) -> Result<u64, CommitLogError> {
        Log::append(self, &record.value).map_err(|e| {
            tracing::error!(error = %e, "commit log append failed");
            CommitLogError::Storage
        })
    }

    fn read(&self, offset: u64) -> Result<Record, CommitLogError> {
        match Log::read(self, offset) {
            Ok(value) => Ok(Record::with_offset(value, offset)),
            Err(StorageError::OffsetOutOfRange { offset }) => {
                Err(CommitLogError::OffsetOutOfRange { offset })
            }
            Err(e) => {
                tracing::error!(error = %e, offset, "commit log read failed");
                Err(CommitLogError::Storage)
            }
        }
    }
}

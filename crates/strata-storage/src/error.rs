//! Error types for storage operations.

use std::io;

/// Errors that can occur during storage operations.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    /// Filesystem I/O error.
    #[error("filesystem error: {0}")]
    Io(#[from] io::Error),

    /// Read of an empty index, or of an entry past the used prefix.
    #[error("no index entry at the requested position")]
    EndOfIndex,

    /// The index's mapped region is exhausted; the segment must roll.
    #[error("index is full")]
    IndexFull,

    /// The offset is below the lowest retained offset or past the highest
    /// assigned one.
    #[error("offset out of range: {offset}")]
    OffsetOutOfRange {
        /// The offset that was requested.
        offset: u64,
    },

    /// Index read called with an entry index below -1.
    #[error("invalid index entry: {index}")]
    InvalidEntryIndex {
        /// The entry index that was requested.
        index: i64,
    },
}

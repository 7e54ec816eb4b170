//! # strata-types: Core types for Strata
//!
//! This crate contains the types shared between the storage engine and the
//! layers built on top of it:
//! - The logical record ([`Record`])
//! - The commit log capability seam ([`CommitLog`], [`CommitLogError`])
//!
//! Request-handling layers (RPC servers, replication shims) depend on this
//! crate alone; the concrete engine lives in `strata-storage` and implements
//! [`CommitLog`].

use std::fmt::Debug;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

// ============================================================================
// Record - Clone (payload is zero-copy Bytes)
// ============================================================================

/// A single record in the commit log.
///
/// The value is an opaque byte payload; the engine never inspects it. The
/// offset is assigned by the log on append: dense (no gaps) and strictly
/// increasing across the lifetime of the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque record payload (zero-copy `Bytes`).
    pub value: Bytes,
    /// Logical position of the record in the log.
    pub offset: u64,
}

impl Record {
    /// Creates a record carrying the given value.
    ///
    /// The offset field is meaningful only on records returned by a read;
    /// on append the log assigns the offset and returns it.
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self {
            value: value.into(),
            offset: 0,
        }
    }

    /// Creates a record with an already-assigned offset, as returned by reads.
    pub fn with_offset(value: impl Into<Bytes>, offset: u64) -> Self {
        Self {
            value: value.into(),
            offset,
        }
    }
}

// ============================================================================
// Commit log capability seam
// ============================================================================

/// Abstraction over the commit log for upstream request handlers.
///
/// This trait is the narrow seam between the storage engine and the layers
/// that expose it over the wire. Handlers program against `{append, read}`
/// and never see segments, stores, or indexes.
///
/// # Implementation Notes
///
/// Implementations block until the operation completes; there is no
/// cancellation within the engine. A single log accepts concurrent callers:
/// appends serialize against each other, reads proceed in parallel.
pub trait CommitLog: Send + Sync + Debug {
    /// Appends a record, returning the offset the log assigned to it.
    ///
    /// # Errors
    ///
    /// * [`CommitLogError::Storage`] - the underlying write failed
    fn append(&self, record: Record) -> Result<u64, CommitLogError>;

    /// Reads the record stored at the given offset.
    ///
    /// # Errors
    ///
    /// * [`CommitLogError::OffsetOutOfRange`] - no record holds this offset
    /// * [`CommitLogError::Storage`] - the underlying read failed
    fn read(&self, offset: u64) -> Result<Record, CommitLogError>;
}

/// Error returned by [`CommitLog`] operations.
///
/// Deliberately coarse: upstream handlers only branch on "retry with a
/// different offset" versus "give up". Specific underlying errors are
/// logged by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitLogError {
    /// The requested offset is below the lowest retained offset or past the
    /// highest assigned one.
    OffsetOutOfRange {
        /// The offset that was requested.
        offset: u64,
    },
    /// Storage I/O error.
    Storage,
}

impl std::fmt::Display for CommitLogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OffsetOutOfRange { offset } => {
                write!(f, "offset out of range: {offset}")
            }
            Self::Storage => write!(f, "storage I/O error"),
        }
    }
}

impl std::error::Error for CommitLogError {}

#[cfg(test)]
mod tests;

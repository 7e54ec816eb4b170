//! Log configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a [`Log`](crate::Log).
///
/// Nested so that callers embedding the engine can splice the segment knobs
/// into their own configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Segment sizing and placement.
    pub segment: SegmentConfig,
}

/// Sizing knobs for individual segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Roll threshold for a segment's store file, in bytes.
    pub max_store_bytes: u64,

    /// Capacity of a segment's index file, in bytes. Index files are
    /// pre-allocated to this size while open. Should be a multiple of the
    /// 12-byte entry width for full utilization.
    pub max_index_bytes: u64,

    /// Base offset of the very first segment when opening an empty
    /// directory.
    pub initial_offset: u64,
}

impl SegmentConfig {
    /// Default store roll threshold.
    pub const DEFAULT_MAX_STORE_BYTES: u64 = 1024;

    /// Default index capacity.
    pub const DEFAULT_MAX_INDEX_BYTES: u64 = 1024;
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_store_bytes: Self::DEFAULT_MAX_STORE_BYTES,
            max_index_bytes: Self::DEFAULT_MAX_INDEX_BYTES,
            initial_offset: 0,
        }
    }
}

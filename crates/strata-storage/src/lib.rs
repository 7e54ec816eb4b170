//! strata-storage: Append-only segment storage for Strata
//!
//! This crate implements the commit log storage engine. Records are opaque
//! byte payloads stored in fixed-size segments; each record receives a dense,
//! strictly increasing 64-bit offset on append and is retrievable by that
//! offset.
//!
//! # Record Format
//!
//! Each record is stored in a segment's store file as a length-prefixed
//! frame:
//!
//! ```text
//! [length:u64][payload:bytes]
//!     8B         variable
//! ```
//!
//! A companion index file maps the record's offset (relative to the
//! segment's base) to the frame's byte position:
//!
//! ```text
//! [relative offset:u32][store position:u64]
//!         4B                  8B
//! ```
//!
//! All multi-byte integers are big-endian.
//!
//! # File Layout
//!
//! ```text
//! {dir}/
//!   0.store      <- frames for offsets [0, 3)
//!   0.index      <- index entries for offsets [0, 3)
//!   3.store      <- frames for offsets [3, ...)
//!   3.index
//! ```
//!
//! Segment files are named by the segment's base offset. The last segment is
//! the active one; all others are immutable. When the active segment fills
//! up (store bytes or index entries), the log rolls: a new segment is created
//! at the next offset and becomes active.
//!
//! # Example
//!
//! ```ignore
//! use strata_storage::{Config, Log};
//!
//! let log = Log::open("/data/strata", Config::default())?;
//!
//! let offset = log.append(b"event payload")?;
//! let value = log.read(offset)?;
//!
//! log.close()?;
//! ```

// Modules
mod config;
mod error;
mod index;
mod log;
mod reader;
mod segment;
mod store;

// Re-exports
pub use config::{Config, SegmentConfig};
pub use error::StorageError;
pub use log::Log;
pub use reader::LogReader;

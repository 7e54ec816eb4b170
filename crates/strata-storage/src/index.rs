//! Offset index for O(1) record lookups within a segment.
//!
//! The index maps a record's offset relative to the segment base to the byte
//! position of its frame in the companion store. Entries are fixed-width, so
//! random access is pure arithmetic:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Field            │  Size  │  Encoding       │
//! ├──────────────────────────────────────────────┤
//! │  relative offset  │  4     │  u32 BE         │
//! │  store position   │  8     │  u64 BE         │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The file is grown to its full configured capacity at open and memory-
//! mapped read/write shared, so writes proceed without remapping; the used
//! prefix is tracked separately and the file is trimmed back down on clean
//! close.

use std::fs::File;

use memmap2::MmapMut;

use crate::StorageError;

// ============================================================================
// Entry layout constants
// ============================================================================

/// Width of the relative-offset field.
const OFFSET_WIDTH: u64 = 4;

/// Width of the store-position field.
const POSITION_WIDTH: u64 = 8;

/// Total width of one index entry.
pub(crate) const ENTRY_WIDTH: u64 = OFFSET_WIDTH + POSITION_WIDTH;

/// Memory-mapped offset → store position index for one segment.
///
/// Not internally synchronized: the owning segment (and hence the log lock)
/// serializes access.
///
/// # Invariants
///
/// - `used` is always a multiple of [`ENTRY_WIDTH`]
/// - entries `[0, used / ENTRY_WIDTH)` are fully written; the tail of the
///   mapping up to capacity is pre-allocated zeroes
#[derive(Debug)]
pub(crate) struct Index {
    file: File,
    mmap: MmapMut,
    used: u64,
}

impl Index {
    /// Opens an index over the given file, growing it to `max_index_bytes`.
    ///
    /// The file's length *before* growing is the authoritative used size —
    /// the number of live entries times [`ENTRY_WIDTH`]. A file left grown
    /// by a crash reopens with `used` equal to the full capacity, making the
    /// zeroed tail visible as (0, 0) entries: only a clean [`Index::close`]
    /// trims the file, and callers needing durability must close cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the stat, grow, or mapping fails.
    pub fn open(file: File, max_index_bytes: u64) -> Result<Self, StorageError> {
        let used = file.metadata()?.len();
        file.set_len(max_index_bytes)?;

        // SAFETY: the segment owns this file exclusively for the lifetime of
        // the mapping; the data directory must not be modified by other
        // processes while the log is open.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self { file, mmap, used })
    }

    /// Appends an entry mapping `relative_offset` to `store_position`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexFull`] when the mapped region has no
    /// room for another entry; the segment is full and the log must roll.
    pub fn write(&mut self, relative_offset: u32, store_position: u64) -> Result<(), StorageError> {
        if self.used + ENTRY_WIDTH > self.mmap.len() as u64 {
            return Err(StorageError::IndexFull);
        }

        let at = self.used as usize;
        let offset_end = at + OFFSET_WIDTH as usize;
        let entry_end = at + ENTRY_WIDTH as usize;

        self.mmap[at..offset_end].copy_from_slice(&relative_offset.to_be_bytes());
        self.mmap[offset_end..entry_end].copy_from_slice(&store_position.to_be_bytes());
        self.used += ENTRY_WIDTH;

        Ok(())
    }

    /// Reads the entry at index `n`, or the last entry when `n == -1`.
    ///
    /// Returns `(relative_offset, store_position)`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::EndOfIndex`] - the index is empty, or `n` addresses
    ///   an entry past the used prefix
    /// - [`StorageError::InvalidEntryIndex`] - `n < -1`
    pub fn read(&self, n: i64) -> Result<(u32, u64), StorageError> {
        if self.used == 0 {
            return Err(StorageError::EndOfIndex);
        }

        let entry = match n {
            -1 => self.used / ENTRY_WIDTH - 1,
            n if n >= 0 => n as u64,
            _ => return Err(StorageError::InvalidEntryIndex { index: n }),
        };

        let at = entry * ENTRY_WIDTH;
        if at + ENTRY_WIDTH > self.used {
            return Err(StorageError::EndOfIndex);
        }

        let at = at as usize;
        let offset_end = at + OFFSET_WIDTH as usize;
        let entry_end = at + ENTRY_WIDTH as usize;

        let relative_offset = u32::from_be_bytes(
            self.mmap[at..offset_end]
                .try_into()
                .expect("slice length equals OFFSET_WIDTH after bounds check"),
        );
        let store_position = u64::from_be_bytes(
            self.mmap[offset_end..entry_end]
                .try_into()
                .expect("slice length equals POSITION_WIDTH after bounds check"),
        );

        Ok((relative_offset, store_position))
    }

    /// Used prefix in bytes: live entries times [`ENTRY_WIDTH`].
    pub fn used(&self) -> u64 {
        self.used
    }

    /// Closes the index, trimming the pre-allocated tail.
    ///
    /// The order is load-bearing: sync the mapping to the file, sync the
    /// file to stable storage, unmap, then truncate to the used size. The
    /// mapping must not outlive the truncated region.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if any step fails; earlier steps are not
    /// rolled back.
    pub fn close(self) -> Result<(), StorageError> {
        let Self { file, mmap, used } = self;

        mmap.flush()?;
        file.sync_all()?;
        drop(mmap);
        file.set_len(used)?;

        Ok(())
    }
}

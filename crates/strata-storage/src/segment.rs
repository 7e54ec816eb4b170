//! Segment: one (store, index) pair under a shared base offset.
//!
//! A segment owns a contiguous offset range `[base_offset, next_offset)` and
//! the two files backing it, `<base>.store` and `<base>.index`. It assigns
//! offsets within the range, translates absolute offsets to store positions
//! via the index, and reports when it is full so the log can roll.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;

use crate::config::Config;
use crate::index::{Index, ENTRY_WIDTH};
use crate::store::Store;
use crate::StorageError;

const STORE_EXT: &str = "store";
const INDEX_EXT: &str = "index";

/// A contiguous slice of the log: one store and one index sharing a base
/// offset.
///
/// Index entries hold the offset *relative* to the base as a u32, so a
/// single segment can address at most 2^32 records; `is_maxed` bounds the
/// entry count far below that for any practical index capacity.
#[derive(Debug)]
pub(crate) struct Segment {
    store: Arc<Store>,
    index: Index,
    base_offset: u64,
    next_offset: u64,
    store_path: PathBuf,
    index_path: PathBuf,
    config: Config,
}

impl Segment {
    /// Opens or creates the segment with the given base offset.
    ///
    /// `next_offset` is recovered from the last index entry: an empty index
    /// means the segment holds no records yet and the next append receives
    /// the base offset itself.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if either file cannot be opened, grown,
    /// or mapped.
    pub fn open(dir: &Path, base_offset: u64, config: Config) -> Result<Self, StorageError> {
        let store_path = dir.join(format!("{base_offset}.{STORE_EXT}"));
        let store_file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&store_path)?;
        let store = Arc::new(Store::open(store_file)?);

        let index_path = dir.join(format!("{base_offset}.{INDEX_EXT}"));
        let index_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&index_path)?;
        let index = Index::open(index_file, config.segment.max_index_bytes)?;

        let next_offset = match index.read(-1) {
            Ok((relative_offset, _)) => base_offset + u64::from(relative_offset) + 1,
            Err(StorageError::EndOfIndex) => base_offset,
            Err(e) => return Err(e),
        };

        Ok(Self {
            store,
            index,
            base_offset,
            next_offset,
            store_path,
            index_path,
            config,
        })
    }

    /// Appends a value, returning the offset assigned to it.
    ///
    /// Writes the frame to the store, then the index entry pointing at it.
    /// A failure between the two writes leaves an orphan frame that the
    /// index never references; the offset is not consumed.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Io`] - the store write failed
    /// - [`StorageError::IndexFull`] - the index has no room; the caller
    ///   should have rolled already
    pub fn append(&mut self, value: &[u8]) -> Result<u64, StorageError> {
        let offset = self.next_offset;

        let (_, position) = self.store.append(value)?;
        self.index
            .write((offset - self.base_offset) as u32, position)?;
        self.next_offset += 1;

        Ok(offset)
    }

    /// Reads the value stored at the given absolute offset.
    ///
    /// # Errors
    ///
    /// - [`StorageError::EndOfIndex`] - the offset is past the last record
    /// - [`StorageError::Io`] - the store read failed
    pub fn read(&self, offset: u64) -> Result<Bytes, StorageError> {
        debug_assert!(
            offset >= self.base_offset,
            "offset {offset} below segment base {}",
            self.base_offset
        );

        let relative = offset - self.base_offset;
        let (entry_offset, position) = self.index.read(relative as i64)?;

        debug_assert_eq!(
            u64::from(entry_offset),
            relative,
            "index entry does not match requested offset"
        );

        self.store.read(position)
    }

    /// True when the segment can no longer accept an append: the store has
    /// reached its byte budget or the index has no room for another entry.
    pub fn is_maxed(&self) -> bool {
        self.store.size() >= self.config.segment.max_store_bytes
            || self.index.used() + ENTRY_WIDTH > self.config.segment.max_index_bytes
    }

    /// True when `offset` falls inside this segment's range.
    pub fn contains(&self, offset: u64) -> bool {
        self.base_offset <= offset && offset < self.next_offset
    }

    /// Offset of the first record this segment stores.
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Offset the next appended record would receive.
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Hands out a reference-counted handle to the store, for sequential
    /// readers that must survive segment removal.
    pub fn store(&self) -> Arc<Store> {
        Arc::clone(&self.store)
    }

    /// Closes the index (trimming its pre-allocated tail) and then the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns the first failure; later steps are skipped.
    pub fn close(self) -> Result<(), StorageError> {
        self.index.close()?;
        self.store.close()?;
        Ok(())
    }

    /// Closes the segment and deletes both backing files.
    ///
    /// Outstanding store handles keep reading the unlinked file until they
    /// drop.
    ///
    /// # Errors
    ///
    /// Returns the first failure; files already removed stay removed.
    pub fn remove(self) -> Result<(), StorageError> {
        let store_path = self.store_path.clone();
        let index_path = self.index_path.clone();

        self.close()?;
        fs::remove_file(&index_path)?;
        fs::remove_file(&store_path)?;

        Ok(())
    }
}

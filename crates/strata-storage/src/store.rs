//! Byte-level append-only store.
//!
//! The store is a flat file of length-prefixed record frames:
//!
//! ```text
//! [length:u64][payload:bytes][length:u64][payload:bytes]...
//! ```
//!
//! Frames are laid out contiguously from byte 0; byte positions handed back
//! by [`Store::append`] address the start of a frame. The store knows nothing
//! about offsets — that translation lives in the index.
//!
//! Writes go through a buffered writer, so any positional read must flush
//! first to keep read-your-writes: the logical size counter can run ahead of
//! what the OS file contains.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::os::unix::fs::FileExt;
use std::sync::Mutex;

use bytes::Bytes;

use crate::StorageError;

/// Width of the length prefix on every frame.
pub(crate) const LEN_WIDTH: u64 = 8;

/// Append-only file of length-prefixed record frames.
///
/// All operations serialize on a single mutex: the writer and readers do not
/// run in parallel within one store. Stores are shared by reference counting
/// so sequential log readers stay valid across truncation.
#[derive(Debug)]
pub(crate) struct Store {
    inner: Mutex<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    /// Read handle; positional reads leave the append position untouched.
    file: File,
    /// Buffered write handle over a duplicate of `file`, opened in append
    /// mode so every flush lands at the end.
    writer: BufWriter<File>,
    /// Logical size: file length plus any bytes still sitting in the
    /// writer's buffer.
    size: u64,
}

impl Store {
    /// Wraps an open store file, initializing the size counter from the
    /// file's current length so appends to a reopened store continue where
    /// the previous process stopped.
    pub fn open(file: File) -> Result<Self, StorageError> {
        let size = file.metadata()?.len();
        let writer = BufWriter::new(file.try_clone()?);
        Ok(Self {
            inner: Mutex::new(StoreInner { file, writer, size }),
        })
    }

    /// Appends a value as a length-prefixed frame.
    ///
    /// Returns `(bytes_written, start_position)`: the frame width (payload
    /// length plus the 8-byte prefix) and the byte position the frame starts
    /// at, which the caller hands to the index.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the underlying write fails.
    pub fn append(&self, value: &[u8]) -> Result<(u64, u64), StorageError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");

        let position = inner.size;
        inner.writer.write_all(&(value.len() as u64).to_be_bytes())?;
        inner.writer.write_all(value)?;

        let written = LEN_WIDTH + value.len() as u64;
        inner.size += written;

        Ok((written, position))
    }

    /// Reads the frame starting at the given byte position.
    ///
    /// Flushes buffered writes first, then reads the 8-byte length and the
    /// payload it announces.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if either positional read fails,
    /// including reads past the end of the store.
    pub fn read(&self, position: u64) -> Result<Bytes, StorageError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.writer.flush()?;

        let mut len_buf = [0u8; LEN_WIDTH as usize];
        inner.file.read_exact_at(&mut len_buf, position)?;
        let length = u64::from_be_bytes(len_buf);

        let mut value = vec![0u8; length as usize];
        inner.file.read_exact_at(&mut value, position + LEN_WIDTH)?;

        Ok(Bytes::from(value))
    }

    /// Positional read into a caller buffer.
    ///
    /// Flushes buffered writes first. Returns the number of bytes read,
    /// which is 0 at or past the end of the store — the contract the
    /// sequential log reader advances on.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the flush or read fails.
    pub fn read_at(&self, buf: &mut [u8], position: u64) -> Result<usize, StorageError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.writer.flush()?;

        Ok(inner.file.read_at(buf, position)?)
    }

    /// Current logical size in bytes, including buffered writes.
    pub fn size(&self) -> u64 {
        self.inner.lock().expect("store mutex poisoned").size
    }

    /// Flushes buffered writes and syncs the file to stable storage.
    ///
    /// The file handle itself is released when the last owner drops, so an
    /// outstanding sequential reader keeps working after close.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the flush or sync fails.
    pub fn close(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.writer.flush()?;
        inner.file.sync_all()?;
        Ok(())
    }
}

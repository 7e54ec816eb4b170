//! Sequential reader over the whole log.
//!
//! [`LogReader`] streams the raw store bytes of every segment, in segment
//! order, with no gap and no overlap at the boundaries. It exists for bulk
//! consumers — snapshotting a log for backup or feeding a replica — that
//! want the on-disk frames rather than decoded records.

use std::io::{self, Read};
use std::sync::Arc;

use crate::store::Store;

/// `std::io::Read` over the concatenated store contents of a log.
///
/// Holds reference-counted store handles snapshotted at creation, so the
/// stream observes a consistent segment list even if the log truncates or
/// rolls while streaming: removed stores stay readable until the last
/// handle drops.
#[derive(Debug)]
pub struct LogReader {
    readers: Vec<StoreReader>,
    current: usize,
}

impl LogReader {
    pub(crate) fn new(stores: Vec<Arc<Store>>) -> Self {
        Self {
            readers: stores.into_iter().map(StoreReader::new).collect(),
            current: 0,
        }
    }
}

impl Read for LogReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while let Some(reader) = self.readers.get_mut(self.current) {
            let n = reader.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            // This store is drained; move to the next segment's store.
            self.current += 1;
        }
        Ok(0)
    }
}

/// Cursor over a single store, advanced by the bytes each positional read
/// returns.
#[derive(Debug)]
struct StoreReader {
    store: Arc<Store>,
    position: u64,
}

impl StoreReader {
    fn new(store: Arc<Store>) -> Self {
        Self { store, position: 0 }
    }
}

impl Read for StoreReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self
            .store
            .read_at(buf, self.position)
            .map_err(io::Error::other)?;
        self.position += n as u64;
        Ok(n)
    }
}

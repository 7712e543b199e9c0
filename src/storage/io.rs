//! Backing storage for heap files.
//!
//! This module provides the `Storage` trait for page-window I/O, along with
//! MemoryStorage and FileStorage implementations.

mod file;
mod memory;

#[cfg(test)]
mod failing;

#[cfg(test)]
pub(crate) use failing::FailingStorage;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::future::Future;
use std::path::Path;

use crate::storage::error::StorageError;

/// Byte-addressed backing storage read and written in page-sized windows.
///
/// Page `n` occupies bytes `[n * PAGE_SIZE, (n + 1) * PAGE_SIZE)`. The
/// storage may be longer than a whole number of pages; a trailing partial
/// window is not a page.
///
/// Implementations must be thread-safe (Sync + Send). Locking of pages is
/// the page cache's business; this trait handles only raw I/O.
pub trait Storage: Send + Sync {
    /// Returns the canonical path identifying this storage.
    fn path(&self) -> &Path;

    /// Reads page `page_num` into a caller-provided buffer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::PageNotFound` if the window lies past the end.
    /// Returns `StorageError::InvalidBufferSize` if `buf.len() != PAGE_SIZE`.
    fn read_page(
        &self,
        page_num: u64,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Writes page `page_num` from a caller-provided buffer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::PageNotFound` if the page has not been allocated.
    /// Returns `StorageError::InvalidBufferSize` if `buf.len() != PAGE_SIZE`.
    fn write_page(
        &self,
        page_num: u64,
        buf: &[u8],
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Appends a zeroed page and returns its page number.
    ///
    /// The first call on an empty storage returns 0.
    fn allocate_page(&self) -> impl Future<Output = Result<u64, StorageError>> + Send;

    /// Returns the current length of the storage in bytes.
    fn byte_len(&self) -> impl Future<Output = Result<u64, StorageError>> + Send;

    /// Syncs all pending writes to physical disk (fsync).
    ///
    /// For io::MemoryStorage, this is a no-op.
    fn sync_all(&self) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Checks that a caller-provided page buffer is exactly one page long.
fn check_page_buf(len: usize) -> Result<(), StorageError> {
    use crate::storage::page::PAGE_SIZE;

    if len != PAGE_SIZE {
        return Err(StorageError::InvalidBufferSize {
            expected: PAGE_SIZE,
            actual: len,
        });
    }
    Ok(())
}

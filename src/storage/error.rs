//! Storage layer errors.

use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Page not found in storage.
    ///
    /// This occurs when attempting to read or write a page past the end of
    /// the storage. Use `allocate_page` to grow it.
    #[error("page {page_num} not found ({page_count} pages allocated)")]
    PageNotFound { page_num: u64, page_count: u64 },

    /// Invalid buffer size provided to read_page or write_page.
    ///
    /// Buffers must be exactly PAGE_SIZE bytes.
    #[error("invalid buffer size: expected {expected}, got {actual}")]
    InvalidBufferSize {
        /// Expected buffer size (PAGE_SIZE)
        expected: usize,
        /// Actual buffer size provided
        actual: usize,
    },

    /// I/O error from underlying file system.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

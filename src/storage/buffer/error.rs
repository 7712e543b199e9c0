//! Page cache errors.

use thiserror::Error;

use crate::heap::HeapError;
use crate::storage::{FileId, PageId};
use crate::tx::TransactionId;

/// Page cache errors.
///
/// This error type wraps heap-level errors raised while loading a page and
/// adds cache-specific conditions.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The requested access is not allowed on this cache.
    #[error("{tx} denied access to page {page}")]
    AccessDenied { tx: TransactionId, page: PageId },

    /// The page is locked incompatibly by another transaction.
    ///
    /// The caller should abort `tx` and release its locks with
    /// `transaction_complete`.
    #[error("{tx} aborted: page {page} is locked by another transaction")]
    TransactionAborted { tx: TransactionId, page: PageId },

    /// No heap file with this id is registered.
    #[error("no heap file registered with id {0}")]
    UnknownFile(FileId),

    /// A heap file with this id is already registered.
    #[error("a heap file with id {0} is already registered")]
    DuplicateFile(FileId),

    /// Loading the page from its heap file failed.
    #[error("failed to load page: {0}")]
    Heap(#[from] HeapError),
}

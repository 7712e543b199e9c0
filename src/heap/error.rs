//! Error types for the heap module.

use thiserror::Error;

use crate::storage::{CacheError, PageId, StorageError};
use crate::tuple::TupleError;

use super::scan::ScanState;

/// Errors from heap file and heap page operations.
#[derive(Debug, Error)]
pub enum HeapError {
    /// Requested page lies past the end of the file.
    #[error("page {page_num} out of range: file has {page_count} pages")]
    PageOutOfRange { page_num: u64, page_count: u64 },

    /// Backing storage failed. Never converted into "no page".
    #[error("storage fault: {0}")]
    StorageFault(#[from] StorageError),

    /// Page is full, cannot insert data.
    #[error("page full: need {required} bytes, have {available} available")]
    PageFull {
        /// Bytes required for the data and slot.
        required: usize,
        /// Bytes available in free space.
        available: usize,
    },

    /// Slot not found or already deleted.
    #[error("slot {0} not found or deleted")]
    SlotNotFound(u16),

    /// Page bytes do not describe a valid heap page.
    #[error("page {page} is corrupted: {reason}")]
    Corrupted { page: PageId, reason: String },

    /// A record could not be encoded or decoded.
    #[error("record error: {0}")]
    Record(#[from] TupleError),
}

/// Errors from [`HeapScan`](super::HeapScan).
#[derive(Debug, Error)]
pub enum ScanError {
    /// `next` was called with nothing left to return, or outside the `Open`
    /// state.
    #[error("no more records")]
    NoMoreRecords,

    /// The operation is not valid in the scan's current state.
    #[error("cannot {op} a scan in state {state:?}")]
    InvalidState { op: &'static str, state: ScanState },

    /// The page cache refused or failed a fetch.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The heap file itself failed (page count lookup).
    #[error(transparent)]
    Heap(#[from] HeapError),
}

//! Heap files and page-ordered scans.
//!
//! This module provides the heap file implementation, which stores records
//! in fixed-size slotted pages. The term "heap" refers to an unordered
//! collection of records, as opposed to indexed structures like B+trees.
//!
//! - [`HeapFile`]: Schema plus backing storage, read one page window at a time
//! - [`HeapPage`]: A decoded page and its records in slot order
//! - [`HeapPageBuilder`]: Writes records into page images
//! - [`HeapScan`]: Cursor over every record of a file through a page cache

mod error;
mod file;
mod page;
mod scan;

pub use error::{HeapError, ScanError};
pub use file::HeapFile;
pub use page::{HeapPage, HeapPageBuilder, PAGE_HEADER_SIZE, PageCursor, SLOT_SIZE, SlotId};
pub use scan::{HeapScan, ScanState};

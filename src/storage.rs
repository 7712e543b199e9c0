//! Storage layer: page addressing, backing storage and the page cache.
//!
//! # Architecture
//!
//! ```text
//! +-------------------+
//! | HeapScan          |
//! +-------------------+
//!          |  fetch(tx, page_id, perm)
//!          v
//! +-------------------+
//! | PageCache trait   |  <- buffer (BufferPool)
//! +-------------------+
//!          |  HeapFile::read_page
//!          v
//! +-------------------+
//! | Storage trait     |  <- io
//! +-------------------+
//!       /      \
//!      v        v
//! +--------------+ +-------------+
//! | MemoryStorage| | FileStorage |
//! +--------------+ +-------------+
//! ```

pub mod buffer;
pub mod error;
pub mod io;
pub mod page;

pub use buffer::{BufferPool, BufferPoolConfig, CacheError, LruReplacer, PageCache, Replacer};
pub use error::StorageError;
pub use io::{FileStorage, MemoryStorage, Storage};
pub use page::{FileId, PAGE_SIZE, PageId};

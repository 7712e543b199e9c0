//! Page cache for heap scans.
//!
//! The page cache sits between heap scans and heap files. Scans never read
//! storage directly; they ask a [`PageCache`] for a page under a transaction
//! and a permission, and the cache decides whether to serve it from memory,
//! load it, make the caller wait, or refuse.
//!
//! # Components
//!
//! - [`PageCache`]: The fetch interface scans depend on
//! - [`BufferPool`]: LRU-bounded cache with page-level shared/exclusive locks
//! - [`Replacer`]: Trait for page replacement policies
//! - [`LruReplacer`]: LRU (Least Recently Used) implementation
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use heapstore::datum::Type;
//! use heapstore::heap::HeapFile;
//! use heapstore::storage::{BufferPool, BufferPoolConfig, MemoryStorage};
//! use heapstore::tuple::TupleDesc;
//! use heapstore::tx::TransactionId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let desc = TupleDesc::unnamed(vec![Type::Int])?;
//! let file = Arc::new(HeapFile::new(MemoryStorage::new("mem/t.dat"), desc));
//!
//! let pool = BufferPool::new(BufferPoolConfig::default().with_pool_size(16));
//! pool.register(Arc::clone(&file))?;
//!
//! let tx = TransactionId::allocate();
//! let mut scan = file.scan(&pool, tx);
//! scan.open().await?;
//! while scan.has_next().await? {
//!     println!("{}", scan.next().await?);
//! }
//! pool.transaction_complete(tx);
//! # Ok(())
//! # }
//! ```

mod error;
mod lock;
mod pool;
mod replacer;

use std::future::Future;
use std::sync::Arc;

pub use error::CacheError;
pub use pool::{BufferPool, BufferPoolConfig};
pub use replacer::{LruReplacer, Replacer};

use crate::heap::HeapPage;
use crate::storage::PageId;
use crate::tx::{Permissions, TransactionId};

/// Transaction-aware source of materialized heap pages.
pub trait PageCache: Send + Sync {
    /// Returns page `page_id` on behalf of `tx` with the requested access.
    ///
    /// May wait. Fails with `CacheError::AccessDenied` or
    /// `CacheError::TransactionAborted` when the access cannot be granted.
    fn fetch(
        &self,
        tx: TransactionId,
        page_id: PageId,
        perm: Permissions,
    ) -> impl Future<Output = Result<Arc<HeapPage>, CacheError>> + Send;
}

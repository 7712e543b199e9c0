//! Buffer pool: an LRU-bounded, lock-aware page cache over heap files.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::heap::{HeapFile, HeapPage};
use crate::storage::{FileId, PageId, Storage};
use crate::tx::{Permissions, TransactionId};

use super::PageCache;
use super::error::CacheError;
use super::lock::LockTable;
use super::replacer::{LruReplacer, Replacer};

/// Configuration for the buffer pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Maximum number of pages cached at once. Values below 1 are treated
    /// as 1.
    pub pool_size: usize,

    /// Refuse read-write fetches with `CacheError::AccessDenied`.
    pub read_only: bool,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 50,
            read_only: false,
        }
    }
}

impl BufferPoolConfig {
    /// Sets the maximum number of cached pages.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Sets whether read-write fetches are refused.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// Page cache over a set of registered heap files.
///
/// # Architecture
///
/// ```text
/// +-------------------+
/// |   HeapScan        |
/// +-------------------+
///          |  fetch(tx, page_id, perm)
///          v
/// +-------------------+     +------------------+
/// | BufferPool        |---->| Lock Table       |
/// |                   |     | (PageId -> S/X)  |
/// |                   |     +------------------+
/// |                   |---->| Page Table + LRU |
/// +-------------------+     +------------------+
///          |  miss
///          v
/// +-------------------+
/// | HeapFile registry |
/// +-------------------+
/// ```
///
/// # Locking
///
/// Every fetch takes a page lock for its transaction before the page is
/// served: shared for `ReadOnly`, exclusive for `ReadWrite`. Conflicts are
/// not waited on; the request fails with `CacheError::TransactionAborted`.
/// Locks are held until [`transaction_complete`](Self::transaction_complete),
/// including locks taken by fetches that later failed to load.
///
/// # Eviction
///
/// Cached pages are immutable, so eviction only drops the pool's reference;
/// scans holding an `Arc<HeapPage>` keep their copy.
///
/// The state mutex is never held across an await: a miss releases it, loads
/// the page, and re-acquires it to install the result.
pub struct BufferPool<S: Storage, R: Replacer = LruReplacer> {
    config: BufferPoolConfig,
    files: RwLock<HashMap<FileId, Arc<HeapFile<S>>>>,
    state: Mutex<PoolState<R>>,
}

/// Mutable state protected by the state mutex.
struct PoolState<R: Replacer> {
    /// Cached pages by id.
    pages: HashMap<PageId, Arc<HeapPage>>,

    /// Replacement policy for selecting eviction victims.
    replacer: R,

    /// Page locks by transaction.
    locks: LockTable,
}

impl<S: Storage> BufferPool<S, LruReplacer> {
    /// Creates a buffer pool with LRU replacement.
    ///
    /// # Example
    ///
    /// ```
    /// use heapstore::storage::{BufferPool, BufferPoolConfig, MemoryStorage};
    ///
    /// let pool: BufferPool<MemoryStorage> = BufferPool::new(BufferPoolConfig::default());
    /// assert_eq!(pool.config().pool_size, 50);
    /// ```
    pub fn new(config: BufferPoolConfig) -> Self {
        let replacer = LruReplacer::new(config.pool_size);
        Self::with_replacer(config, replacer)
    }
}

impl<S: Storage, R: Replacer> BufferPool<S, R> {
    /// Creates a buffer pool with a custom replacement policy.
    pub fn with_replacer(mut config: BufferPoolConfig, replacer: R) -> Self {
        config.pool_size = config.pool_size.max(1);
        Self {
            config,
            files: RwLock::new(HashMap::new()),
            state: Mutex::new(PoolState {
                pages: HashMap::new(),
                replacer,
                locks: LockTable::default(),
            }),
        }
    }

    /// Returns the pool's configuration.
    pub fn config(&self) -> &BufferPoolConfig {
        &self.config
    }

    /// Makes `file`'s pages fetchable and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::DuplicateFile` if a file with the same id is
    /// already registered, whether it is the same file or a hash collision.
    pub fn register(&self, file: Arc<HeapFile<S>>) -> Result<FileId, CacheError> {
        let id = file.id();
        let mut files = self.files.write();
        if files.contains_key(&id) {
            return Err(CacheError::DuplicateFile(id));
        }
        files.insert(id, file);
        Ok(id)
    }

    /// Returns the registered file with id `file_id`.
    pub fn file(&self, file_id: FileId) -> Option<Arc<HeapFile<S>>> {
        self.files.read().get(&file_id).cloned()
    }

    /// Returns the number of pages currently cached.
    pub fn cached_pages(&self) -> usize {
        self.state.lock().pages.len()
    }

    /// Returns true if `page_id` is currently cached.
    pub fn is_cached(&self, page_id: PageId) -> bool {
        self.state.lock().pages.contains_key(&page_id)
    }

    /// Drops the cached copy of `page_id` so the next fetch rereads it.
    pub fn discard_page(&self, page_id: PageId) {
        let mut state = self.state.lock();
        if state.pages.remove(&page_id).is_some() {
            state.replacer.remove(page_id);
        }
    }

    /// Returns the lock mode `tx` holds on `page_id`, if any.
    pub fn holds_lock(&self, tx: TransactionId, page_id: PageId) -> Option<Permissions> {
        self.state.lock().locks.held_mode(tx, page_id)
    }

    /// Releases `tx`'s lock on a single page. Returns true if one was held.
    pub fn release_page(&self, tx: TransactionId, page_id: PageId) -> bool {
        self.state.lock().locks.release(tx, page_id)
    }

    /// Releases every page lock held by `tx`.
    pub fn transaction_complete(&self, tx: TransactionId) {
        let released = self.state.lock().locks.release_all(tx);
        debug!(%tx, released, "transaction complete");
    }

    fn evict_excess(&self, state: &mut PoolState<R>) {
        while state.pages.len() > self.config.pool_size {
            let Some(victim) = state.replacer.evict() else {
                break;
            };
            state.pages.remove(&victim);
            debug!(page = %victim, "evicted page");
        }
    }
}

impl<S: Storage, R: Replacer> PageCache for BufferPool<S, R> {
    async fn fetch(
        &self,
        tx: TransactionId,
        page_id: PageId,
        perm: Permissions,
    ) -> Result<Arc<HeapPage>, CacheError> {
        if perm == Permissions::ReadWrite && self.config.read_only {
            return Err(CacheError::AccessDenied { tx, page: page_id });
        }

        let file = self
            .file(page_id.file_id)
            .ok_or(CacheError::UnknownFile(page_id.file_id))?;

        {
            let mut state = self.state.lock();
            if !state.locks.acquire(tx, page_id, perm) {
                warn!(%tx, page = %page_id, %perm, "page lock conflict, aborting transaction");
                return Err(CacheError::TransactionAborted { tx, page: page_id });
            }
            if let Some(page) = state.pages.get(&page_id).cloned() {
                state.replacer.record_access(page_id);
                return Ok(page);
            }
        }

        debug!(page = %page_id, "page cache miss");
        let loaded = Arc::new(file.read_page(page_id.page_num).await?);

        let mut state = self.state.lock();
        let page = Arc::clone(state.pages.entry(page_id).or_insert(loaded));
        state.replacer.record_access(page_id);
        self.evict_excess(&mut state);
        Ok(page)
    }
}

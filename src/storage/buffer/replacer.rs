//! Page replacement policies for the buffer pool.

use std::collections::VecDeque;

use crate::storage::PageId;

/// Page replacement policy trait.
///
/// Tracks cached pages in the order the policy wants to evict them.
///
/// # Usage Contract
///
/// - `record_access(page_id)`: Called on every cache hit and after every load
/// - `remove(page_id)`: Called when a page leaves the cache for any reason
///   other than `evict`
/// - `evict()`: Chooses and forgets a victim
///
/// Implementations must be `Send + Sync` for the async buffer pool.
pub trait Replacer: Send + Sync {
    /// Marks `page_id` as just used, adding it if unknown.
    fn record_access(&mut self, page_id: PageId);

    /// Stops tracking `page_id`.
    fn remove(&mut self, page_id: PageId);

    /// Evicts and returns a page, or `None` if no page is tracked.
    fn evict(&mut self) -> Option<PageId>;

    /// Returns the number of tracked pages.
    fn size(&self) -> usize;
}

/// LRU (Least Recently Used) page replacement policy.
///
/// Evicts the least recently accessed page. Re-accessing a page is O(n) in
/// the number of tracked pages, which is bounded by the pool size.
pub struct LruReplacer {
    /// Pages in LRU order (front = LRU).
    lru_list: VecDeque<PageId>,
}

impl LruReplacer {
    /// Creates a new LRU replacer with pre-allocated capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            lru_list: VecDeque::with_capacity(capacity),
        }
    }
}

impl Replacer for LruReplacer {
    fn record_access(&mut self, page_id: PageId) {
        self.remove(page_id);
        self.lru_list.push_back(page_id);
    }

    fn remove(&mut self, page_id: PageId) {
        if let Some(pos) = self.lru_list.iter().position(|&id| id == page_id) {
            self.lru_list.remove(pos);
        }
    }

    fn evict(&mut self) -> Option<PageId> {
        self.lru_list.pop_front()
    }

    fn size(&self) -> usize {
        self.lru_list.len()
    }
}

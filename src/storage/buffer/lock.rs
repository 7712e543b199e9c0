//! Page-level shared/exclusive locks owned by transactions.

use std::collections::{HashMap, HashSet};

use crate::storage::PageId;
use crate::tx::{Permissions, TransactionId};

/// Lock held on one page.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PageLock {
    Shared(HashSet<TransactionId>),
    Exclusive(TransactionId),
}

/// Tracks which transactions hold which page locks.
///
/// Requests are granted or refused immediately; nothing waits here.
#[derive(Debug, Default)]
pub(super) struct LockTable {
    locks: HashMap<PageId, PageLock>,
    held: HashMap<TransactionId, HashSet<PageId>>,
}

impl LockTable {
    /// Grants `perm` on `page` to `tx`, returning false on conflict.
    ///
    /// A transaction that is the only shared holder may upgrade to
    /// exclusive. An exclusive holder may re-request either mode.
    pub(super) fn acquire(&mut self, tx: TransactionId, page: PageId, perm: Permissions) -> bool {
        let granted = match (self.locks.get_mut(&page), perm) {
            (None, Permissions::ReadOnly) => {
                self.locks.insert(page, PageLock::Shared(HashSet::from([tx])));
                true
            }
            (None, Permissions::ReadWrite) => {
                self.locks.insert(page, PageLock::Exclusive(tx));
                true
            }
            (Some(PageLock::Exclusive(owner)), _) => *owner == tx,
            (Some(PageLock::Shared(holders)), Permissions::ReadOnly) => {
                holders.insert(tx);
                true
            }
            (Some(lock), Permissions::ReadWrite) => {
                let sole_holder = matches!(
                    &*lock,
                    PageLock::Shared(holders) if holders.len() == 1 && holders.contains(&tx)
                );
                if sole_holder {
                    *lock = PageLock::Exclusive(tx);
                }
                sole_holder
            }
        };
        if granted {
            self.held.entry(tx).or_default().insert(page);
        }
        granted
    }

    /// Returns the mode `tx` holds on `page`, if any.
    pub(super) fn held_mode(&self, tx: TransactionId, page: PageId) -> Option<Permissions> {
        match self.locks.get(&page)? {
            PageLock::Exclusive(owner) if *owner == tx => Some(Permissions::ReadWrite),
            PageLock::Shared(holders) if holders.contains(&tx) => Some(Permissions::ReadOnly),
            _ => None,
        }
    }

    /// Releases `tx`'s lock on `page`. Returns true if one was held.
    pub(super) fn release(&mut self, tx: TransactionId, page: PageId) -> bool {
        let released = match self.locks.get_mut(&page) {
            Some(PageLock::Exclusive(owner)) if *owner == tx => {
                self.locks.remove(&page);
                true
            }
            Some(PageLock::Shared(holders)) => {
                let removed = holders.remove(&tx);
                if holders.is_empty() {
                    self.locks.remove(&page);
                }
                removed
            }
            _ => false,
        };
        if let Some(pages) = self.held.get_mut(&tx) {
            pages.remove(&page);
            if pages.is_empty() {
                self.held.remove(&tx);
            }
        }
        released
    }

    /// Releases every lock held by `tx` and returns how many there were.
    pub(super) fn release_all(&mut self, tx: TransactionId) -> usize {
        let pages = self.held.remove(&tx).unwrap_or_default();
        for &page in &pages {
            match self.locks.get_mut(&page) {
                Some(PageLock::Exclusive(owner)) if *owner == tx => {
                    self.locks.remove(&page);
                }
                Some(PageLock::Shared(holders)) => {
                    holders.remove(&tx);
                    if holders.is_empty() {
                        self.locks.remove(&page);
                    }
                }
                _ => {}
            }
        }
        pages.len()
    }
}

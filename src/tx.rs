//! Transaction identity and page access permissions.
//!
//! Transactions here are only lock owners: the page cache records which
//! transaction holds which page lock and releases them on completion.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Transaction ID (64-bit).
///
/// Ids handed out by [`TransactionId::allocate`] start at 1 and increase
/// monotonically for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Creates a transaction ID from a raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates a fresh, process-unique transaction ID.
    pub fn allocate() -> Self {
        Self(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx{}", self.0)
    }
}

/// Access mode requested when fetching a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permissions {
    /// Shared access; any number of transactions may read a page at once.
    ReadOnly,
    /// Exclusive access for a single transaction.
    ReadWrite,
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permissions::ReadOnly => write!(f, "read-only"),
            Permissions::ReadWrite => write!(f, "read-write"),
        }
    }
}

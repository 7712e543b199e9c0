//! Storage wrapper that fails reads of chosen pages.

use std::io;
use std::path::Path;

use super::{MemoryStorage, Storage};
use crate::storage::error::StorageError;

/// In-memory storage whose `read_page` fails with an I/O error for one page.
pub(crate) struct FailingStorage {
    inner: MemoryStorage,
    fail_page: Option<u64>,
}

impl FailingStorage {
    pub(crate) fn new(inner: MemoryStorage, fail_page: Option<u64>) -> Self {
        Self { inner, fail_page }
    }
}

impl Storage for FailingStorage {
    fn path(&self) -> &Path {
        self.inner.path()
    }

    async fn read_page(&self, page_num: u64, buf: &mut [u8]) -> Result<(), StorageError> {
        if self.fail_page == Some(page_num) {
            return Err(StorageError::Io(io::Error::other("injected read failure")));
        }
        self.inner.read_page(page_num, buf).await
    }

    async fn write_page(&self, page_num: u64, buf: &[u8]) -> Result<(), StorageError> {
        self.inner.write_page(page_num, buf).await
    }

    async fn allocate_page(&self) -> Result<u64, StorageError> {
        self.inner.allocate_page().await
    }

    async fn byte_len(&self) -> Result<u64, StorageError> {
        self.inner.byte_len().await
    }

    async fn sync_all(&self) -> Result<(), StorageError> {
        self.inner.sync_all().await
    }
}

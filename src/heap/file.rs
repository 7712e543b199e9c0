//! Heap file: a schema plus a backing storage read in page windows.

use bytes::BytesMut;
use tracing::debug;

use crate::storage::page::pages_in;
use crate::storage::{FileId, PAGE_SIZE, PageCache, PageId, Storage};
use crate::tuple::TupleDesc;
use crate::tx::TransactionId;

use super::error::HeapError;
use super::page::HeapPage;
use super::scan::HeapScan;

/// An unordered collection of records stored in fixed-size pages.
///
/// The heap file owns its backing storage and the schema of every record in
/// it. Its identity is derived from the storage's canonical path, so every
/// `HeapFile` opened on the same path in this process has the same id.
///
/// Record insertion and deletion are not provided here; contents are built
/// with [`HeapPageBuilder`](super::HeapPageBuilder) and written through the
/// storage directly.
pub struct HeapFile<S: Storage> {
    storage: S,
    desc: TupleDesc,
    id: FileId,
}

impl<S: Storage> HeapFile<S> {
    /// Creates a heap file over `storage` holding records shaped like `desc`.
    pub fn new(storage: S, desc: TupleDesc) -> Self {
        let id = FileId::from_path(storage.path());
        Self { storage, desc, id }
    }

    /// Returns the stable identity of this file.
    pub fn id(&self) -> FileId {
        self.id
    }

    /// Returns the schema of records in this file.
    pub fn desc(&self) -> &TupleDesc {
        &self.desc
    }

    /// Returns the backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the number of whole pages currently in the backing storage.
    ///
    /// A trailing partial page is not counted.
    pub async fn page_count(&self) -> Result<u64, HeapError> {
        Ok(pages_in(self.storage.byte_len().await?))
    }

    /// Reads and decodes page `page_num`.
    ///
    /// This bypasses any page cache; scans should go through
    /// [`PageCache::fetch`] instead.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::PageOutOfRange` if `page_num >= page_count()`.
    /// I/O failures are reported as `HeapError::StorageFault`.
    pub async fn read_page(&self, page_num: u64) -> Result<HeapPage, HeapError> {
        let page_count = self.page_count().await?;
        if page_num >= page_count {
            return Err(HeapError::PageOutOfRange {
                page_num,
                page_count,
            });
        }

        let mut buf = BytesMut::zeroed(PAGE_SIZE);
        self.storage.read_page(page_num, &mut buf).await?;
        debug!(file = %self.id, page_num, "read heap page");

        HeapPage::from_bytes(PageId::new(self.id, page_num), buf.freeze(), &self.desc)
    }

    /// Returns an unopened scan over this file reading through `cache` on
    /// behalf of `tx`.
    pub fn scan<'a, C: PageCache>(&'a self, cache: &'a C, tx: TransactionId) -> HeapScan<'a, S, C> {
        HeapScan::new(self, cache, tx)
    }
}

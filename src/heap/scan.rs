//! Page-ordered scan over a heap file.
//!
//! [`HeapScan`] walks every record of a [`HeapFile`] in page order, and in
//! slot order within a page, fetching each page on demand through a
//! [`PageCache`] with read-only permission.
//!
//! # State machine
//!
//! ```text
//!   Unopened --open--> Open --next (nothing left)--> Exhausted
//!                       ^                                |
//!                       +------------rewind--------------+
//!
//!   close: any state --> Closed;  open: Closed --> Open
//! ```

use tracing::trace;

use crate::storage::{PageCache, PageId, Storage};
use crate::tuple::{Record, TupleDesc};
use crate::tx::{Permissions, TransactionId};

use super::error::ScanError;
use super::file::HeapFile;
use super::page::PageCursor;

/// Lifecycle state of a [`HeapScan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Created but never opened.
    Unopened,
    /// Positioned inside the file.
    Open,
    /// `next` found nothing left. Only `rewind` and `close` do anything.
    Exhausted,
    /// Closed; `open` restarts from the first page.
    Closed,
}

/// Stateful cursor over every record of a heap file.
///
/// The page count is read once when the scan is opened (or rewound). Pages
/// appended afterwards are not visited until the next rewind.
///
/// A scan has a single logical reader. Independent scans over the same file
/// may run concurrently, each with its own position.
pub struct HeapScan<'a, S: Storage, C: PageCache> {
    file: &'a HeapFile<S>,
    cache: &'a C,
    tx: TransactionId,
    state: ScanState,
    page_count: u64,
    page_num: u64,
    cursor: Option<PageCursor>,
}

impl<'a, S: Storage, C: PageCache> HeapScan<'a, S, C> {
    /// Creates an unopened scan over `file` reading through `cache`.
    pub fn new(file: &'a HeapFile<S>, cache: &'a C, tx: TransactionId) -> Self {
        Self {
            file,
            cache,
            tx,
            state: ScanState::Unopened,
            page_count: 0,
            page_num: 0,
            cursor: None,
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Returns the schema of the records this scan yields.
    pub fn desc(&self) -> &'a TupleDesc {
        self.file.desc()
    }

    /// Returns the transaction this scan reads on behalf of.
    pub fn transaction(&self) -> TransactionId {
        self.tx
    }

    /// Positions the scan before the first record.
    ///
    /// Fetches page 0 through the cache. A file with no pages opens
    /// successfully and yields nothing.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::InvalidState` unless the scan is `Unopened` or
    /// `Closed`. Cache failures are returned unchanged as `ScanError::Cache`;
    /// the scan then stays in its previous state.
    pub async fn open(&mut self) -> Result<(), ScanError> {
        match self.state {
            ScanState::Unopened | ScanState::Closed => self.start().await,
            state => Err(ScanError::InvalidState { op: "open", state }),
        }
    }

    /// Restarts the scan from the first record.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::InvalidState` unless the scan is `Open` or
    /// `Exhausted`.
    pub async fn rewind(&mut self) -> Result<(), ScanError> {
        match self.state {
            ScanState::Open | ScanState::Exhausted => self.start().await,
            state => Err(ScanError::InvalidState { op: "rewind", state }),
        }
    }

    /// Closes the scan and drops its page cursor. Idempotent.
    pub fn close(&mut self) {
        self.cursor = None;
        self.state = ScanState::Closed;
    }

    /// Returns true if `next` would return a record.
    ///
    /// Returns `false` in any state other than `Open`. Pages with no records
    /// are skipped here, which may fetch them from the cache.
    ///
    /// # Errors
    ///
    /// Cache failures are returned unchanged. The scan keeps its position,
    /// so calling again retries the page that failed.
    pub async fn has_next(&mut self) -> Result<bool, ScanError> {
        if self.state != ScanState::Open {
            return Ok(false);
        }
        loop {
            if let Some(cursor) = &self.cursor
                && cursor.has_next()
            {
                return Ok(true);
            }
            if self.is_last_page() {
                return Ok(false);
            }
            // Position moves only once the fetch succeeds, so a failed page
            // is fetched again on retry.
            let next = self.page_num + 1;
            let cursor = self.fetch(next).await?;
            trace!(file = %self.file.id(), page_num = next, "scan advanced to next page");
            self.page_num = next;
            self.cursor = Some(cursor);
        }
    }

    /// Returns the next record.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::NoMoreRecords` outside the `Open` state, or when
    /// the file is exhausted; the latter moves the scan to `Exhausted`.
    pub async fn next(&mut self) -> Result<Record, ScanError> {
        if self.state != ScanState::Open {
            return Err(ScanError::NoMoreRecords);
        }
        if !self.has_next().await? {
            self.state = ScanState::Exhausted;
            self.cursor = None;
            return Err(ScanError::NoMoreRecords);
        }
        self.cursor
            .as_mut()
            .and_then(Iterator::next)
            .ok_or(ScanError::NoMoreRecords)
    }

    /// Drains the remaining records into a vector.
    pub async fn collect_remaining(&mut self) -> Result<Vec<Record>, ScanError> {
        let mut records = Vec::new();
        while self.has_next().await? {
            records.push(self.next().await?);
        }
        Ok(records)
    }

    async fn start(&mut self) -> Result<(), ScanError> {
        let page_count = self.file.page_count().await?;
        let cursor = if page_count > 0 {
            Some(self.fetch(0).await?)
        } else {
            None
        };

        self.page_count = page_count;
        self.page_num = 0;
        self.cursor = cursor;
        self.state = ScanState::Open;
        trace!(file = %self.file.id(), page_count, "scan opened");
        Ok(())
    }

    fn is_last_page(&self) -> bool {
        self.page_num + 1 >= self.page_count
    }

    async fn fetch(&self, page_num: u64) -> Result<PageCursor, ScanError> {
        let page_id = PageId::new(self.file.id(), page_num);
        let page = self
            .cache
            .fetch(self.tx, page_id, Permissions::ReadOnly)
            .await?;
        Ok(PageCursor::new(page))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::datum::{Type, Value};
    use crate::heap::{HeapError, HeapPage, HeapPageBuilder};
    use crate::storage::io::FailingStorage;
    use crate::storage::{CacheError, MemoryStorage, StorageError};

    /// Reads straight from one heap file, optionally refusing one page.
    struct DirectCache<'f, S: Storage> {
        file: &'f HeapFile<S>,
        deny_page: Option<u64>,
        denials_left: AtomicUsize,
        fetches: AtomicUsize,
    }

    impl<'f, S: Storage> DirectCache<'f, S> {
        fn new(file: &'f HeapFile<S>) -> Self {
            Self {
                file,
                deny_page: None,
                denials_left: AtomicUsize::new(usize::MAX),
                fetches: AtomicUsize::new(0),
            }
        }

        /// Refuses `page_num` on its first fetch only.
        fn deny_once(file: &'f HeapFile<S>, page_num: u64) -> Self {
            Self {
                deny_page: Some(page_num),
                denials_left: AtomicUsize::new(1),
                ..Self::new(file)
            }
        }
    }

    impl<S: Storage> PageCache for DirectCache<'_, S> {
        async fn fetch(
            &self,
            tx: TransactionId,
            page_id: PageId,
            _perm: Permissions,
        ) -> Result<Arc<HeapPage>, CacheError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.deny_page == Some(page_id.page_num)
                && self
                    .denials_left
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
            {
                return Err(CacheError::TransactionAborted { tx, page: page_id });
            }
            Ok(Arc::new(self.file.read_page(page_id.page_num).await?))
        }
    }

    fn ints() -> TupleDesc {
        TupleDesc::unnamed(vec![Type::Int]).unwrap()
    }

    async fn heap_file(per_page: &[&[i32]]) -> HeapFile<MemoryStorage> {
        let storage = MemoryStorage::new("mem/scan.dat");
        for values in per_page {
            let mut builder = HeapPageBuilder::new(&ints());
            for &v in *values {
                builder.insert(&Record::new(vec![Value::Int(v)])).unwrap();
            }
            let page_num = storage.allocate_page().await.unwrap();
            storage.write_page(page_num, &builder.finish()).await.unwrap();
        }
        HeapFile::new(storage, ints())
    }

    fn ints_of(records: &[Record]) -> Vec<i32> {
        records
            .iter()
            .map(|r| r.get(0).unwrap().as_int().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_scan_visits_pages_in_order() {
        let file = heap_file(&[&[1, 2, 3], &[4, 5], &[6]]).await;
        let cache = DirectCache::new(&file);
        let mut scan = file.scan(&cache, TransactionId::new(1));

        scan.open().await.unwrap();
        let records = scan.collect_remaining().await.unwrap();
        assert_eq!(ints_of(&records), vec![1, 2, 3, 4, 5, 6]);
        assert!(matches!(scan.next().await, Err(ScanError::NoMoreRecords)));
        assert_eq!(scan.state(), ScanState::Exhausted);
        assert!(!scan.has_next().await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_page_file() {
        let file = heap_file(&[]).await;
        let cache = DirectCache::new(&file);
        let mut scan = file.scan(&cache, TransactionId::new(1));

        scan.open().await.unwrap();
        assert_eq!(scan.state(), ScanState::Open);
        assert!(!scan.has_next().await.unwrap());
        assert!(matches!(scan.next().await, Err(ScanError::NoMoreRecords)));
        assert_eq!(cache.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_pages_are_skipped() {
        let file = heap_file(&[&[], &[1], &[], &[], &[2, 3], &[]]).await;
        let cache = DirectCache::new(&file);
        let mut scan = file.scan(&cache, TransactionId::new(1));

        scan.open().await.unwrap();
        let mut seen = Vec::new();
        while scan.has_next().await.unwrap() {
            seen.push(scan.next().await.unwrap());
        }
        assert_eq!(ints_of(&seen), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_next_without_has_next() {
        let file = heap_file(&[&[1], &[2]]).await;
        let cache = DirectCache::new(&file);
        let mut scan = file.scan(&cache, TransactionId::new(1));

        scan.open().await.unwrap();
        assert_eq!(scan.next().await.unwrap().get(0).unwrap(), &Value::Int(1));
        assert_eq!(scan.next().await.unwrap().get(0).unwrap(), &Value::Int(2));
        assert!(matches!(scan.next().await, Err(ScanError::NoMoreRecords)));
    }

    #[tokio::test]
    async fn test_unopened_and_closed_scans_yield_nothing() {
        let file = heap_file(&[&[1]]).await;
        let cache = DirectCache::new(&file);
        let mut scan = file.scan(&cache, TransactionId::new(1));

        assert_eq!(scan.state(), ScanState::Unopened);
        assert!(!scan.has_next().await.unwrap());
        assert!(matches!(scan.next().await, Err(ScanError::NoMoreRecords)));

        scan.open().await.unwrap();
        scan.close();
        scan.close();
        assert_eq!(scan.state(), ScanState::Closed);
        assert!(!scan.has_next().await.unwrap());
        assert!(matches!(scan.next().await, Err(ScanError::NoMoreRecords)));
    }

    #[tokio::test]
    async fn test_rewind_restarts() {
        let file = heap_file(&[&[1, 2], &[3]]).await;
        let cache = DirectCache::new(&file);
        let mut scan = file.scan(&cache, TransactionId::new(1));

        scan.open().await.unwrap();
        let first = scan.collect_remaining().await.unwrap();
        let _ = scan.next().await;
        assert_eq!(scan.state(), ScanState::Exhausted);

        scan.rewind().await.unwrap();
        assert_eq!(scan.state(), ScanState::Open);
        let second = scan.collect_remaining().await.unwrap();
        assert_eq!(first, second);

        // Mid-scan rewind.
        scan.rewind().await.unwrap();
        scan.next().await.unwrap();
        scan.rewind().await.unwrap();
        assert_eq!(scan.collect_remaining().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_reopen_after_close_restarts() {
        let file = heap_file(&[&[1, 2]]).await;
        let cache = DirectCache::new(&file);
        let mut scan = file.scan(&cache, TransactionId::new(1));

        scan.open().await.unwrap();
        scan.next().await.unwrap();
        scan.close();
        scan.open().await.unwrap();
        assert_eq!(ints_of(&scan.collect_remaining().await.unwrap()), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let file = heap_file(&[&[1]]).await;
        let cache = DirectCache::new(&file);
        let mut scan = file.scan(&cache, TransactionId::new(1));

        assert!(matches!(
            scan.rewind().await,
            Err(ScanError::InvalidState {
                op: "rewind",
                state: ScanState::Unopened
            })
        ));
        scan.open().await.unwrap();
        assert!(matches!(
            scan.open().await,
            Err(ScanError::InvalidState {
                op: "open",
                state: ScanState::Open
            })
        ));
        scan.close();
        assert!(matches!(
            scan.rewind().await,
            Err(ScanError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_cache_failure_propagates_unchanged() {
        let file = heap_file(&[&[1], &[2]]).await;
        let mut cache = DirectCache::new(&file);
        cache.deny_page = Some(1);
        let tx = TransactionId::new(9);
        let mut scan = file.scan(&cache, tx);

        scan.open().await.unwrap();
        scan.next().await.unwrap();
        let err = scan.next().await.unwrap_err();
        match err {
            ScanError::Cache(CacheError::TransactionAborted { tx: got, page }) => {
                assert_eq!(got, tx);
                assert_eq!(page, PageId::new(file.id(), 1));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            ScanError::Cache(CacheError::TransactionAborted {
                tx,
                page: PageId::new(file.id(), 1)
            })
            .to_string(),
            CacheError::TransactionAborted {
                tx,
                page: PageId::new(file.id(), 1)
            }
            .to_string()
        );
    }

    #[tokio::test]
    async fn test_open_failure_leaves_scan_unopened() {
        let file = heap_file(&[&[1]]).await;
        let mut cache = DirectCache::new(&file);
        cache.deny_page = Some(0);
        let mut scan = file.scan(&cache, TransactionId::new(1));

        assert!(matches!(
            scan.open().await,
            Err(ScanError::Cache(CacheError::TransactionAborted { .. }))
        ));
        assert_eq!(scan.state(), ScanState::Unopened);
    }

    #[tokio::test]
    async fn test_page_count_is_fixed_at_open() {
        let file = heap_file(&[&[1]]).await;
        let cache = DirectCache::new(&file);
        let mut scan = file.scan(&cache, TransactionId::new(1));
        scan.open().await.unwrap();

        let mut builder = HeapPageBuilder::new(&ints());
        builder.insert(&Record::new(vec![Value::Int(2)])).unwrap();
        let page_num = file.storage().allocate_page().await.unwrap();
        file.storage()
            .write_page(page_num, &builder.finish())
            .await
            .unwrap();

        assert_eq!(ints_of(&scan.collect_remaining().await.unwrap()), vec![1]);
        scan.rewind().await.unwrap();
        assert_eq!(ints_of(&scan.collect_remaining().await.unwrap()), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_failed_page_is_retried_not_skipped() {
        let file = heap_file(&[&[1], &[2], &[3]]).await;
        let cache = DirectCache::deny_once(&file, 1);
        let mut scan = file.scan(&cache, TransactionId::new(1));

        scan.open().await.unwrap();
        assert_eq!(ints_of(&[scan.next().await.unwrap()]), vec![1]);
        assert!(matches!(
            scan.has_next().await,
            Err(ScanError::Cache(CacheError::TransactionAborted { .. }))
        ));
        assert_eq!(scan.state(), ScanState::Open);

        assert_eq!(ints_of(&scan.collect_remaining().await.unwrap()), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_failed_fetch_through_next_is_retried() {
        let file = heap_file(&[&[1, 2], &[], &[3]]).await;
        let cache = DirectCache::deny_once(&file, 2);
        let mut scan = file.scan(&cache, TransactionId::new(1));

        scan.open().await.unwrap();
        let mut seen = vec![scan.next().await.unwrap(), scan.next().await.unwrap()];
        assert!(scan.next().await.is_err());
        seen.extend(scan.collect_remaining().await.unwrap());
        assert_eq!(ints_of(&seen), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_storage_fault_reaches_scan_unchanged() {
        let inner = MemoryStorage::new("mem/faulty-scan.dat");
        for values in [[1], [2]] {
            let mut builder = HeapPageBuilder::new(&ints());
            builder.insert(&Record::new(vec![Value::Int(values[0])])).unwrap();
            let page_num = inner.allocate_page().await.unwrap();
            inner.write_page(page_num, &builder.finish()).await.unwrap();
        }
        let file = HeapFile::new(FailingStorage::new(inner, Some(1)), ints());
        let cache = DirectCache::new(&file);
        let mut scan = file.scan(&cache, TransactionId::new(1));

        scan.open().await.unwrap();
        scan.next().await.unwrap();
        assert!(matches!(
            scan.next().await,
            Err(ScanError::Cache(CacheError::Heap(HeapError::StorageFault(
                StorageError::Io(_)
            ))))
        ));
        assert_eq!(scan.state(), ScanState::Open);
    }
}

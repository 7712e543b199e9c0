//! Integration tests for the storage layer and heap files on top of it.

use std::sync::Arc;

use heapstore::datum::{Type, Value};
use heapstore::heap::{HeapError, HeapFile, HeapPageBuilder};
use heapstore::storage::{FileStorage, MemoryStorage, PAGE_SIZE, Storage, StorageError};
use heapstore::tuple::{Record, TupleDesc};
use tempfile::tempdir;

/// Generic test runner for any Storage implementation.
async fn test_storage_basic_operations<S: Storage>(storage: S) {
    assert_eq!(storage.byte_len().await.unwrap(), 0);

    let n0 = storage.allocate_page().await.unwrap();
    let n1 = storage.allocate_page().await.unwrap();
    let n2 = storage.allocate_page().await.unwrap();
    assert_eq!((n0, n1, n2), (0, 1, 2));
    assert_eq!(storage.byte_len().await.unwrap(), 3 * PAGE_SIZE as u64);

    for (page_num, value) in [(n0, 10u8), (n1, 20u8), (n2, 30u8)] {
        let mut buf = [0u8; PAGE_SIZE];
        buf[0] = value;
        buf[PAGE_SIZE - 1] = value;
        storage.write_page(page_num, &buf).await.unwrap();
    }

    let mut buf = [0u8; PAGE_SIZE];
    for (page_num, value) in [(n0, 10u8), (n1, 20u8), (n2, 30u8)] {
        storage.read_page(page_num, &mut buf).await.unwrap();
        assert_eq!(buf[0], value);
        assert_eq!(buf[PAGE_SIZE - 1], value);
    }

    assert!(matches!(
        storage.read_page(3, &mut buf).await,
        Err(StorageError::PageNotFound {
            page_num: 3,
            page_count: 3
        })
    ));

    storage.sync_all().await.unwrap();
}

#[tokio::test]
async fn test_memory_storage_basic() {
    test_storage_basic_operations(MemoryStorage::new("mem/basic.dat")).await;
}

#[tokio::test]
async fn test_file_storage_basic() {
    let dir = tempdir().unwrap();
    let storage = FileStorage::open(dir.path().join("basic.dat")).await.unwrap();
    test_storage_basic_operations(storage).await;
}

/// Concurrent writers to distinct pages of one FileStorage.
#[tokio::test]
async fn test_file_concurrent_access() {
    let dir = tempdir().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path().join("concurrent.dat")).await.unwrap());

    for _ in 0..10 {
        storage.allocate_page().await.unwrap();
    }

    let mut handles = vec![];
    for i in 0..10u64 {
        let storage = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            let mut buf = [0u8; PAGE_SIZE];
            buf[0] = i as u8;
            storage.write_page(i, &buf).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    storage.sync_all().await.unwrap();

    for i in 0..10u64 {
        let mut buf = [0u8; PAGE_SIZE];
        storage.read_page(i, &mut buf).await.unwrap();
        assert_eq!(buf[0], i as u8);
    }
}

/// Heap file contents survive reopening the backing file.
#[tokio::test]
async fn test_heap_file_persistence_across_instances() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.dat");
    let desc = TupleDesc::new(vec![Type::Int, Type::String], vec![Some("id"), Some("name")])
        .unwrap();
    let records: Vec<Record> = (0..500)
        .map(|i| Record::new(vec![Value::Int(i), Value::String(format!("person-{i}"))]))
        .collect();

    {
        let storage = FileStorage::open(&path).await.unwrap();
        for page in HeapPageBuilder::paginate(&desc, &records).unwrap() {
            let page_num = storage.allocate_page().await.unwrap();
            storage.write_page(page_num, &page).await.unwrap();
        }
        storage.sync_all().await.unwrap();
    }

    let file = HeapFile::new(FileStorage::open(&path).await.unwrap(), desc.clone());
    let page_count = file.page_count().await.unwrap();
    let per_page = (PAGE_SIZE - heapstore::heap::PAGE_HEADER_SIZE)
        / (desc.byte_size() + heapstore::heap::SLOT_SIZE);
    assert_eq!(page_count as usize, records.len().div_ceil(per_page));

    let mut read_back = Vec::new();
    for page_num in 0..page_count {
        read_back.extend_from_slice(file.read_page(page_num).await.unwrap().records());
    }
    assert_eq!(read_back, records);

    assert!(matches!(
        file.read_page(page_count).await,
        Err(HeapError::PageOutOfRange { .. })
    ));
}

/// A truncated tail is ignored, not reported as a page.
#[tokio::test]
async fn test_heap_file_ignores_partial_tail() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tail.dat");
    let desc = TupleDesc::unnamed(vec![Type::Int]).unwrap();

    let mut builder = HeapPageBuilder::new(&desc);
    builder.insert(&Record::new(vec![Value::Int(1)])).unwrap();
    let mut bytes = builder.finish().to_vec();
    bytes.extend_from_slice(&[0xAB; 100]);
    tokio::fs::write(&path, &bytes).await.unwrap();

    let file = HeapFile::new(FileStorage::open(&path).await.unwrap(), desc);
    assert_eq!(file.page_count().await.unwrap(), 1);
    assert_eq!(file.read_page(0).await.unwrap().record_count(), 1);
}

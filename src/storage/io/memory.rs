//! In-memory page storage implementation.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{Storage, check_page_buf};
use crate::storage::error::StorageError;
use crate::storage::page::{PAGE_SIZE, pages_in};

/// In-memory storage for testing and development.
///
/// Holds the raw bytes of a virtual file. The path is never touched on disk;
/// it only names the storage so that heap files built on it get a stable
/// identity. All operations are synchronous but wrapped in async for trait
/// compatibility.
pub struct MemoryStorage {
    path: PathBuf,
    bytes: Mutex<Vec<u8>>,
}

impl MemoryStorage {
    /// Creates a new empty in-memory storage named `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::from_bytes(path, Vec::new())
    }

    /// Creates an in-memory storage holding `bytes`.
    ///
    /// `bytes` need not be a whole number of pages.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes: Mutex::new(bytes),
        }
    }
}

impl Storage for MemoryStorage {
    fn path(&self) -> &Path {
        &self.path
    }

    async fn read_page(&self, page_num: u64, buf: &mut [u8]) -> Result<(), StorageError> {
        check_page_buf(buf.len())?;

        let bytes = self.bytes.lock();
        let window = page_window(page_num, bytes.len())?;
        buf.copy_from_slice(&bytes[window]);
        Ok(())
    }

    async fn write_page(&self, page_num: u64, buf: &[u8]) -> Result<(), StorageError> {
        check_page_buf(buf.len())?;

        let mut bytes = self.bytes.lock();
        let window = page_window(page_num, bytes.len())?;
        bytes[window].copy_from_slice(buf);
        Ok(())
    }

    async fn allocate_page(&self) -> Result<u64, StorageError> {
        let mut bytes = self.bytes.lock();
        let page_num = pages_in(bytes.len() as u64);
        bytes.truncate(page_num as usize * PAGE_SIZE);
        bytes.resize((page_num as usize + 1) * PAGE_SIZE, 0);
        Ok(page_num)
    }

    async fn byte_len(&self) -> Result<u64, StorageError> {
        Ok(self.bytes.lock().len() as u64)
    }

    async fn sync_all(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Returns the byte range of page `page_num` in a buffer of `len` bytes.
fn page_window(page_num: u64, len: usize) -> Result<std::ops::Range<usize>, StorageError> {
    let page_count = pages_in(len as u64);
    if page_num >= page_count {
        return Err(StorageError::PageNotFound {
            page_num,
            page_count,
        });
    }
    let start = page_num as usize * PAGE_SIZE;
    Ok(start..start + PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allocate_and_read() {
        let storage = MemoryStorage::new("mem/test.dat");

        assert_eq!(storage.allocate_page().await.unwrap(), 0);
        assert_eq!(storage.allocate_page().await.unwrap(), 1);

        let mut buf = [0xFFu8; PAGE_SIZE];
        storage.read_page(1, &mut buf).await.unwrap();
        assert!(buf.iter().all(|&b| b == 0));
        assert_eq!(storage.byte_len().await.unwrap(), 2 * PAGE_SIZE as u64);
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let storage = MemoryStorage::new("mem/test.dat");
        let page_num = storage.allocate_page().await.unwrap();

        let mut write_buf = [0u8; PAGE_SIZE];
        write_buf[0..4].copy_from_slice(&[1, 2, 3, 4]);
        storage.write_page(page_num, &write_buf).await.unwrap();

        let mut read_buf = [0u8; PAGE_SIZE];
        storage.read_page(page_num, &mut read_buf).await.unwrap();
        assert_eq!(&read_buf[0..4], &[1, 2, 3, 4]);
        assert_eq!(&read_buf[4..8], &[0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_read_unallocated_page() {
        let storage = MemoryStorage::new("mem/test.dat");
        let mut buf = [0u8; PAGE_SIZE];
        assert!(matches!(
            storage.read_page(0, &mut buf).await,
            Err(StorageError::PageNotFound {
                page_num: 0,
                page_count: 0
            })
        ));
    }

    #[tokio::test]
    async fn test_partial_trailing_window() {
        let storage = MemoryStorage::from_bytes("mem/odd.dat", vec![7u8; PAGE_SIZE + 10]);
        let mut buf = [0u8; PAGE_SIZE];
        storage.read_page(0, &mut buf).await.unwrap();
        assert_eq!(buf[0], 7);
        assert!(storage.read_page(1, &mut buf).await.is_err());

        assert_eq!(storage.allocate_page().await.unwrap(), 1);
        storage.read_page(1, &mut buf).await.unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[tokio::test]
    async fn test_invalid_buffer_size() {
        let storage = MemoryStorage::new("mem/test.dat");
        storage.allocate_page().await.unwrap();

        let mut buf = [0u8; 100];
        assert!(matches!(
            storage.read_page(0, &mut buf).await,
            Err(StorageError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: 100
            })
        ));
    }

    #[tokio::test]
    async fn test_sync_all() {
        let storage = MemoryStorage::new("mem/test.dat");
        storage.sync_all().await.unwrap();
    }
}

//! File-backed storage implementation.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::{File as TokioFile, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use super::{Storage, check_page_buf};
use crate::storage::error::StorageError;
use crate::storage::page::{PAGE_SIZE, byte_offset, pages_in};

/// File-backed storage implementation.
///
/// Stores pages as contiguous 4KB blocks in a single file.
/// Uses `tokio::fs` for async file I/O.
///
/// # File Layout
///
/// ```text
/// +------------------+------------------+------------------+
/// | Page 0 (4KB)     | Page 1 (4KB)     | Page 2 (4KB)     | ...
/// +------------------+------------------+------------------+
/// ^ offset 0         ^ offset 4096      ^ offset 8192
/// ```
///
/// The page count is never cached: it is derived from the file length on
/// each call, so bytes appended by another writer become visible. A file
/// whose length is not a multiple of `PAGE_SIZE` is accepted; the trailing
/// partial window is ignored.
///
/// # Concurrency
///
/// Uses a `tokio::Mutex` around the file handle to serialize I/O operations.
pub struct FileStorage {
    /// Canonical path to the storage file
    path: PathBuf,
    /// File handle wrapped in async mutex for serialized access
    file: Mutex<TokioFile>,
}

impl FileStorage {
    /// Opens or creates a storage file at the given path.
    ///
    /// The stored path is canonicalized after the file exists, so two
    /// spellings of the same file yield the same identity.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())
            .await?;
        let path = tokio::fs::canonicalize(path.as_ref()).await?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }
}

impl Storage for FileStorage {
    fn path(&self) -> &Path {
        &self.path
    }

    async fn read_page(&self, page_num: u64, buf: &mut [u8]) -> Result<(), StorageError> {
        check_page_buf(buf.len())?;

        let mut file = self.file.lock().await;
        let page_count = pages_in(file.metadata().await?.len());
        if page_num >= page_count {
            return Err(StorageError::PageNotFound {
                page_num,
                page_count,
            });
        }

        file.seek(SeekFrom::Start(byte_offset(page_num))).await?;
        file.read_exact(buf).await?;
        Ok(())
    }

    async fn write_page(&self, page_num: u64, buf: &[u8]) -> Result<(), StorageError> {
        check_page_buf(buf.len())?;

        let mut file = self.file.lock().await;
        let page_count = pages_in(file.metadata().await?.len());
        if page_num >= page_count {
            return Err(StorageError::PageNotFound {
                page_num,
                page_count,
            });
        }

        file.seek(SeekFrom::Start(byte_offset(page_num))).await?;
        file.write_all(buf).await?;
        Ok(())
    }

    async fn allocate_page(&self) -> Result<u64, StorageError> {
        let mut file = self.file.lock().await;
        let page_num = pages_in(file.metadata().await?.len());

        // Overwrites any trailing partial window.
        file.seek(SeekFrom::Start(byte_offset(page_num))).await?;
        file.write_all(&[0u8; PAGE_SIZE]).await?;
        file.flush().await?;

        Ok(page_num)
    }

    async fn byte_len(&self) -> Result<u64, StorageError> {
        let file = self.file.lock().await;
        Ok(file.metadata().await?.len())
    }

    async fn sync_all(&self) -> Result<(), StorageError> {
        let file = self.file.lock().await;
        file.sync_all().await?;
        Ok(())
    }
}

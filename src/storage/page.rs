//! Page identifiers and size constants.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// 4KB page size. Page `i` of a file occupies bytes
/// `[i * PAGE_SIZE, (i + 1) * PAGE_SIZE)`.
pub const PAGE_SIZE: usize = 4096;

/// Identity of a heap file, derived from its canonical storage path.
///
/// The same path always yields the same id within a process. Distinct paths
/// may collide; callers that keep several files side by side (such as the
/// buffer pool registry) must detect that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

impl FileId {
    /// Creates a file id from a raw value.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Derives the id of the file stored at `path`.
    pub fn from_path(path: &Path) -> Self {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        let hash = hasher.finish();
        Self((hash ^ (hash >> 32)) as u32)
    }

    /// Returns the raw value.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Address of a page: owning file plus zero-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    /// File the page belongs to.
    pub file_id: FileId,
    /// Zero-based page number within the file.
    pub page_num: u64,
}

impl PageId {
    /// Creates a new PageId.
    pub const fn new(file_id: FileId, page_num: u64) -> Self {
        Self { file_id, page_num }
    }

    /// Returns the page number.
    pub const fn page_num(&self) -> u64 {
        self.page_num
    }

    /// Calculates the byte offset of this page within its file.
    pub const fn byte_offset(&self) -> u64 {
        byte_offset(self.page_num)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_id, self.page_num)
    }
}

/// Byte offset of page `page_num` within a file.
pub const fn byte_offset(page_num: u64) -> u64 {
    page_num * PAGE_SIZE as u64
}

/// Number of whole pages in a file of `byte_len` bytes.
pub const fn pages_in(byte_len: u64) -> u64 {
    byte_len / PAGE_SIZE as u64
}

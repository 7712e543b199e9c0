//! Heap page codec using a slotted page structure.
//!
//! A heap page stores fixed-width records within a 4KB page:
//!
//! ```text
//! +------------------+ offset 0
//! | Header (8B)      | slot_count, free_start, free_end, reserved (u16 LE)
//! +------------------+ offset 8
//! | Slot Array       | (grows downward)
//! +------------------+
//! | Free Space       |
//! +------------------+
//! | Records          | (grows upward from bottom)
//! +------------------+ offset 4096
//! ```
//!
//! A slot with offset 0 is empty. An all-zero page decodes as a page with
//! no records, so freshly allocated storage pages are valid empty pages.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::storage::{PAGE_SIZE, PageId};
use crate::tuple::{Record, TupleDesc};

use super::error::HeapError;

/// Size of the page header in bytes.
pub const PAGE_HEADER_SIZE: usize = 8;

/// Size of each slot entry in bytes.
pub const SLOT_SIZE: usize = 4;

/// Slot identifier within a page.
pub type SlotId = u16;

/// Page header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageHeader {
    slot_count: u16,
    free_start: u16,
    free_end: u16,
}

impl PageHeader {
    fn empty() -> Self {
        Self {
            slot_count: 0,
            free_start: PAGE_HEADER_SIZE as u16,
            free_end: PAGE_SIZE as u16,
        }
    }

    fn read_from(data: &[u8]) -> Self {
        Self {
            slot_count: u16::from_le_bytes([data[0], data[1]]),
            free_start: u16::from_le_bytes([data[2], data[3]]),
            free_end: u16::from_le_bytes([data[4], data[5]]),
        }
    }

    fn write_to(&self, data: &mut [u8]) {
        data[0..2].copy_from_slice(&self.slot_count.to_le_bytes());
        data[2..4].copy_from_slice(&self.free_start.to_le_bytes());
        data[4..6].copy_from_slice(&self.free_end.to_le_bytes());
        data[6..8].fill(0);
    }

    fn free_space(&self) -> usize {
        (self.free_end as usize).saturating_sub(self.free_start as usize)
    }
}

/// A slot entry in the slot array.
///
/// Layout (4 bytes):
/// - `offset`: u16 (offset to record data, 0 = empty)
/// - `length`: u16 (record length)
#[derive(Debug, Clone, Copy)]
struct SlotEntry {
    offset: u16,
    length: u16,
}

impl SlotEntry {
    const EMPTY: Self = Self {
        offset: 0,
        length: 0,
    };

    fn is_empty(&self) -> bool {
        self.offset == 0
    }

    fn read_from(data: &[u8]) -> Self {
        Self {
            offset: u16::from_le_bytes([data[0], data[1]]),
            length: u16::from_le_bytes([data[2], data[3]]),
        }
    }

    fn write_to(&self, data: &mut [u8]) {
        data[0..2].copy_from_slice(&self.offset.to_le_bytes());
        data[2..4].copy_from_slice(&self.length.to_le_bytes());
    }
}

/// Slotted view over exactly `PAGE_SIZE` bytes.
///
/// The type parameter `T` allows this to wrap `Bytes` for decoding or
/// `BytesMut` for building.
struct SlottedPage<T> {
    data: T,
}

impl<T: AsRef<[u8]>> SlottedPage<T> {
    fn new(data: T) -> Self {
        debug_assert_eq!(data.as_ref().len(), PAGE_SIZE);
        Self { data }
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn header(&self) -> PageHeader {
        PageHeader::read_from(&self.data()[..PAGE_HEADER_SIZE])
    }

    fn slot(&self, slot_id: SlotId) -> SlotEntry {
        let offset = PAGE_HEADER_SIZE + slot_id as usize * SLOT_SIZE;
        SlotEntry::read_from(&self.data()[offset..offset + SLOT_SIZE])
    }

    /// Returns every occupied slot's bytes in slot order.
    ///
    /// Out-of-bounds slot entries are reported as `Err(reason)`.
    fn occupied(&self) -> Result<Vec<&[u8]>, String> {
        let header = self.header();
        let slot_end = PAGE_HEADER_SIZE + header.slot_count as usize * SLOT_SIZE;
        if slot_end > PAGE_SIZE {
            return Err(format!(
                "slot array of {} entries overruns the page",
                header.slot_count
            ));
        }

        let mut out = Vec::with_capacity(header.slot_count as usize);
        for slot_id in 0..header.slot_count {
            let slot = self.slot(slot_id);
            if slot.is_empty() {
                continue;
            }
            let start = slot.offset as usize;
            let end = start + slot.length as usize;
            if start < slot_end || end > PAGE_SIZE {
                return Err(format!(
                    "slot {} points at [{}, {}) outside the record area",
                    slot_id, start, end
                ));
            }
            out.push(&self.data()[start..end]);
        }
        Ok(out)
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> SlottedPage<T> {
    fn init(&mut self) {
        let data = self.data.as_mut();
        data.fill(0);
        PageHeader::empty().write_to(&mut data[..PAGE_HEADER_SIZE]);
    }

    fn set_header(&mut self, header: &PageHeader) {
        header.write_to(&mut self.data.as_mut()[..PAGE_HEADER_SIZE]);
    }

    fn set_slot(&mut self, slot_id: SlotId, entry: &SlotEntry) {
        let offset = PAGE_HEADER_SIZE + slot_id as usize * SLOT_SIZE;
        entry.write_to(&mut self.data.as_mut()[offset..offset + SLOT_SIZE]);
    }

    fn insert(&mut self, record_data: &[u8]) -> Result<SlotId, HeapError> {
        let mut header = self.header();
        let required = record_data.len() + SLOT_SIZE;
        if header.free_space() < required {
            return Err(HeapError::PageFull {
                required,
                available: header.free_space(),
            });
        }

        let slot_id = header.slot_count;
        header.slot_count += 1;
        header.free_start += SLOT_SIZE as u16;
        header.free_end -= record_data.len() as u16;

        let start = header.free_end as usize;
        self.data.as_mut()[start..start + record_data.len()].copy_from_slice(record_data);
        self.set_slot(
            slot_id,
            &SlotEntry {
                offset: header.free_end,
                length: record_data.len() as u16,
            },
        );
        self.set_header(&header);
        Ok(slot_id)
    }

    fn delete(&mut self, slot_id: SlotId) -> Result<(), HeapError> {
        if slot_id >= self.header().slot_count || self.slot(slot_id).is_empty() {
            return Err(HeapError::SlotNotFound(slot_id));
        }
        self.set_slot(slot_id, &SlotEntry::EMPTY);
        Ok(())
    }
}

/// A materialized heap page: its identity and its records in slot order.
///
/// Pages are immutable once decoded and are shared between the page cache
/// and scans through `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapPage {
    id: PageId,
    records: Vec<Record>,
}

impl HeapPage {
    /// Decodes a page from its on-disk bytes.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::Corrupted` if `bytes` is not exactly one page, the
    /// slot array is malformed, or a slot's length disagrees with `desc`.
    /// Record decoding failures surface as `HeapError::Record`.
    pub fn from_bytes(id: PageId, bytes: Bytes, desc: &TupleDesc) -> Result<Self, HeapError> {
        let corrupted = |reason: String| HeapError::Corrupted { page: id, reason };

        if bytes.len() != PAGE_SIZE {
            return Err(corrupted(format!(
                "expected {} bytes, got {}",
                PAGE_SIZE,
                bytes.len()
            )));
        }

        let page = SlottedPage::new(bytes);
        let slots = page.occupied().map_err(corrupted)?;
        let width = desc.byte_size();

        let mut records = Vec::with_capacity(slots.len());
        for mut data in slots {
            if data.len() != width {
                return Err(corrupted(format!(
                    "record of {} bytes does not match schema width {}",
                    data.len(),
                    width
                )));
            }
            records.push(Record::deserialize(&mut data, desc)?);
        }

        Ok(Self { id, records })
    }

    /// Returns the page's identity.
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Returns the records in slot order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the number of records on this page.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the page holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Forward-only cursor over a shared page's records.
#[derive(Debug, Clone)]
pub struct PageCursor {
    page: Arc<HeapPage>,
    pos: usize,
}

impl PageCursor {
    /// Creates a cursor positioned before the page's first record.
    pub fn new(page: Arc<HeapPage>) -> Self {
        Self { page, pos: 0 }
    }

    /// Returns the page this cursor walks.
    pub fn page(&self) -> &Arc<HeapPage> {
        &self.page
    }

    /// Returns true if another record remains.
    pub fn has_next(&self) -> bool {
        self.pos < self.page.records.len()
    }
}

impl Iterator for PageCursor {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let record = self.page.records.get(self.pos)?.clone();
        self.pos += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.page.records.len() - self.pos;
        (left, Some(left))
    }
}

/// Writes records into a fresh page image.
///
/// Used to build heap file contents; the resulting bytes are written to
/// storage with [`Storage::write_page`](crate::storage::Storage::write_page).
///
/// # Example
///
/// ```
/// use heapstore::datum::{Type, Value};
/// use heapstore::heap::{HeapPage, HeapPageBuilder};
/// use heapstore::storage::{FileId, PageId};
/// use heapstore::tuple::{Record, TupleDesc};
///
/// let desc = TupleDesc::unnamed(vec![Type::Int]).unwrap();
/// let mut builder = HeapPageBuilder::new(&desc);
/// builder.insert(&Record::new(vec![Value::Int(1)])).unwrap();
/// builder.insert(&Record::new(vec![Value::Int(2)])).unwrap();
///
/// let id = PageId::new(FileId::new(1), 0);
/// let page = HeapPage::from_bytes(id, builder.finish(), &desc).unwrap();
/// assert_eq!(page.record_count(), 2);
/// ```
pub struct HeapPageBuilder {
    desc: TupleDesc,
    page: SlottedPage<BytesMut>,
    live: usize,
}

impl HeapPageBuilder {
    /// Starts an empty page for records shaped like `desc`.
    pub fn new(desc: &TupleDesc) -> Self {
        let mut page = SlottedPage::new(BytesMut::zeroed(PAGE_SIZE));
        page.init();
        Self {
            desc: desc.clone(),
            page,
            live: 0,
        }
    }

    /// Returns true if one more record fits.
    pub fn has_room(&self) -> bool {
        self.page.header().free_space() >= self.desc.byte_size() + SLOT_SIZE
    }

    /// Appends a record and returns its slot.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::PageFull` if the record does not fit, and
    /// `HeapError::Record` if it does not match the builder's schema.
    pub fn insert(&mut self, record: &Record) -> Result<SlotId, HeapError> {
        let mut buf = Vec::with_capacity(self.desc.byte_size());
        record.serialize(&self.desc, &mut buf)?;
        let slot_id = self.page.insert(&buf)?;
        self.live += 1;
        Ok(slot_id)
    }

    /// Empties a slot, leaving a hole that readers skip.
    pub fn delete(&mut self, slot_id: SlotId) -> Result<(), HeapError> {
        self.page.delete(slot_id)?;
        self.live -= 1;
        Ok(())
    }

    /// Returns the number of live records written so far.
    pub fn record_count(&self) -> usize {
        self.live
    }

    /// Returns the finished page image.
    pub fn finish(self) -> Bytes {
        self.page.data.freeze()
    }

    /// Packs `records` into as many full pages as needed, in order.
    ///
    /// An empty input yields no pages.
    pub fn paginate<'r, I>(desc: &TupleDesc, records: I) -> Result<Vec<Bytes>, HeapError>
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let mut pages = Vec::new();
        let mut builder = HeapPageBuilder::new(desc);
        for record in records {
            if !builder.has_room() {
                pages.push(builder.finish());
                builder = HeapPageBuilder::new(desc);
            }
            builder.insert(record)?;
        }
        if builder.record_count() > 0 {
            pages.push(builder.finish());
        }
        Ok(pages)
    }
}

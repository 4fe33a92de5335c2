use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::{BufferPool, PageRef};
use crate::common::{
    DbError, PageId, Permission, Result, TableId, TransactionId, PAGE_SIZE,
};
use crate::storage::page::HeapPage;
use crate::tuple::{Tuple, TupleDesc};

/// HeapFile stores one table as a flat sequence of heap pages.
///
/// Page `n` occupies bytes `[n * PAGE_SIZE, (n + 1) * PAGE_SIZE)`. There is no file
/// header; the page count is derived from the file length alone.
pub struct HeapFile {
    /// The backing file
    file: Mutex<File>,
    /// Canonical path of the backing file
    path: PathBuf,
    /// Table id derived from the canonical path
    table_id: TableId,
    /// Descriptor of the stored tuples
    desc: Arc<TupleDesc>,
    /// Number of page reads performed
    num_reads: AtomicU64,
    /// Number of page writes performed
    num_writes: AtomicU64,
}

impl HeapFile {
    /// Opens the heap file at the given path, creating an empty file if needed.
    pub fn open<P: AsRef<Path>>(path: P, desc: Arc<TupleDesc>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        let path = path.as_ref().canonicalize()?;
        let table_id = TableId::from_path(&path);

        Ok(Self {
            file: Mutex::new(file),
            path,
            table_id,
            desc,
            num_reads: AtomicU64::new(0),
            num_writes: AtomicU64::new(0),
        })
    }

    /// Returns the table id of this file.
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Returns the descriptor of the stored tuples.
    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    /// Returns the canonical path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of pages, `ceil(file_length / PAGE_SIZE)`.
    pub fn num_pages(&self) -> Result<u32> {
        let len = self.file.lock().metadata()?.len();
        Ok(len.div_ceil(PAGE_SIZE as u64) as u32)
    }

    /// Reads and decodes one page from disk.
    pub fn read_page(&self, page_id: PageId) -> Result<HeapPage> {
        self.check_owner(page_id)?;

        let offset = page_id.page_no() as u64 * PAGE_SIZE as u64;
        let mut data = HeapPage::empty_page_data();
        {
            let mut file = self.file.lock();
            if offset >= file.metadata()?.len() {
                return Err(DbError::PageNotFound(page_id));
            }
            file.seek(SeekFrom::Start(offset))?;

            // A short trailing page reads as zero-filled
            let mut filled = 0;
            while filled < PAGE_SIZE {
                let n = file.read(&mut data[filled..])?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
        }

        self.num_reads.fetch_add(1, Ordering::Relaxed);
        HeapPage::from_bytes(page_id, self.desc.clone(), &data)
    }

    /// Overwrites an existing page on disk. Never extends the file.
    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        let page_id = page.page_id();
        self.check_owner(page_id)?;
        if page_id.page_no() >= self.num_pages()? {
            return Err(DbError::PageNotFound(page_id));
        }
        self.write_at(page)
    }

    /// Inserts a tuple into the first page with a free slot, growing the file by
    /// one page if every page is full. Returns the modified page.
    ///
    /// Pages are fetched through the buffer pool and marked dirty as soon as they
    /// change. A new page reaches disk empty; the tuple only lands through the
    /// pool. Callers should go through [`BufferPool::insert_tuple`], which
    /// serializes writers.
    pub fn insert_tuple(
        &self,
        pool: &BufferPool,
        txn: TransactionId,
        tuple: &mut Tuple,
    ) -> Result<Vec<PageRef>> {
        if **tuple.desc() != *self.desc {
            return Err(DbError::SchemaMismatch {
                expected: self.desc.to_string(),
                found: tuple.desc().to_string(),
            });
        }

        let num_pages = self.num_pages()?;
        for page_no in 0..num_pages {
            let page_id = PageId::new(self.table_id, page_no);
            let page = pool.get_page(txn, page_id, Permission::ReadWrite)?;

            let inserted = {
                let mut guard = page.write();
                if guard.num_empty_slots() > 0 {
                    guard.insert_tuple(tuple)?;
                    guard.mark_dirty(true, Some(txn));
                    true
                } else {
                    false
                }
            };
            if inserted {
                return Ok(vec![page]);
            }
        }

        // Every page is full: append an empty page, then fill it through the pool
        let page_id = PageId::new(self.table_id, num_pages);
        self.write_at(&HeapPage::empty(page_id, self.desc.clone()))?;

        let page = pool.get_page(txn, page_id, Permission::ReadWrite)?;
        {
            let mut guard = page.write();
            guard.insert_tuple(tuple)?;
            guard.mark_dirty(true, Some(txn));
        }
        Ok(vec![page])
    }

    /// Deletes a tuple from the page its record id points at. Returns the modified page.
    pub fn delete_tuple(
        &self,
        pool: &BufferPool,
        txn: TransactionId,
        tuple: &Tuple,
    ) -> Result<Vec<PageRef>> {
        let record_id = tuple.record_id().ok_or(DbError::MissingRecordId)?;
        if record_id.page_id.table_id() != self.table_id {
            return Err(DbError::RecordNotOnPage(record_id));
        }

        let page = pool.get_page(txn, record_id.page_id, Permission::ReadWrite)?;
        {
            let mut guard = page.write();
            guard.delete_tuple(tuple)?;
            guard.mark_dirty(true, Some(txn));
        }
        Ok(vec![page])
    }

    /// Returns a sequential iterator over every tuple of this file.
    pub fn iter(self: &Arc<Self>, pool: Arc<BufferPool>, txn: TransactionId) -> HeapFileIterator {
        HeapFileIterator::new(Arc::clone(self), pool, txn)
    }

    /// Returns the number of page reads performed.
    pub fn num_reads(&self) -> u64 {
        self.num_reads.load(Ordering::Relaxed)
    }

    /// Returns the number of page writes performed.
    pub fn num_writes(&self) -> u64 {
        self.num_writes.load(Ordering::Relaxed)
    }

    fn check_owner(&self, page_id: PageId) -> Result<()> {
        if page_id.table_id() != self.table_id {
            return Err(DbError::PageNotFound(page_id));
        }
        Ok(())
    }

    fn write_at(&self, page: &HeapPage) -> Result<()> {
        let offset = page.page_id().page_no() as u64 * PAGE_SIZE as u64;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(page.page_data())?;
        file.flush()?;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Forward-only iterator over the tuples of a heap file.
///
/// Walks pages in ascending order and, within a page, occupied slots in ascending
/// order. Pages are read through the buffer pool one at a time; the tuples of the
/// current page are copied out so no page lock is held between calls.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    pool: Arc<BufferPool>,
    txn: TransactionId,
    /// Last page loaded; None before the first page
    current_page: Option<u32>,
    /// Remaining tuples of the current page
    buffered: VecDeque<Tuple>,
    open: bool,
}

impl HeapFileIterator {
    /// Creates a closed iterator.
    pub fn new(file: Arc<HeapFile>, pool: Arc<BufferPool>, txn: TransactionId) -> Self {
        Self {
            file,
            pool,
            txn,
            current_page: None,
            buffered: VecDeque::new(),
            open: false,
        }
    }

    /// Positions the iterator before the first page.
    pub fn open(&mut self) {
        self.current_page = None;
        self.buffered.clear();
        self.open = true;
    }

    /// Returns whether another tuple is available, loading pages lazily.
    pub fn has_next(&mut self) -> Result<bool> {
        if !self.open {
            return Err(DbError::IteratorNotOpen);
        }

        while self.buffered.is_empty() {
            let next_page = self.current_page.map_or(0, |p| p + 1);
            if next_page >= self.file.num_pages()? {
                return Ok(false);
            }
            self.current_page = Some(next_page);

            let page_id = PageId::new(self.file.table_id(), next_page);
            let page = self.pool.get_page(self.txn, page_id, Permission::ReadOnly)?;
            let tuples = page.read().iter().collect::<Result<VecDeque<_>>>()?;
            self.buffered = tuples;
        }

        Ok(true)
    }

    /// Returns the next tuple.
    pub fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        self.buffered.pop_front().ok_or(DbError::NoSuchElement)
    }

    /// Restarts from the first page.
    pub fn rewind(&mut self) {
        self.close();
        self.open();
    }

    /// Releases the buffered tuples; the iterator must be reopened before use.
    pub fn close(&mut self) {
        self.current_page = None;
        self.buffered.clear();
        self.open = false;
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::catalog::Catalog;
use crate::common::{
    DatabaseConfig, DbError, PageId, Permission, Result, TableId, TransactionId,
};
use crate::storage::heap::HeapFile;
use crate::storage::page::HeapPage;
use crate::transaction::{LockManager, NoLockManager};
use crate::tuple::Tuple;

use super::{replacer_for, RandomReplacer, Replacer};

/// Shared handle to a cached page.
///
/// Every caller asking for the same cached page gets a clone of the same `Arc`, so
/// changes made through one handle are visible through all of them.
pub type PageRef = Arc<RwLock<HeapPage>>;

/// A cached page and the file it is written back to
struct CachedPage {
    page: PageRef,
    file: Arc<HeapFile>,
}

/// Cache contents guarded by one mutex
struct PoolState {
    /// Page table: cached pages by id
    pages: HashMap<PageId, CachedPage>,
    /// Eviction policy over the cached pages
    replacer: Box<dyn Replacer>,
}

/// BufferPool caches heap pages in memory and is the only way operators reach them.
///
/// The pool holds at most `capacity` pages. A miss when full evicts one page chosen
/// by the replacer, writing it back first if it is dirty. Pages are never pinned:
/// a handle obtained from [`get_page`](Self::get_page) stays usable after its page
/// leaves the cache, but later fetches read a fresh copy from disk.
///
/// Locking: the state mutex may be held while taking a page lock, never the other
/// way around. Inserts and deletes are serialized by a separate write latch which
/// is held while the heap file calls back into [`get_page`](Self::get_page).
pub struct BufferPool {
    /// Maximum number of cached pages
    capacity: usize,
    /// Resolves table ids to heap files
    catalog: Arc<Catalog>,
    /// Locking hooks consulted on every page access
    lock_manager: Arc<dyn LockManager>,
    state: Mutex<PoolState>,
    /// Serializes tuple inserts and deletes
    write_latch: Mutex<()>,
}

impl BufferPool {
    /// Creates a buffer pool with random eviction and no page locking.
    pub fn new(capacity: usize, catalog: Arc<Catalog>) -> Self {
        Self::with_replacer(capacity, catalog, Box::new(RandomReplacer::new()))
    }

    /// Creates a buffer pool with the given eviction policy.
    pub fn with_replacer(
        capacity: usize,
        catalog: Arc<Catalog>,
        replacer: Box<dyn Replacer>,
    ) -> Self {
        Self {
            capacity,
            catalog,
            lock_manager: Arc::new(NoLockManager),
            state: Mutex::new(PoolState {
                pages: HashMap::with_capacity(capacity),
                replacer,
            }),
            write_latch: Mutex::new(()),
        }
    }

    /// Creates a buffer pool sized and configured from a database config.
    pub fn from_config(config: &DatabaseConfig, catalog: Arc<Catalog>) -> Self {
        Self::with_replacer(config.pool_pages, catalog, replacer_for(config.replacement))
    }

    /// Installs a lock manager.
    pub fn with_lock_manager(mut self, lock_manager: Arc<dyn LockManager>) -> Self {
        self.lock_manager = lock_manager;
        self
    }

    /// Returns the catalog this pool resolves tables through.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Returns the maximum number of cached pages.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of cached pages.
    pub fn len(&self) -> usize {
        self.state.lock().pages.len()
    }

    /// Returns true if no page is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns whether a page is currently cached.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.state.lock().pages.contains_key(&page_id)
    }

    /// Returns the page with the given id, reading it from disk on a miss.
    ///
    /// The lock manager is consulted first; its error is returned unchanged.
    /// When the pool is full, one page is evicted before the read.
    pub fn get_page(&self, txn: TransactionId, page_id: PageId, perm: Permission) -> Result<PageRef> {
        self.lock_manager.acquire(txn, page_id, perm)?;

        let mut state = self.state.lock();
        if let Some(cached) = state.pages.get(&page_id) {
            let page = Arc::clone(&cached.page);
            state.replacer.record_access(page_id);
            return Ok(page);
        }

        let file = self.catalog.file(page_id.table_id())?;
        if state.pages.len() >= self.capacity {
            self.evict_page(&mut state)?;
        }

        let page = Arc::new(RwLock::new(file.read_page(page_id)?));
        state.pages.insert(
            page_id,
            CachedPage {
                page: Arc::clone(&page),
                file,
            },
        );
        state.replacer.record_access(page_id);
        Ok(page)
    }

    /// Releases one page lock early.
    pub fn release_page(&self, txn: TransactionId, page_id: PageId) {
        self.lock_manager.release(txn, page_id);
    }

    /// Returns whether the transaction holds a lock on the page.
    pub fn holds_lock(&self, txn: TransactionId, page_id: PageId) -> bool {
        self.lock_manager.holds_lock(txn, page_id)
    }

    /// Ends a transaction by releasing its locks.
    ///
    /// Commit does not force pages and abort does not roll back; dirty pages reach
    /// disk on eviction or an explicit flush.
    pub fn transaction_complete(&self, txn: TransactionId, _commit: bool) -> Result<()> {
        self.lock_manager.release_all(txn);
        Ok(())
    }

    /// Inserts a tuple into a table on behalf of a transaction.
    ///
    /// On success the tuple carries its new record id and the modified page is
    /// marked dirty by `txn`.
    pub fn insert_tuple(&self, txn: TransactionId, table_id: TableId, tuple: &mut Tuple) -> Result<()> {
        let _latch = self.write_latch.lock();
        let file = self.catalog.file(table_id)?;
        let pages = file.insert_tuple(self, txn, tuple)?;
        self.touch_modified(&pages);
        Ok(())
    }

    /// Deletes a stored tuple, located by its record id.
    pub fn delete_tuple(&self, txn: TransactionId, tuple: &Tuple) -> Result<()> {
        let record_id = tuple.record_id().ok_or(DbError::MissingRecordId)?;

        let _latch = self.write_latch.lock();
        let file = self.catalog.file(record_id.page_id.table_id())?;
        let pages = file.delete_tuple(self, txn, tuple)?;
        self.touch_modified(&pages);
        Ok(())
    }

    /// Writes a cached page to disk if it is dirty.
    /// Returns false if the page is not cached.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let state = self.state.lock();
        match state.pages.get(&page_id) {
            Some(cached) => {
                Self::write_back(cached)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Writes every dirty cached page to disk. Pages stay cached.
    pub fn flush_all_pages(&self) -> Result<()> {
        let state = self.state.lock();
        for cached in state.pages.values() {
            Self::write_back(cached)?;
        }
        Ok(())
    }

    /// Writes every cached page dirtied by the given transaction.
    pub fn flush_pages(&self, txn: TransactionId) -> Result<()> {
        let state = self.state.lock();
        for cached in state.pages.values() {
            if cached.page.read().dirtier() == Some(txn) {
                Self::write_back(cached)?;
            }
        }
        Ok(())
    }

    /// Drops a page from the cache without writing it back.
    /// Returns false if the page was not cached.
    pub fn discard_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock();
        state.replacer.remove(page_id);
        state.pages.remove(&page_id).is_some()
    }

    /// Records an access for modified pages that are still cached.
    ///
    /// Pages are marked dirty by the heap file under their write lock, so a page
    /// evicted in the meantime has already been written back.
    fn touch_modified(&self, pages: &[PageRef]) {
        let mut state = self.state.lock();
        for page in pages {
            let page_id = page.read().page_id();
            let cached = state
                .pages
                .get(&page_id)
                .is_some_and(|c| Arc::ptr_eq(&c.page, page));
            if cached {
                state.replacer.record_access(page_id);
            }
        }
    }

    /// Evicts the replacer's victim, writing it back first if dirty.
    ///
    /// The victim leaves the cache even when the write fails; the write error is
    /// still returned.
    fn evict_page(&self, state: &mut PoolState) -> Result<()> {
        let victim = state.replacer.evict().ok_or(DbError::BufferPoolFull)?;
        match state.pages.remove(&victim) {
            Some(cached) => Self::write_back(&cached),
            None => Ok(()),
        }
    }

    /// Writes a dirty page through the file it was read from. Works after the
    /// table has left the catalog.
    fn write_back(cached: &CachedPage) -> Result<()> {
        let mut guard = cached.page.write();
        if guard.is_dirty() {
            cached.file.write_page(&guard)?;
            guard.mark_dirty(false, None);
        }
        Ok(())
    }
}

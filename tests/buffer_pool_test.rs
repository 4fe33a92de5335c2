//! Integration tests for the buffer pool

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use heapdb::buffer::{BufferPool, LruKReplacer, RandomReplacer};
use heapdb::catalog::Catalog;
use heapdb::common::{DbError, PageId, Permission, Result, TableId, TransactionId};
use heapdb::storage::heap::HeapFile;
use heapdb::storage::page::HeapPage;
use heapdb::transaction::LockManager;
use heapdb::tuple::{Field, Tuple, TupleDesc, Type};
use tempfile::TempDir;

/// One STRING column: 31 tuples per page
fn desc() -> Arc<TupleDesc> {
    TupleDesc::builder().field("s", Type::String).build_arc()
}

fn row(i: usize) -> Tuple {
    Tuple::new(desc(), vec![Field::string(format!("row-{}", i))])
}

fn new_catalog(dir: &Path) -> (Arc<Catalog>, TableId) {
    let catalog = Arc::new(Catalog::new());
    let file = HeapFile::open(dir.join("t.dat"), desc()).unwrap();
    let table_id = catalog.add_table(file, "t", None);
    (catalog, table_id)
}

/// Writes `pages` full pages to the table file and returns a fresh catalog over it.
fn table_with_pages(dir: &Path, pages: usize) -> (Arc<Catalog>, TableId) {
    let (catalog, table_id) = new_catalog(dir);
    let pool = BufferPool::new(pages + 1, catalog.clone());
    let txn = TransactionId::new();
    let per_page = HeapPage::slots_per_page(desc().byte_size());
    for i in 0..pages * per_page {
        pool.insert_tuple(txn, table_id, &mut row(i)).unwrap();
    }
    pool.flush_all_pages().unwrap();
    new_catalog(dir)
}

#[test]
fn test_same_page_same_object() {
    let dir = TempDir::new().unwrap();
    let (catalog, table_id) = table_with_pages(dir.path(), 1);
    let pool = BufferPool::new(4, catalog);
    let txn = TransactionId::new();
    let pid = PageId::new(table_id, 0);

    let a = pool.get_page(txn, pid, Permission::ReadWrite).unwrap();
    let b = pool.get_page(txn, pid, Permission::ReadOnly).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let first = a.read().tuple_at(0).unwrap().unwrap();
    a.write().delete_tuple(&first).unwrap();
    assert!(!b.read().is_slot_used(0));
}

#[test]
fn test_eviction_writes_dirty_victim() {
    let dir = TempDir::new().unwrap();
    let (catalog, table_id) = table_with_pages(dir.path(), 3);
    let file = catalog.file(table_id).unwrap();
    // LRU-1 is plain LRU: the least recently used page goes first
    let pool = BufferPool::with_replacer(2, catalog, Box::new(LruKReplacer::new(1)));
    let txn = TransactionId::new();
    let pids: Vec<PageId> = (0..3).map(|n| PageId::new(table_id, n)).collect();

    let page0 = pool.get_page(txn, pids[0], Permission::ReadWrite).unwrap();
    let victim = page0.read().tuple_at(4).unwrap().unwrap();
    pool.delete_tuple(txn, &victim).unwrap();
    pool.get_page(txn, pids[1], Permission::ReadOnly).unwrap();
    assert_eq!(pool.len(), 2);

    let writes_before = file.num_writes();
    pool.get_page(txn, pids[2], Permission::ReadOnly).unwrap();

    assert_eq!(pool.len(), 2);
    assert!(!pool.contains(pids[0]));
    assert!(pool.contains(pids[1]));
    assert!(pool.contains(pids[2]));
    assert_eq!(file.num_writes(), writes_before + 1);

    let on_disk = file.read_page(pids[0]).unwrap();
    assert!(!on_disk.is_slot_used(4));
    assert_eq!(on_disk.num_empty_slots(), 1);
}

#[test]
fn test_clean_eviction_does_not_write() {
    let dir = TempDir::new().unwrap();
    let (catalog, table_id) = table_with_pages(dir.path(), 3);
    let file = catalog.file(table_id).unwrap();
    let pool = BufferPool::with_replacer(1, catalog, Box::new(RandomReplacer::with_seed(3)));
    let txn = TransactionId::new();

    for n in 0..3 {
        pool.get_page(txn, PageId::new(table_id, n), Permission::ReadOnly)
            .unwrap();
        assert_eq!(pool.len(), 1);
    }
    assert_eq!(file.num_writes(), 0);
    assert_eq!(file.num_reads(), 3);
}

#[test]
fn test_random_eviction_respects_capacity() {
    let dir = TempDir::new().unwrap();
    let (catalog, table_id) = table_with_pages(dir.path(), 6);
    let pool = BufferPool::with_replacer(3, catalog, Box::new(RandomReplacer::with_seed(11)));
    let txn = TransactionId::new();

    for round in 0..4 {
        for n in 0..6 {
            let pid = PageId::new(table_id, (n + round) % 6);
            let page = pool.get_page(txn, pid, Permission::ReadOnly).unwrap();
            assert_eq!(page.read().page_id(), pid);
            assert!(pool.len() <= 3);
        }
    }
    assert_eq!(pool.len(), 3);
}

#[test]
fn test_flush_pages_by_transaction() {
    let dir = TempDir::new().unwrap();
    let (catalog, table_id) = new_catalog(dir.path());
    let pool = BufferPool::new(8, catalog.clone());
    let per_page = HeapPage::slots_per_page(desc().byte_size());

    let t1 = TransactionId::new();
    let t2 = TransactionId::new();
    for i in 0..per_page {
        pool.insert_tuple(t1, table_id, &mut row(i)).unwrap();
    }
    pool.insert_tuple(t2, table_id, &mut row(per_page)).unwrap();

    let p0 = pool.get_page(t1, PageId::new(table_id, 0), Permission::ReadOnly).unwrap();
    let p1 = pool.get_page(t2, PageId::new(table_id, 1), Permission::ReadOnly).unwrap();
    assert_eq!(p0.read().dirtier(), Some(t1));
    assert_eq!(p1.read().dirtier(), Some(t2));

    pool.flush_pages(t1).unwrap();
    assert!(!p0.read().is_dirty());
    assert!(p1.read().is_dirty());

    pool.flush_all_pages().unwrap();
    assert!(!p1.read().is_dirty());
    assert_eq!(pool.len(), 2);
}

#[test]
fn test_discard_drops_changes() {
    let dir = TempDir::new().unwrap();
    let (catalog, table_id) = table_with_pages(dir.path(), 1);
    let pool = BufferPool::new(4, catalog);
    let txn = TransactionId::new();
    let pid = PageId::new(table_id, 0);

    let page = pool.get_page(txn, pid, Permission::ReadWrite).unwrap();
    let first = page.read().tuple_at(0).unwrap().unwrap();
    pool.delete_tuple(txn, &first).unwrap();
    assert!(pool.discard_page(pid));

    let reloaded = pool.get_page(txn, pid, Permission::ReadOnly).unwrap();
    assert!(!Arc::ptr_eq(&page, &reloaded));
    assert!(reloaded.read().is_slot_used(0));
}

#[test]
fn test_flush_after_table_leaves_catalog() {
    let dir = TempDir::new().unwrap();
    let (catalog, table_id) = new_catalog(dir.path());
    let pool = BufferPool::new(4, catalog.clone());
    let txn = TransactionId::new();
    pool.insert_tuple(txn, table_id, &mut row(0)).unwrap();

    // Re-adding the name drops the old file from the catalog
    let other = HeapFile::open(dir.path().join("b.dat"), desc()).unwrap();
    catalog.add_table(other, "t", None);
    assert!(catalog.file(table_id).is_err());

    pool.flush_all_pages().unwrap();
    pool.flush_all_pages().unwrap();

    let file = HeapFile::open(dir.path().join("t.dat"), desc()).unwrap();
    let page = file.read_page(PageId::new(table_id, 0)).unwrap();
    let tuples: Vec<Tuple> = page.iter().collect::<Result<_>>().unwrap();
    assert_eq!(tuples.len(), 1);
    assert_eq!(tuples[0].field(0), Some(&Field::string("row-0")));
}

#[test]
fn test_flush_page_after_catalog_clear() {
    let dir = TempDir::new().unwrap();
    let (catalog, table_id) = new_catalog(dir.path());
    let pool = BufferPool::new(1, catalog.clone());
    let txn = TransactionId::new();
    pool.insert_tuple(txn, table_id, &mut row(0)).unwrap();
    catalog.clear();

    pool.flush_page(PageId::new(table_id, 0)).unwrap();
    let file = HeapFile::open(dir.path().join("t.dat"), desc()).unwrap();
    let page = file.read_page(PageId::new(table_id, 0)).unwrap();
    assert_eq!(page.num_empty_slots(), page.num_slots() - 1);
}

#[test]
fn test_delete_requires_record_id() {
    let dir = TempDir::new().unwrap();
    let (catalog, _) = new_catalog(dir.path());
    let pool = BufferPool::new(4, catalog);
    assert!(matches!(
        pool.delete_tuple(TransactionId::new(), &row(0)),
        Err(DbError::MissingRecordId)
    ));
}

#[test]
fn test_concurrent_inserts() {
    let dir = TempDir::new().unwrap();
    let (catalog, table_id) = new_catalog(dir.path());
    let pool = Arc::new(BufferPool::new(4, catalog.clone()));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let txn = TransactionId::new();
                for i in 0..50 {
                    pool.insert_tuple(txn, table_id, &mut row(t * 1000 + i))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    pool.flush_all_pages().unwrap();

    let file = catalog.file(table_id).unwrap();
    let mut seen = HashSet::new();
    for n in 0..file.num_pages().unwrap() {
        let page = file.read_page(PageId::new(table_id, n)).unwrap();
        for tuple in page.iter() {
            assert!(seen.insert(tuple.unwrap().field(0).cloned().unwrap()));
        }
    }
    assert_eq!(seen.len(), 200);
}

/// Records lock calls and aborts one chosen transaction.
struct RecordingLockManager {
    doomed: TransactionId,
    acquired: Mutex<Vec<(TransactionId, PageId, Permission)>>,
    released: Mutex<Vec<TransactionId>>,
}

impl LockManager for RecordingLockManager {
    fn acquire(&self, txn: TransactionId, page_id: PageId, perm: Permission) -> Result<()> {
        if txn == self.doomed {
            return Err(DbError::TransactionAborted(txn));
        }
        self.acquired.lock().push((txn, page_id, perm));
        Ok(())
    }

    fn release(&self, _txn: TransactionId, _page_id: PageId) {}

    fn holds_lock(&self, txn: TransactionId, page_id: PageId) -> bool {
        self.acquired
            .lock()
            .iter()
            .any(|&(t, p, _)| t == txn && p == page_id)
    }

    fn release_all(&self, txn: TransactionId) {
        self.acquired.lock().retain(|&(t, _, _)| t != txn);
        self.released.lock().push(txn);
    }
}

#[test]
fn test_lock_manager_hooks() {
    let dir = TempDir::new().unwrap();
    let (catalog, table_id) = table_with_pages(dir.path(), 1);
    let doomed = TransactionId::new();
    let lock_manager = Arc::new(RecordingLockManager {
        doomed,
        acquired: Mutex::new(Vec::new()),
        released: Mutex::new(Vec::new()),
    });
    let pool = BufferPool::new(4, catalog).with_lock_manager(lock_manager.clone());
    let pid = PageId::new(table_id, 0);

    let txn = TransactionId::new();
    pool.get_page(txn, pid, Permission::ReadWrite).unwrap();
    assert!(pool.holds_lock(txn, pid));
    assert_eq!(
        lock_manager.acquired.lock()[0],
        (txn, pid, Permission::ReadWrite)
    );

    assert!(matches!(
        pool.get_page(doomed, pid, Permission::ReadOnly),
        Err(DbError::TransactionAborted(t)) if t == doomed
    ));

    pool.transaction_complete(txn, true).unwrap();
    assert!(!pool.holds_lock(txn, pid));
    assert_eq!(*lock_manager.released.lock(), vec![txn]);
}

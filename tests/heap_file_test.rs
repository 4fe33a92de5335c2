//! Integration tests for heap files, driven through the buffer pool

use std::path::Path;
use std::sync::Arc;

use heapdb::common::{DbError, PageId, PAGE_SIZE};
use heapdb::execution::{drain, Operator, SeqScan};
use heapdb::storage::heap::HeapFile;
use heapdb::storage::page::HeapPage;
use heapdb::tuple::{Field, Tuple, TupleDesc, Type};
use heapdb::{Database, DatabaseConfig, TableId};
use tempfile::TempDir;

fn desc() -> Arc<TupleDesc> {
    TupleDesc::builder()
        .field("a", Type::Int)
        .field("b", Type::Int)
        .build_arc()
}

fn open_db(dir: &Path, pool_pages: usize) -> (Database, TableId) {
    let db = Database::new(DatabaseConfig::with_pool_pages(pool_pages));
    let table_id = db
        .create_table(dir.join("t.dat"), "t", desc(), None)
        .unwrap();
    (db, table_id)
}

fn scan_all(db: &Database) -> Vec<Tuple> {
    let mut scan = db.scan(db.begin(), "t").unwrap();
    scan.open().unwrap();
    let tuples = drain(&mut scan).unwrap();
    scan.close();
    tuples
}

fn insert_n(db: &Database, table_id: TableId, n: i32) {
    let txn = db.begin();
    for i in 0..n {
        let mut t = Tuple::new(desc(), vec![Field::Int(i), Field::Int(i * 2)]);
        db.buffer_pool().insert_tuple(txn, table_id, &mut t).unwrap();
    }
}

#[test]
fn test_new_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let (db, table_id) = open_db(dir.path(), 10);
    let file = db.catalog().file(table_id).unwrap();
    assert_eq!(file.num_pages().unwrap(), 0);
    assert!(scan_all(&db).is_empty());
}

#[test]
fn test_insert_fills_pages_in_order() {
    let dir = TempDir::new().unwrap();
    let (db, table_id) = open_db(dir.path(), 10);
    let slots = HeapPage::slots_per_page(8) as i32;
    let n = slots * 2 + 10;
    insert_n(&db, table_id, n);

    let file = db.catalog().file(table_id).unwrap();
    assert_eq!(file.num_pages().unwrap(), 3);

    let tuples = scan_all(&db);
    assert_eq!(tuples.len(), n as usize);
    for (i, t) in tuples.iter().enumerate() {
        let i = i as i32;
        assert_eq!(t.fields(), &[Field::Int(i), Field::Int(i * 2)]);
        let rid = t.record_id().unwrap();
        assert_eq!(rid.page_id.page_no(), (i / slots) as u32);
        assert_eq!(rid.slot_id.as_usize(), (i % slots) as usize);
    }
}

#[test]
fn test_delete_then_delete_again() {
    let dir = TempDir::new().unwrap();
    let (db, table_id) = open_db(dir.path(), 10);
    insert_n(&db, table_id, 20);

    let victim = scan_all(&db).into_iter().nth(7).unwrap();
    let txn = db.begin();
    db.buffer_pool().delete_tuple(txn, &victim).unwrap();
    assert!(matches!(
        db.buffer_pool().delete_tuple(txn, &victim),
        Err(DbError::EmptySlot(_))
    ));

    let remaining = scan_all(&db);
    assert_eq!(remaining.len(), 19);
    assert!(!remaining.contains(&victim));
}

#[test]
fn test_freed_slot_is_reused() {
    let dir = TempDir::new().unwrap();
    let (db, table_id) = open_db(dir.path(), 10);
    insert_n(&db, table_id, 5);

    let victim = scan_all(&db).into_iter().nth(2).unwrap();
    let txn = db.begin();
    db.buffer_pool().delete_tuple(txn, &victim).unwrap();

    let mut t = Tuple::new(desc(), vec![Field::Int(99), Field::Int(99)]);
    db.buffer_pool().insert_tuple(txn, table_id, &mut t).unwrap();
    assert_eq!(t.record_id(), victim.record_id());
}

#[test]
fn test_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let (db, table_id) = open_db(dir.path(), 10);
        insert_n(&db, table_id, 50);
        let victim = scan_all(&db).into_iter().next().unwrap();
        db.buffer_pool().delete_tuple(db.begin(), &victim).unwrap();
        db.buffer_pool().flush_all_pages().unwrap();
    }

    let (db, _) = open_db(dir.path(), 10);
    let tuples = scan_all(&db);
    assert_eq!(tuples.len(), 49);
    assert_eq!(tuples[0].field(0), Some(&Field::Int(1)));
}

#[test]
fn test_page_io_bounds() {
    let dir = TempDir::new().unwrap();
    let (db, table_id) = open_db(dir.path(), 10);
    insert_n(&db, table_id, 1);
    let file = db.catalog().file(table_id).unwrap();

    let past_end = PageId::new(table_id, 1);
    assert!(matches!(
        file.read_page(past_end),
        Err(DbError::PageNotFound(p)) if p == past_end
    ));
    let page = HeapPage::empty(past_end, desc());
    assert!(matches!(
        file.write_page(&page),
        Err(DbError::PageNotFound(_))
    ));

    let foreign = PageId::new(TableId::new(1), 0);
    assert!(matches!(
        file.read_page(foreign),
        Err(DbError::PageNotFound(_))
    ));
}

#[test]
fn test_short_trailing_page_reads_zero_filled() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.dat");
    // Half a page: slot 0 used, holding (5, 6)
    let header = HeapPage::header_size(HeapPage::slots_per_page(8));
    let mut bytes = vec![0u8; PAGE_SIZE / 2];
    bytes[0] = 0x80;
    bytes[header..header + 8].copy_from_slice(&[0, 0, 0, 5, 0, 0, 0, 6]);
    std::fs::write(&path, &bytes).unwrap();

    let file = HeapFile::open(&path, desc()).unwrap();
    assert_eq!(file.num_pages().unwrap(), 1);
    let page = file.read_page(PageId::new(file.table_id(), 0)).unwrap();
    let tuple = page.tuple_at(0).unwrap().unwrap();
    assert_eq!(tuple.fields(), &[Field::Int(5), Field::Int(6)]);
    assert_eq!(file.num_reads(), 1);
}

#[test]
fn test_table_id_follows_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("same.dat");
    let a = HeapFile::open(&path, desc()).unwrap();
    let b = HeapFile::open(dir.path().join(".").join("same.dat"), desc()).unwrap();
    let c = HeapFile::open(dir.path().join("other.dat"), desc()).unwrap();
    assert_eq!(a.table_id(), b.table_id());
    assert_ne!(a.table_id(), c.table_id());
    assert_eq!(a.path(), b.path());
}

#[test]
fn test_scan_is_unaffected_by_small_pool() {
    let dir = TempDir::new().unwrap();
    let (db, table_id) = open_db(dir.path(), 2);
    let n = HeapPage::slots_per_page(8) as i32 * 4;
    insert_n(&db, table_id, n);
    db.buffer_pool().flush_all_pages().unwrap();

    let mut scan = SeqScan::new(db.buffer_pool().clone(), db.begin(), table_id, Some("x")).unwrap();
    assert_eq!(scan.tuple_desc().field_name(0), Some("x.a"));
    scan.open().unwrap();
    let tuples = drain(&mut scan).unwrap();
    assert_eq!(tuples.len(), n as usize);
    assert!(db.buffer_pool().len() <= 2);
}

//! HeapDB - a page-oriented heap storage and iterator-model query engine in Rust
//!
//! Tables are stored as heap files of fixed-size slotted pages. Every page access
//! goes through a bounded buffer pool, and queries are trees of pull-based
//! (Volcano) operators.
//!
//! # Architecture
//!
//! - **Tuples** (`tuple`): typed values, schemas and rows
//!   - `Field`: INT or fixed-width STRING value
//!   - `TupleDesc`: ordered, typed, named fields
//!   - `Tuple`: one row, with the record id of its slot once stored
//!
//! - **Storage Layer** (`storage`): on-disk layout
//!   - `HeapPage`: slot bitmap header followed by fixed-width tuple slots
//!   - `HeapFile`: one table as a flat sequence of heap pages
//!
//! - **Buffer Pool** (`buffer`): page cache shared by all queries
//!   - `BufferPool`: caches pages, routes inserts/deletes, writes back dirty pages
//!   - `RandomReplacer` / `LruKReplacer`: eviction policies
//!
//! - **Catalog** (`catalog`): table registry, loaded from a schema file
//!
//! - **Transactions** (`transaction`): the page-lock hook called by the buffer pool
//!
//! - **Execution** (`execution`): scan, filter, join, aggregate, insert, delete
//!
//! # Example
//!
//! ```rust,no_run
//! use heapdb::execution::{drain, Filter, Operator, Predicate};
//! use heapdb::tuple::CompareOp;
//! use heapdb::{Database, DatabaseConfig};
//!
//! // Load tables from `catalog.txt`, e.g. "users (id int pk, name string)"
//! let db = Database::open("catalog.txt", DatabaseConfig::default()).unwrap();
//! let txn = db.begin();
//!
//! // SELECT * FROM users WHERE id > 10
//! let scan = db.scan(txn, "users").unwrap();
//! let predicate = Predicate::new(0, CompareOp::GreaterThan, 10);
//! let mut filter = Filter::new(predicate, Box::new(scan)).unwrap();
//! filter.open().unwrap();
//! for tuple in drain(&mut filter).unwrap() {
//!     println!("{}", tuple);
//! }
//! filter.close();
//! db.commit(txn).unwrap();
//! ```

pub mod buffer;
pub mod catalog;
pub mod common;
pub mod database;
pub mod execution;
pub mod storage;
pub mod transaction;
pub mod tuple;

// Re-export commonly used types at the crate root
pub use common::{
    DatabaseConfig, DbError, PageId, Permission, RecordId, Result, SlotId, TableId, TransactionId,
};
pub use database::Database;

use thiserror::Error;

use super::types::{PageId, RecordId, TableId, TransactionId};

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operator is not open")]
    IteratorNotOpen,

    #[error("Operator is already open")]
    IteratorAlreadyOpen,

    #[error("No more tuples")]
    NoSuchElement,

    #[error("Table {0} not found")]
    TableNotFound(TableId),

    #[error("Table '{0}' not found")]
    TableNameNotFound(String),

    #[error("Page {0} not found")]
    PageNotFound(PageId),

    #[error("Page {page_id} is corrupted: {reason}")]
    CorruptedPage { page_id: PageId, reason: String },

    #[error("Page {0} is full")]
    PageFull(PageId),

    #[error("Buffer pool has no page to evict")]
    BufferPoolFull,

    #[error("Tuple has no record id")]
    MissingRecordId,

    #[error("Record {0} does not belong to this page")]
    RecordNotOnPage(RecordId),

    #[error("Slot of record {0} is already empty")]
    EmptySlot(RecordId),

    #[error("Schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Field index {index} out of bounds for {len} fields")]
    FieldIndexOutOfBounds { index: usize, len: usize },

    #[error("Unsupported aggregate: {0}")]
    UnsupportedAggregate(String),

    #[error("Invalid catalog entry on line {line}: {reason}")]
    CatalogParse { line: usize, reason: String },

    #[error("Transaction {0} aborted")]
    TransactionAborted(TransactionId),
}

pub type Result<T> = std::result::Result<T, DbError>;

use crate::common::{PageId, Permission, Result, TransactionId};

/// Page-level locking hooks called by the buffer pool.
///
/// `acquire` runs before every page access and may block or fail; an error aborts
/// the access and is returned to the caller unchanged (usually
/// [`DbError::TransactionAborted`](crate::common::DbError::TransactionAborted)).
pub trait LockManager: Send + Sync {
    /// Acquires a lock on a page for a transaction.
    fn acquire(&self, txn: TransactionId, page_id: PageId, perm: Permission) -> Result<()>;

    /// Releases one page lock early.
    fn release(&self, txn: TransactionId, page_id: PageId);

    /// Returns whether the transaction holds a lock on the page.
    fn holds_lock(&self, txn: TransactionId, page_id: PageId) -> bool;

    /// Releases every lock held by the transaction.
    fn release_all(&self, txn: TransactionId);
}

/// Lock manager that grants everything and tracks nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLockManager;

impl LockManager for NoLockManager {
    fn acquire(&self, _txn: TransactionId, _page_id: PageId, _perm: Permission) -> Result<()> {
        Ok(())
    }

    fn release(&self, _txn: TransactionId, _page_id: PageId) {}

    fn holds_lock(&self, _txn: TransactionId, _page_id: PageId) -> bool {
        false
    }

    fn release_all(&self, _txn: TransactionId) {}
}

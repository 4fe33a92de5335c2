use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Table identifier - derived from the canonical path of the table's heap file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u64);

impl TableId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Derives a table id from a file path.
    ///
    /// Uses 64-bit FNV-1a over the path bytes so the same file maps to the same
    /// id in every process. The path should already be canonical.
    pub fn from_path(path: &Path) -> Self {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

        let hash = path
            .to_string_lossy()
            .bytes()
            .fold(FNV_OFFSET, |acc, b| (acc ^ b as u64).wrapping_mul(FNV_PRIME));
        Self(hash)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({:#x})", self.0)
    }
}

/// Page identifier - a page number within one table's heap file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    table_id: TableId,
    page_no: u32,
}

impl PageId {
    pub fn new(table_id: TableId, page_no: u32) -> Self {
        Self { table_id, page_no }
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn page_no(&self) -> u32 {
        self.page_no
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageId({:#x}, {})", self.table_id.0, self.page_no)
    }
}

/// Slot identifier within a heap page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u16);

impl SlotId {
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

/// Record identifier - combination of page ID and slot ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_id: SlotId,
}

impl RecordId {
    pub fn new(page_id: PageId, slot_id: SlotId) -> Self {
        Self { page_id, slot_id }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.page_id, self.slot_id.0)
    }
}

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Transaction identifier, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Allocates a fresh transaction id.
    pub fn new() -> Self {
        Self(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txn({})", self.0)
    }
}

/// Access intent declared when fetching a page.
///
/// Advisory only: no lock manager in this crate enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

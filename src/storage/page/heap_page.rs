use std::sync::Arc;

use bytes::BytesMut;

use crate::common::{DbError, PageId, RecordId, Result, SlotId, TransactionId, PAGE_SIZE};
use crate::tuple::{Tuple, TupleDesc};

/// Heap page layout:
///
/// +----------------------+
/// | Slot bitmap header   |  ceil(num_slots / 8) bytes, MSB-first per byte
/// +----------------------+
/// | [slot 0]             |  tuple_size bytes each
/// | [slot 1]             |
/// | ...                  |
/// | [slot num_slots - 1] |
/// +----------------------+
/// | unused tail          |
/// +----------------------+
///
/// A set header bit marks an occupied slot. An all-zero page is a valid empty page.
/// The page keeps its raw bytes, so bytes of freed slots and of the unused tail
/// survive a decode/encode round trip unchanged.
#[derive(Debug, Clone)]
pub struct HeapPage {
    /// Identity of this page; fixed at construction
    page_id: PageId,
    /// Descriptor of the tuples stored in this page
    desc: Arc<TupleDesc>,
    /// Raw page bytes
    data: Box<[u8; PAGE_SIZE]>,
    /// Number of tuple slots
    num_slots: usize,
    /// Whether the page has been modified since it was last written to disk
    dirty: bool,
    /// Transaction that last dirtied the page
    dirtier: Option<TransactionId>,
}

impl HeapPage {
    /// Returns the number of tuple slots a page holds for tuples of `tuple_size` bytes.
    ///
    /// Each slot costs its tuple bytes plus one header bit:
    /// `floor(8 * PAGE_SIZE / (8 * tuple_size + 1))`.
    pub fn slots_per_page(tuple_size: usize) -> usize {
        (PAGE_SIZE * 8) / (tuple_size * 8 + 1)
    }

    /// Returns the size of the slot bitmap header in bytes.
    pub fn header_size(num_slots: usize) -> usize {
        num_slots.div_ceil(8)
    }

    /// Returns the bytes of an empty page.
    pub fn empty_page_data() -> [u8; PAGE_SIZE] {
        [0u8; PAGE_SIZE]
    }

    /// Creates an empty page.
    pub fn empty(page_id: PageId, desc: Arc<TupleDesc>) -> Self {
        let num_slots = Self::slots_per_page(desc.byte_size());
        Self {
            page_id,
            desc,
            data: Box::new(Self::empty_page_data()),
            num_slots,
            dirty: false,
            dirtier: None,
        }
    }

    /// Decodes a page from its on-disk bytes.
    /// Every occupied slot is validated against the descriptor.
    pub fn from_bytes(page_id: PageId, desc: Arc<TupleDesc>, data: &[u8]) -> Result<Self> {
        if data.len() != PAGE_SIZE {
            return Err(DbError::CorruptedPage {
                page_id,
                reason: format!("expected {} bytes, got {}", PAGE_SIZE, data.len()),
            });
        }

        let mut page = Self::empty(page_id, desc);
        page.data.copy_from_slice(data);

        for slot in 0..page.num_slots {
            if page.is_slot_used(slot) {
                page.decode_slot(slot)?;
            }
        }

        Ok(page)
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the descriptor of the stored tuples.
    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    /// Returns the number of tuple slots on this page.
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Returns the number of free slots.
    pub fn num_empty_slots(&self) -> usize {
        (0..self.num_slots).filter(|&s| !self.is_slot_used(s)).count()
    }

    /// Returns whether the given slot holds a tuple.
    pub fn is_slot_used(&self, slot: usize) -> bool {
        slot < self.num_slots && self.data[slot / 8] & (0x80 >> (slot % 8)) != 0
    }

    /// Returns the page bytes as they are written to disk.
    pub fn page_data(&self) -> &[u8] {
        &self.data[..]
    }

    /// Inserts a tuple into the lowest free slot and sets its record id.
    pub fn insert_tuple(&mut self, tuple: &mut Tuple) -> Result<RecordId> {
        if **tuple.desc() != *self.desc {
            return Err(DbError::SchemaMismatch {
                expected: self.desc.to_string(),
                found: tuple.desc().to_string(),
            });
        }

        // Field types are only debug-asserted at construction
        let mismatch = tuple
            .fields()
            .iter()
            .zip(self.desc.types())
            .find(|(field, expected)| field.field_type() != *expected);
        if let Some((field, expected)) = mismatch {
            return Err(DbError::TypeMismatch {
                expected: expected.to_string(),
                found: field.field_type().to_string(),
            });
        }

        let slot = (0..self.num_slots)
            .find(|&s| !self.is_slot_used(s))
            .ok_or(DbError::PageFull(self.page_id))?;

        let mut buf = BytesMut::with_capacity(self.desc.byte_size());
        tuple.serialize(&mut buf);
        let offset = self.slot_offset(slot);
        self.data[offset..offset + buf.len()].copy_from_slice(&buf);
        self.set_slot_used(slot, true);

        let record_id = RecordId::new(self.page_id, SlotId::new(slot as u16));
        tuple.set_record_id(Some(record_id));
        Ok(record_id)
    }

    /// Deletes a tuple by clearing its slot bit. The slot bytes are left as is.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> Result<()> {
        let record_id = tuple.record_id().ok_or(DbError::MissingRecordId)?;
        let slot = record_id.slot_id.as_usize();

        if record_id.page_id != self.page_id || slot >= self.num_slots {
            return Err(DbError::RecordNotOnPage(record_id));
        }
        if !self.is_slot_used(slot) {
            return Err(DbError::EmptySlot(record_id));
        }

        self.set_slot_used(slot, false);
        Ok(())
    }

    /// Returns the tuple stored in the given slot, or None if the slot is free.
    pub fn tuple_at(&self, slot: usize) -> Result<Option<Tuple>> {
        if !self.is_slot_used(slot) {
            return Ok(None);
        }
        self.decode_slot(slot).map(Some)
    }

    /// Iterates over the stored tuples in increasing slot order.
    pub fn iter(&self) -> HeapPageIter<'_> {
        HeapPageIter {
            page: self,
            next_slot: 0,
        }
    }

    /// Marks the page dirty (or clean) on behalf of a transaction.
    pub fn mark_dirty(&mut self, dirty: bool, txn: Option<TransactionId>) {
        self.dirty = dirty;
        self.dirtier = if dirty { txn } else { None };
    }

    /// Returns whether the page has unwritten modifications.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the transaction that last dirtied the page.
    pub fn dirtier(&self) -> Option<TransactionId> {
        self.dirtier
    }

    fn slot_offset(&self, slot: usize) -> usize {
        Self::header_size(self.num_slots) + slot * self.desc.byte_size()
    }

    fn set_slot_used(&mut self, slot: usize, used: bool) {
        let mask = 0x80u8 >> (slot % 8);
        if used {
            self.data[slot / 8] |= mask;
        } else {
            self.data[slot / 8] &= !mask;
        }
    }

    fn decode_slot(&self, slot: usize) -> Result<Tuple> {
        let offset = self.slot_offset(slot);
        let bytes = &self.data[offset..offset + self.desc.byte_size()];
        let mut tuple =
            Tuple::from_bytes(self.desc.clone(), bytes).ok_or_else(|| DbError::CorruptedPage {
                page_id: self.page_id,
                reason: format!("slot {} does not hold a valid tuple", slot),
            })?;
        tuple.set_record_id(Some(RecordId::new(self.page_id, SlotId::new(slot as u16))));
        Ok(tuple)
    }
}

/// Iterator over the occupied slots of a heap page.
pub struct HeapPageIter<'a> {
    page: &'a HeapPage,
    next_slot: usize,
}

impl Iterator for HeapPageIter<'_> {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_slot < self.page.num_slots {
            let slot = self.next_slot;
            self.next_slot += 1;
            if self.page.is_slot_used(slot) {
                return Some(self.page.decode_slot(slot));
            }
        }
        None
    }
}

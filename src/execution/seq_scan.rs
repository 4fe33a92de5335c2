use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::common::{Result, TableId, TransactionId};
use crate::storage::heap::{HeapFile, HeapFileIterator};
use crate::tuple::{Tuple, TupleDesc};

use super::{Operator, OperatorState};

/// Sequential scan over every tuple of one table, in page then slot order.
///
/// With an alias, output fields are named `alias.field`. Output tuples keep their
/// record ids so they can feed a [`Delete`](super::Delete).
pub struct SeqScan {
    pool: Arc<BufferPool>,
    txn: TransactionId,
    table_id: TableId,
    alias: Option<String>,
    desc: Arc<TupleDesc>,
    iter: HeapFileIterator,
    state: OperatorState,
}

impl SeqScan {
    /// Creates a scan of `table_id`, optionally aliasing its field names.
    pub fn new(
        pool: Arc<BufferPool>,
        txn: TransactionId,
        table_id: TableId,
        alias: Option<&str>,
    ) -> Result<Self> {
        let file = pool.catalog().file(table_id)?;
        let desc = Self::output_desc(&file, alias);
        let iter = file.iter(Arc::clone(&pool), txn);

        Ok(Self {
            pool,
            txn,
            table_id,
            alias: alias.map(str::to_string),
            desc,
            iter,
            state: OperatorState::new(),
        })
    }

    /// Returns the scanned table's id.
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Returns the scanned table's catalog name.
    pub fn table_name(&self) -> Result<String> {
        self.pool.catalog().table_name(self.table_id)
    }

    /// Returns the alias, if any.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Points the scan at another table and alias. The scan is left closed.
    pub fn reset(&mut self, table_id: TableId, alias: Option<&str>) -> Result<()> {
        let file = self.pool.catalog().file(table_id)?;
        self.close();
        self.desc = Self::output_desc(&file, alias);
        self.iter = file.iter(Arc::clone(&self.pool), self.txn);
        self.table_id = table_id;
        self.alias = alias.map(str::to_string);
        Ok(())
    }

    fn output_desc(file: &HeapFile, alias: Option<&str>) -> Arc<TupleDesc> {
        match alias {
            Some(alias) => Arc::new(file.desc().with_prefix(alias)),
            None => Arc::clone(file.desc()),
        }
    }
}

impl Operator for SeqScan {
    fn open(&mut self) -> Result<()> {
        self.state.ensure_closed()?;
        self.iter.open();
        self.state.mark_open();
        Ok(())
    }

    fn close(&mut self) {
        self.iter.close();
        self.state.mark_closed();
    }

    fn rewind(&mut self) -> Result<()> {
        self.state.ensure_open()?;
        self.iter.rewind();
        self.state.clear_lookahead();
        Ok(())
    }

    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        if !self.iter.has_next()? {
            return Ok(None);
        }
        let mut tuple = self.iter.next()?;
        tuple.set_desc(Arc::clone(&self.desc));
        Ok(Some(tuple))
    }

    fn state(&mut self) -> &mut OperatorState {
        &mut self.state
    }
}

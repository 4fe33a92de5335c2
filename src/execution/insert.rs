use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::common::{DbError, Result, TableId, TransactionId};
use crate::tuple::{Field, Tuple, TupleDesc, Type};

use super::{BoxedOperator, Operator, OperatorState};

/// Schema of the single tuple Insert and Delete produce.
pub(crate) fn count_desc() -> Arc<TupleDesc> {
    TupleDesc::builder().field("count", Type::Int).build_arc()
}

/// Inserts every child tuple into a table and emits the number inserted.
///
/// The first fetch drains the child and returns a one-field count tuple; later
/// fetches return nothing until the operator is rewound.
pub struct Insert {
    pool: Arc<BufferPool>,
    txn: TransactionId,
    child: BoxedOperator,
    table_id: TableId,
    desc: Arc<TupleDesc>,
    /// Set once the child has been drained
    done: bool,
    state: OperatorState,
}

impl Insert {
    /// Creates an insert into `table_id`. Fails if the child's schema differs from
    /// the table's.
    pub fn new(
        pool: Arc<BufferPool>,
        txn: TransactionId,
        child: BoxedOperator,
        table_id: TableId,
    ) -> Result<Self> {
        let table_desc = pool.catalog().tuple_desc(table_id)?;
        if **child.tuple_desc() != *table_desc {
            return Err(DbError::SchemaMismatch {
                expected: table_desc.to_string(),
                found: child.tuple_desc().to_string(),
            });
        }

        Ok(Self {
            pool,
            txn,
            child,
            table_id,
            desc: count_desc(),
            done: false,
            state: OperatorState::new(),
        })
    }
}

impl Operator for Insert {
    fn open(&mut self) -> Result<()> {
        self.state.ensure_closed()?;
        self.child.open()?;
        self.done = false;
        self.state.mark_open();
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.state.mark_closed();
    }

    fn rewind(&mut self) -> Result<()> {
        self.state.ensure_open()?;
        self.child.rewind()?;
        self.done = false;
        self.state.clear_lookahead();
        Ok(())
    }

    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let mut count = 0;
        while self.child.has_next()? {
            let mut tuple = self.child.next()?;
            self.pool.insert_tuple(self.txn, self.table_id, &mut tuple)?;
            count += 1;
        }
        Ok(Some(Tuple::new(Arc::clone(&self.desc), vec![Field::Int(count)])))
    }

    fn state(&mut self) -> &mut OperatorState {
        &mut self.state
    }
}

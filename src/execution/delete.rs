use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::common::{Result, TransactionId};
use crate::tuple::{Field, Tuple, TupleDesc};

use super::insert::count_desc;
use super::{BoxedOperator, Operator, OperatorState};

/// Deletes every child tuple, located by its record id, and emits the number
/// deleted.
///
/// Behaves like [`Insert`](super::Insert): one count tuple on the first fetch,
/// nothing afterwards until rewound.
pub struct Delete {
    pool: Arc<BufferPool>,
    txn: TransactionId,
    child: BoxedOperator,
    desc: Arc<TupleDesc>,
    done: bool,
    state: OperatorState,
}

impl Delete {
    pub fn new(pool: Arc<BufferPool>, txn: TransactionId, child: BoxedOperator) -> Self {
        Self {
            pool,
            txn,
            child,
            desc: count_desc(),
            done: false,
            state: OperatorState::new(),
        }
    }
}

impl Operator for Delete {
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
            let tuple = self.child.next()?;
            self.pool.delete_tuple(self.txn, &tuple)?;
            count += 1;
        }
        Ok(Some(Tuple::new(Arc::clone(&self.desc), vec![Field::Int(count)])))
    }

    fn state(&mut self) -> &mut OperatorState {
        &mut self.state
    }
}

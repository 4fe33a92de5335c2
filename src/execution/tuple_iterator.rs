use std::sync::Arc;

use crate::common::Result;
use crate::tuple::{Tuple, TupleDesc};

use super::{Operator, OperatorState};

/// Operator over an in-memory list of tuples.
pub struct TupleIterator {
    desc: Arc<TupleDesc>,
    tuples: Vec<Tuple>,
    /// Index of the next tuple to return
    position: usize,
    state: OperatorState,
}

impl TupleIterator {
    /// Creates an iterator over `tuples`, which must all match `desc`.
    pub fn new(desc: Arc<TupleDesc>, tuples: Vec<Tuple>) -> Self {
        debug_assert!(tuples.iter().all(|t| **t.desc() == *desc));
        Self {
            desc,
            tuples,
            position: 0,
            state: OperatorState::new(),
        }
    }
}

impl Operator for TupleIterator {
    fn open(&mut self) -> Result<()> {
        self.state.ensure_closed()?;
        self.position = 0;
        self.state.mark_open();
        Ok(())
    }

    fn close(&mut self) {
        self.state.mark_closed();
    }

    fn rewind(&mut self) -> Result<()> {
        self.state.ensure_open()?;
        self.position = 0;
        self.state.clear_lookahead();
        Ok(())
    }

    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        let next = self.tuples.get(self.position).cloned();
        if next.is_some() {
            self.position += 1;
        }
        Ok(next)
    }

    fn state(&mut self) -> &mut OperatorState {
        &mut self.state
    }
}

use std::sync::Arc;

use crate::common::{DbError, Result};
use crate::tuple::{Tuple, TupleDesc};

use super::{BoxedOperator, Operator, OperatorState, Predicate};

/// Passes through the child tuples that satisfy a predicate.
pub struct Filter {
    predicate: Predicate,
    child: BoxedOperator,
    state: OperatorState,
}

impl Filter {
    /// Creates a filter. Fails if the predicate reads a field the child does not have.
    pub fn new(predicate: Predicate, child: BoxedOperator) -> Result<Self> {
        let len = child.tuple_desc().num_fields();
        if predicate.max_field() >= len {
            return Err(DbError::FieldIndexOutOfBounds {
                index: predicate.max_field(),
                len,
            });
        }
        Ok(Self {
            predicate,
            child,
            state: OperatorState::new(),
        })
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl Operator for Filter {
    fn open(&mut self) -> Result<()> {
        self.state.ensure_closed()?;
        self.child.open()?;
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
        self.state.clear_lookahead();
        Ok(())
    }

    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        self.child.tuple_desc()
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            if self.predicate.filter(&tuple) {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn state(&mut self) -> &mut OperatorState {
        &mut self.state
    }
}

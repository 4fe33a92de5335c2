use std::sync::Arc;

use crate::common::{DbError, Result};
use crate::tuple::{Tuple, TupleDesc};

/// Open flag and one-tuple lookahead shared by every operator.
///
/// `has_next` may fetch a tuple ahead of `next`; it is parked here until `next`
/// takes it.
#[derive(Debug, Default)]
pub struct OperatorState {
    open: bool,
    lookahead: Option<Tuple>,
}

impl OperatorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Fails unless the operator is open.
    pub fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(DbError::IteratorNotOpen)
        }
    }

    /// Fails if the operator is already open.
    pub fn ensure_closed(&self) -> Result<()> {
        if self.open {
            Err(DbError::IteratorAlreadyOpen)
        } else {
            Ok(())
        }
    }

    pub fn mark_open(&mut self) {
        self.open = true;
        self.lookahead = None;
    }

    pub fn mark_closed(&mut self) {
        self.open = false;
        self.lookahead = None;
    }

    /// Drops the lookahead tuple, e.g. on rewind.
    pub fn clear_lookahead(&mut self) {
        self.lookahead = None;
    }
}

/// A pull-based (Volcano) query operator.
///
/// Protocol: `open` once, then `has_next`/`next` until exhausted, optionally
/// `rewind` to start over, and finally `close`. Calling `has_next`, `next` or
/// `rewind` on a closed operator fails with [`DbError::IteratorNotOpen`]; `next`
/// past the end fails with [`DbError::NoSuchElement`].
///
/// Implementors provide [`fetch_next`](Operator::fetch_next), which returns the next
/// tuple or `None` at the end; the lookahead logic lives in the provided methods.
pub trait Operator: Send {
    /// Opens this operator and its children.
    fn open(&mut self) -> Result<()>;

    /// Closes this operator and its children. Closing twice is harmless.
    fn close(&mut self);

    /// Restarts iteration from the first tuple.
    fn rewind(&mut self) -> Result<()>;

    /// Returns the schema of the tuples this operator produces.
    fn tuple_desc(&self) -> &Arc<TupleDesc>;

    /// Produces the next tuple, or None when exhausted. Called only while open.
    fn fetch_next(&mut self) -> Result<Option<Tuple>>;

    /// Returns the shared open/lookahead state.
    fn state(&mut self) -> &mut OperatorState;

    /// Returns whether another tuple is available.
    fn has_next(&mut self) -> Result<bool> {
        self.state().ensure_open()?;
        if self.state().lookahead.is_none() {
            let next = self.fetch_next()?;
            self.state().lookahead = next;
        }
        Ok(self.state().lookahead.is_some())
    }

    /// Returns the next tuple.
    fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        self.state().lookahead.take().ok_or(DbError::NoSuchElement)
    }
}

/// Owned operator tree node.
pub type BoxedOperator = Box<dyn Operator>;

/// Collects every remaining tuple of an open operator.
pub fn drain(op: &mut dyn Operator) -> Result<Vec<Tuple>> {
    let mut tuples = Vec::new();
    while op.has_next()? {
        tuples.push(op.next()?);
    }
    Ok(tuples)
}

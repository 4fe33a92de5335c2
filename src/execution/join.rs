use std::sync::Arc;

use crate::common::{DbError, Result};
use crate::tuple::{Tuple, TupleDesc};

use super::{BoxedOperator, JoinPredicate, Operator, OperatorState};

/// Nested-loop join.
///
/// For each left (outer) tuple the whole right (inner) child is scanned, and every
/// matching pair is emitted as the left fields followed by the right fields. The
/// inner child is rewound after each outer tuple. Join columns are not deduplicated.
pub struct Join {
    predicate: JoinPredicate,
    left: BoxedOperator,
    right: BoxedOperator,
    desc: Arc<TupleDesc>,
    /// Outer tuple currently being matched
    current_left: Option<Tuple>,
    state: OperatorState,
}

impl Join {
    /// Creates a join. Fails if the predicate names a field either side lacks.
    pub fn new(predicate: JoinPredicate, left: BoxedOperator, right: BoxedOperator) -> Result<Self> {
        check_field(predicate.left_field(), left.tuple_desc())?;
        check_field(predicate.right_field(), right.tuple_desc())?;

        let desc = Arc::new(TupleDesc::merge(left.tuple_desc(), right.tuple_desc()));
        Ok(Self {
            predicate,
            left,
            right,
            desc,
            current_left: None,
            state: OperatorState::new(),
        })
    }

    pub fn predicate(&self) -> &JoinPredicate {
        &self.predicate
    }

    /// Returns the name of the left join field.
    pub fn left_field_name(&self) -> &str {
        self.left
            .tuple_desc()
            .field_name(self.predicate.left_field())
            .unwrap_or_default()
    }

    /// Returns the name of the right join field.
    pub fn right_field_name(&self) -> &str {
        self.right
            .tuple_desc()
            .field_name(self.predicate.right_field())
            .unwrap_or_default()
    }
}

fn check_field(index: usize, desc: &TupleDesc) -> Result<()> {
    if index >= desc.num_fields() {
        return Err(DbError::FieldIndexOutOfBounds {
            index,
            len: desc.num_fields(),
        });
    }
    Ok(())
}

impl Operator for Join {
    fn open(&mut self) -> Result<()> {
        self.state.ensure_closed()?;
        self.left.open()?;
        if let Err(e) = self.right.open() {
            self.left.close();
            return Err(e);
        }
        self.current_left = None;
        self.state.mark_open();
        Ok(())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
        self.current_left = None;
        self.state.mark_closed();
    }

    fn rewind(&mut self) -> Result<()> {
        self.state.ensure_open()?;
        self.left.rewind()?;
        self.right.rewind()?;
        self.current_left = None;
        self.state.clear_lookahead();
        Ok(())
    }

    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        loop {
            if self.current_left.is_none() {
                if !self.left.has_next()? {
                    return Ok(None);
                }
                self.current_left = Some(self.left.next()?);
            }
            let Some(outer) = self.current_left.as_ref() else {
                return Ok(None);
            };

            while self.right.has_next()? {
                let inner = self.right.next()?;
                if self.predicate.filter(outer, &inner) {
                    return Ok(Some(Tuple::merge(Arc::clone(&self.desc), outer, &inner)));
                }
            }

            self.right.rewind()?;
            self.current_left = None;
        }
    }

    fn state(&mut self) -> &mut OperatorState {
        &mut self.state
    }
}

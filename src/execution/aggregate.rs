use std::sync::Arc;

use crate::common::{DbError, Result};
use crate::tuple::{FieldDesc, Tuple, TupleDesc, Type};

use super::{
    AggregateOp, Aggregator, BoxedOperator, IntegerAggregator, Operator, OperatorState,
    StringAggregator, TupleIterator,
};

/// Computes one aggregate over its child, optionally grouped by one field.
///
/// Blocking: `open` consumes the whole child and materializes the results. Output
/// is `(group value, op(field))` when grouped and `(op(field))` otherwise; the
/// aggregate column is always INT.
pub struct Aggregate {
    child: BoxedOperator,
    agg_field: usize,
    group_field: Option<usize>,
    op: AggregateOp,
    desc: Arc<TupleDesc>,
    /// Materialized results while open
    results: Option<TupleIterator>,
    state: OperatorState,
}

impl Aggregate {
    /// Creates an aggregate of `child[agg_field]`, grouped by `child[group_field]`.
    ///
    /// Fails if a field index is out of range or the op is not defined for the
    /// aggregated field's type.
    pub fn new(
        child: BoxedOperator,
        agg_field: usize,
        group_field: Option<usize>,
        op: AggregateOp,
    ) -> Result<Self> {
        let child_desc = child.tuple_desc();
        let len = child_desc.num_fields();
        let field = |index: usize| {
            child_desc
                .field(index)
                .ok_or(DbError::FieldIndexOutOfBounds { index, len })
        };

        let agg_desc = field(agg_field)?;
        if agg_desc.field_type() == Type::String && op != AggregateOp::Count {
            return Err(DbError::UnsupportedAggregate(format!(
                "{} over STRING field '{}'",
                op,
                agg_desc.name()
            )));
        }

        let mut fields = Vec::with_capacity(2);
        if let Some(index) = group_field {
            fields.push(field(index)?.clone());
        }
        fields.push(FieldDesc::new(
            format!("{}({})", op.name(), agg_desc.name()),
            Type::Int,
        ));
        let desc = Arc::new(TupleDesc::new(fields));

        Ok(Self {
            child,
            agg_field,
            group_field,
            op,
            desc,
            results: None,
            state: OperatorState::new(),
        })
    }

    /// Returns the grouping field index, if grouped.
    pub fn group_field(&self) -> Option<usize> {
        self.group_field
    }

    /// Returns the grouping field's name in the output, if grouped.
    pub fn group_field_name(&self) -> Option<&str> {
        self.group_field.and_then(|_| self.desc.field_name(0))
    }

    /// Returns the aggregated field index.
    pub fn aggregate_field(&self) -> usize {
        self.agg_field
    }

    /// Returns the aggregated field's name in the child.
    pub fn aggregate_field_name(&self) -> &str {
        self.child
            .tuple_desc()
            .field_name(self.agg_field)
            .unwrap_or_default()
    }

    /// Returns the aggregate op.
    pub fn aggregate_op(&self) -> AggregateOp {
        self.op
    }

    fn aggregator(&self) -> Result<Box<dyn Aggregator>> {
        let desc = Arc::clone(&self.desc);
        match self.child.tuple_desc().field_type(self.agg_field) {
            Some(Type::String) => Ok(Box::new(StringAggregator::new(
                self.group_field,
                self.agg_field,
                self.op,
                desc,
            )?)),
            _ => Ok(Box::new(IntegerAggregator::new(
                self.group_field,
                self.agg_field,
                self.op,
                desc,
            ))),
        }
    }
}

impl Aggregate {
    /// Drains the open child into an opened result iterator.
    fn aggregate_child(&mut self) -> Result<TupleIterator> {
        let mut aggregator = self.aggregator()?;
        while self.child.has_next()? {
            aggregator.merge_tuple_into_group(&self.child.next()?)?;
        }

        let mut results = TupleIterator::new(Arc::clone(&self.desc), aggregator.results());
        results.open()?;
        Ok(results)
    }
}

impl Operator for Aggregate {
    fn open(&mut self) -> Result<()> {
        self.state.ensure_closed()?;
        self.child.open()?;

        match self.aggregate_child() {
            Ok(results) => {
                self.results = Some(results);
                self.state.mark_open();
                Ok(())
            }
            Err(e) => {
                self.child.close();
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        self.child.close();
        self.results = None;
        self.state.mark_closed();
    }

    fn rewind(&mut self) -> Result<()> {
        self.state.ensure_open()?;
        self.results
            .as_mut()
            .ok_or(DbError::IteratorNotOpen)?
            .rewind()?;
        self.state.clear_lookahead();
        Ok(())
    }

    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        let results = self.results.as_mut().ok_or(DbError::IteratorNotOpen)?;
        if results.has_next()? {
            Ok(Some(results.next()?))
        } else {
            Ok(None)
        }
    }

    fn state(&mut self) -> &mut OperatorState {
        &mut self.state
    }
}

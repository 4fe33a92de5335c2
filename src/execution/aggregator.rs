use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::common::{DbError, Result};
use crate::tuple::{Field, Tuple, TupleDesc};

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl AggregateOp {
    /// Returns the lowercase name used in synthesized field names.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Count => "count",
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Folds tuples into per-group aggregate values.
pub trait Aggregator: Send {
    /// Adds one input tuple to its group.
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> Result<()>;

    /// Returns one result tuple per group, groups in first-seen order.
    fn results(&self) -> Vec<Tuple>;
}

/// Groups in first-seen order with per-group accumulator `S`.
/// The key is None when there is no grouping.
struct Groups<S> {
    index: HashMap<Option<Field>, usize>,
    entries: Vec<(Option<Field>, S)>,
}

impl<S> Groups<S> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Returns the accumulator of `key`, or None if the group is new.
    fn get_mut(&mut self, key: &Option<Field>) -> Option<&mut S> {
        let pos = *self.index.get(key)?;
        Some(&mut self.entries[pos].1)
    }

    fn insert(&mut self, key: Option<Field>, value: S) {
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }

    fn to_tuples(&self, desc: &Arc<TupleDesc>, value: impl Fn(&S) -> i32) -> Vec<Tuple> {
        self.entries
            .iter()
            .map(|(key, state)| {
                let fields = key
                    .iter()
                    .cloned()
                    .chain(std::iter::once(Field::Int(value(state))))
                    .collect();
                Tuple::new(Arc::clone(desc), fields)
            })
            .collect()
    }
}

fn group_key(tuple: &Tuple, group_field: Option<usize>) -> Result<Option<Field>> {
    group_field
        .map(|index| {
            tuple
                .field(index)
                .cloned()
                .ok_or(DbError::FieldIndexOutOfBounds {
                    index,
                    len: tuple.len(),
                })
        })
        .transpose()
}

struct IntGroup {
    count: i32,
    sum: i32,
    /// Current aggregate value
    value: i32,
}

/// Aggregates an INT field with any [`AggregateOp`].
///
/// AVG keeps a running sum and count and recomputes the truncated average on every
/// merge. SUM and AVG use wrapping 32-bit arithmetic.
pub struct IntegerAggregator {
    group_field: Option<usize>,
    agg_field: usize,
    op: AggregateOp,
    /// Output schema: (group value, aggregate) or (aggregate)
    desc: Arc<TupleDesc>,
    groups: Groups<IntGroup>,
}

impl IntegerAggregator {
    pub fn new(
        group_field: Option<usize>,
        agg_field: usize,
        op: AggregateOp,
        desc: Arc<TupleDesc>,
    ) -> Self {
        Self {
            group_field,
            agg_field,
            op,
            desc,
            groups: Groups::new(),
        }
    }
}

impl Aggregator for IntegerAggregator {
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> Result<()> {
        let key = group_key(tuple, self.group_field)?;
        let value = match tuple.field(self.agg_field) {
            Some(Field::Int(v)) => *v,
            Some(other) => {
                return Err(DbError::TypeMismatch {
                    expected: "INT".to_string(),
                    found: other.field_type().to_string(),
                })
            }
            None => {
                return Err(DbError::FieldIndexOutOfBounds {
                    index: self.agg_field,
                    len: tuple.len(),
                })
            }
        };

        let op = self.op;
        match self.groups.get_mut(&key) {
            Some(group) => {
                group.count += 1;
                group.sum = group.sum.wrapping_add(value);
                group.value = match op {
                    AggregateOp::Min => group.value.min(value),
                    AggregateOp::Max => group.value.max(value),
                    AggregateOp::Sum => group.sum,
                    AggregateOp::Avg => group.sum.wrapping_div(group.count),
                    AggregateOp::Count => group.count,
                };
            }
            None => {
                let initial = if op == AggregateOp::Count { 1 } else { value };
                self.groups.insert(
                    key,
                    IntGroup {
                        count: 1,
                        sum: value,
                        value: initial,
                    },
                );
            }
        }
        Ok(())
    }

    fn results(&self) -> Vec<Tuple> {
        // Ungrouped COUNT of nothing is 0; the other ops have no value
        if self.group_field.is_none()
            && self.groups.entries.is_empty()
            && self.op == AggregateOp::Count
        {
            return vec![Tuple::new(Arc::clone(&self.desc), vec![Field::Int(0)])];
        }
        self.groups.to_tuples(&self.desc, |g| g.value)
    }
}

/// Aggregates a STRING field. Only COUNT is supported.
pub struct StringAggregator {
    group_field: Option<usize>,
    agg_field: usize,
    desc: Arc<TupleDesc>,
    groups: Groups<i32>,
}

impl StringAggregator {
    /// Creates a string aggregator; any op other than COUNT is rejected.
    pub fn new(
        group_field: Option<usize>,
        agg_field: usize,
        op: AggregateOp,
        desc: Arc<TupleDesc>,
    ) -> Result<Self> {
        if op != AggregateOp::Count {
            return Err(DbError::UnsupportedAggregate(format!(
                "{} over a STRING field",
                op
            )));
        }
        Ok(Self {
            group_field,
            agg_field,
            desc,
            groups: Groups::new(),
        })
    }
}

impl Aggregator for StringAggregator {
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> Result<()> {
        let key = group_key(tuple, self.group_field)?;
        if tuple.field(self.agg_field).is_none() {
            return Err(DbError::FieldIndexOutOfBounds {
                index: self.agg_field,
                len: tuple.len(),
            });
        }

        match self.groups.get_mut(&key) {
            Some(count) => *count += 1,
            None => self.groups.insert(key, 1),
        }
        Ok(())
    }

    fn results(&self) -> Vec<Tuple> {
        if self.group_field.is_none() && self.groups.entries.is_empty() {
            return vec![Tuple::new(Arc::clone(&self.desc), vec![Field::Int(0)])];
        }
        self.groups.to_tuples(&self.desc, |count| *count)
    }
}

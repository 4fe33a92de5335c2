use std::fmt;

use crate::tuple::{CompareOp, Field, Tuple};

/// Right-hand side of a [`Predicate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A constant value
    Constant(Field),
    /// Another field of the same tuple, by index
    Field(usize),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(value) => write!(f, "{}", value),
            Operand::Field(index) => write!(f, "f{}", index),
        }
    }
}

/// Compares one field of a tuple against a constant or another field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    field: usize,
    op: CompareOp,
    operand: Operand,
}

impl Predicate {
    /// Creates `tuple[field] op constant`.
    pub fn new(field: usize, op: CompareOp, constant: impl Into<Field>) -> Self {
        Self {
            field,
            op,
            operand: Operand::Constant(constant.into()),
        }
    }

    /// Creates `tuple[field] op tuple[other]`.
    pub fn between_fields(field: usize, op: CompareOp, other: usize) -> Self {
        Self {
            field,
            op,
            operand: Operand::Field(other),
        }
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Returns the highest field index this predicate reads.
    pub fn max_field(&self) -> usize {
        match self.operand {
            Operand::Field(other) => self.field.max(other),
            Operand::Constant(_) => self.field,
        }
    }

    /// Evaluates the predicate. Missing fields and mismatched types never match.
    pub fn filter(&self, tuple: &Tuple) -> bool {
        let Some(left) = tuple.field(self.field) else {
            return false;
        };
        let right = match &self.operand {
            Operand::Constant(value) => Some(value),
            Operand::Field(index) => tuple.field(*index),
        };
        right.is_some_and(|right| left.compare(self.op, right))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{} {} {}", self.field, self.op, self.operand)
    }
}

/// Compares a field of a left tuple with a field of a right tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinPredicate {
    left_field: usize,
    op: CompareOp,
    right_field: usize,
}

impl JoinPredicate {
    pub fn new(left_field: usize, op: CompareOp, right_field: usize) -> Self {
        Self {
            left_field,
            op,
            right_field,
        }
    }

    pub fn left_field(&self) -> usize {
        self.left_field
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn right_field(&self) -> usize {
        self.right_field
    }

    /// Evaluates `left[left_field] op right[right_field]`.
    pub fn filter(&self, left: &Tuple, right: &Tuple) -> bool {
        match (left.field(self.left_field), right.field(self.right_field)) {
            (Some(l), Some(r)) => l.compare(self.op, r),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::{TupleDesc, Type};

    fn tuple(a: i32, b: i32, s: &str) -> Tuple {
        let desc = TupleDesc::builder()
            .field("a", Type::Int)
            .field("b", Type::Int)
            .field("s", Type::String)
            .build_arc();
        Tuple::new(desc, vec![Field::Int(a), Field::Int(b), Field::string(s)])
    }

    #[test]
    fn test_constant_predicate() {
        let t = tuple(5, 1, "hello");
        assert!(Predicate::new(0, CompareOp::GreaterThan, 4).filter(&t));
        assert!(!Predicate::new(0, CompareOp::GreaterThan, 5).filter(&t));
        assert!(Predicate::new(0, CompareOp::LessThanOrEq, 5).filter(&t));
        assert!(Predicate::new(2, CompareOp::Like, "ell").filter(&t));
        assert!(!Predicate::new(2, CompareOp::Equals, "ell").filter(&t));
    }

    #[test]
    fn test_field_predicate() {
        let t = tuple(5, 1, "x");
        assert!(Predicate::between_fields(0, CompareOp::GreaterThan, 1).filter(&t));
        assert!(!Predicate::between_fields(0, CompareOp::Equals, 1).filter(&t));
        assert_eq!(Predicate::between_fields(0, CompareOp::Equals, 2).max_field(), 2);
    }

    #[test]
    fn test_mismatches_never_match() {
        let t = tuple(5, 1, "x");
        assert!(!Predicate::new(2, CompareOp::Equals, 5).filter(&t));
        assert!(!Predicate::new(7, CompareOp::Equals, 5).filter(&t));
        assert!(!Predicate::between_fields(0, CompareOp::NotEquals, 9).filter(&t));
    }

    #[test]
    fn test_join_predicate() {
        let left = tuple(1, 2, "l");
        let right = tuple(2, 3, "r");
        assert!(JoinPredicate::new(1, CompareOp::Equals, 0).filter(&left, &right));
        assert!(!JoinPredicate::new(0, CompareOp::Equals, 0).filter(&left, &right));
        assert!(JoinPredicate::new(0, CompareOp::LessThan, 1).filter(&left, &right));
        assert!(!JoinPredicate::new(0, CompareOp::LessThan, 9).filter(&left, &right));
    }

    #[test]
    fn test_display() {
        assert_eq!(Predicate::new(1, CompareOp::Equals, 3).to_string(), "f1 = 3");
    }
}

use std::fmt;

use bytes::{Buf, BufMut};

use crate::common::STRING_LEN;

use super::Type;

/// Comparison operators usable in filter and join predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
    /// Substring match on strings, equality on integers
    Like,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Equals => "=",
            CompareOp::NotEquals => "<>",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEq => ">=",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEq => "<=",
            CompareOp::Like => "LIKE",
        };
        write!(f, "{}", s)
    }
}

/// A typed value stored in a tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// 32-bit signed integer
    Int(i32),

    /// String of at most STRING_LEN bytes
    String(String),
}

impl Field {
    /// Creates a string field, truncating to STRING_LEN bytes on a character boundary.
    pub fn string(s: impl Into<String>) -> Self {
        let mut s = s.into();
        if s.len() > STRING_LEN {
            let mut end = STRING_LEN;
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            s.truncate(end);
        }
        Field::String(s)
    }

    /// Returns the type of this field.
    pub fn field_type(&self) -> Type {
        match self {
            Field::Int(_) => Type::Int,
            Field::String(_) => Type::String,
        }
    }

    /// Returns the integer value, if this is an INT field.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Field::Int(v) => Some(*v),
            Field::String(_) => None,
        }
    }

    /// Returns the string value, if this is a STRING field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Int(_) => None,
            Field::String(s) => Some(s),
        }
    }

    /// Writes the field in its fixed-width on-disk format.
    pub fn serialize(&self, buf: &mut impl BufMut) {
        match self {
            Field::Int(v) => buf.put_i32(*v),
            Field::String(s) => {
                let mut len = s.len().min(STRING_LEN);
                while !s.is_char_boundary(len) {
                    len -= 1;
                }
                buf.put_i32(len as i32);
                buf.put_slice(&s.as_bytes()[..len]);
                buf.put_bytes(0, STRING_LEN - len);
            }
        }
    }

    /// Reads a field of the given type from its fixed-width on-disk format.
    /// Returns None if the buffer is too short or holds an invalid length prefix.
    pub fn deserialize(buf: &mut impl Buf, field_type: Type) -> Option<Self> {
        if buf.remaining() < field_type.fixed_size() {
            return None;
        }

        match field_type {
            Type::Int => Some(Field::Int(buf.get_i32())),
            Type::String => {
                let len = buf.get_i32();
                if len < 0 || len as usize > STRING_LEN {
                    return None;
                }
                let mut payload = [0u8; STRING_LEN];
                buf.copy_to_slice(&mut payload);
                let s = String::from_utf8_lossy(&payload[..len as usize]).into_owned();
                Some(Field::String(s))
            }
        }
    }

    /// Evaluates `self op other`.
    /// Fields of different types never satisfy a comparison.
    pub fn compare(&self, op: CompareOp, other: &Field) -> bool {
        match (self, other) {
            (Field::Int(a), Field::Int(b)) => match op {
                CompareOp::Equals | CompareOp::Like => a == b,
                CompareOp::NotEquals => a != b,
                CompareOp::GreaterThan => a > b,
                CompareOp::GreaterThanOrEq => a >= b,
                CompareOp::LessThan => a < b,
                CompareOp::LessThanOrEq => a <= b,
            },
            (Field::String(a), Field::String(b)) => match op {
                CompareOp::Equals => a == b,
                CompareOp::NotEquals => a != b,
                CompareOp::GreaterThan => a > b,
                CompareOp::GreaterThanOrEq => a >= b,
                CompareOp::LessThan => a < b,
                CompareOp::LessThanOrEq => a <= b,
                CompareOp::Like => a.contains(b.as_str()),
            },
            _ => false,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Field::Int(v)
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::string(s)
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::string(s)
    }
}

use std::fmt;

use crate::common::STRING_LEN;

/// Represents the field types supported by the database.
/// Every type has a fixed on-disk width so tuples of a table are all the same size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// 32-bit signed integer: 4 bytes, big-endian
    Int,

    /// Fixed-width string: 4-byte big-endian length + STRING_LEN payload bytes,
    /// zero padded
    String,
}

impl Type {
    /// Returns the serialized size of a field of this type in bytes.
    pub fn fixed_size(&self) -> usize {
        match self {
            Type::Int => 4,
            Type::String => STRING_LEN + 4,
        }
    }

    /// Parses a type name as written in a catalog schema file (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "int" => Some(Type::Int),
            "string" => Some(Type::String),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "INT"),
            Type::String => write!(f, "STRING"),
        }
    }
}

use std::fmt;
use std::sync::Arc;

use super::Type;

/// One (name, type) entry of a tuple descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDesc {
    /// Field name; informational only
    name: String,

    /// Field type
    field_type: Type,
}

impl FieldDesc {
    /// Creates a new field description.
    pub fn new(name: impl Into<String>, field_type: Type) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field type.
    pub fn field_type(&self) -> Type {
        self.field_type
    }
}

/// Describes the schema of a tuple: an ordered list of typed, named fields.
///
/// Two descriptors are equal when their field types match position by position;
/// names are not compared.
#[derive(Debug, Clone)]
pub struct TupleDesc {
    /// Fields in schema order
    fields: Vec<FieldDesc>,

    /// Serialized width of one tuple in bytes
    byte_size: usize,
}

impl TupleDesc {
    /// Creates a descriptor from field descriptions.
    pub fn new(fields: Vec<FieldDesc>) -> Self {
        let byte_size = fields.iter().map(|f| f.field_type.fixed_size()).sum();
        Self { fields, byte_size }
    }

    /// Creates a descriptor with unnamed fields.
    pub fn from_types(types: &[Type]) -> Self {
        Self::new(types.iter().map(|&t| FieldDesc::new("", t)).collect())
    }

    /// Creates a new builder for constructing a descriptor.
    pub fn builder() -> TupleDescBuilder {
        TupleDescBuilder::new()
    }

    /// Returns the number of fields.
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Returns the field description at the given index.
    pub fn field(&self, index: usize) -> Option<&FieldDesc> {
        self.fields.get(index)
    }

    /// Returns the name of the field at the given index.
    pub fn field_name(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|f| f.name())
    }

    /// Returns the type of the field at the given index.
    pub fn field_type(&self, index: usize) -> Option<Type> {
        self.fields.get(index).map(|f| f.field_type())
    }

    /// Returns the index of the first field with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns an iterator over all fields.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDesc> {
        self.fields.iter()
    }

    /// Returns an iterator over the field types.
    pub fn types(&self) -> impl Iterator<Item = Type> + '_ {
        self.fields.iter().map(|f| f.field_type)
    }

    /// Returns the serialized size of a tuple with this descriptor in bytes.
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// Concatenates two descriptors: all fields of `first`, then all fields of `second`.
    pub fn merge(first: &TupleDesc, second: &TupleDesc) -> TupleDesc {
        let mut fields = Vec::with_capacity(first.num_fields() + second.num_fields());
        fields.extend(first.fields.iter().cloned());
        fields.extend(second.fields.iter().cloned());
        TupleDesc::new(fields)
    }

    /// Returns a copy with every field renamed to `prefix.name`.
    pub fn with_prefix(&self, prefix: &str) -> TupleDesc {
        TupleDesc::new(
            self.fields
                .iter()
                .map(|f| FieldDesc::new(format!("{}.{}", prefix, f.name), f.field_type))
                .collect(),
        )
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.num_fields() == other.num_fields() && self.types().eq(other.types())
    }
}

impl Eq for TupleDesc {}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}({})", field.field_type, field.name)?;
        }
        Ok(())
    }
}

/// Builder for constructing tuple descriptors fluently.
pub struct TupleDescBuilder {
    fields: Vec<FieldDesc>,
}

impl TupleDescBuilder {
    /// Creates a new, empty builder.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds a field.
    pub fn field(mut self, name: impl Into<String>, field_type: Type) -> Self {
        self.fields.push(FieldDesc::new(name, field_type));
        self
    }

    /// Builds the descriptor.
    pub fn build(self) -> TupleDesc {
        TupleDesc::new(self.fields)
    }

    /// Builds the descriptor wrapped in an Arc for shared ownership.
    pub fn build_arc(self) -> Arc<TupleDesc> {
        Arc::new(self.build())
    }
}

impl Default for TupleDescBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_desc() -> TupleDesc {
        TupleDesc::builder()
            .field("id", Type::Int)
            .field("name", Type::String)
            .field("age", Type::Int)
            .build()
    }

    #[test]
    fn test_desc_accessors() {
        let desc = create_test_desc();
        assert_eq!(desc.num_fields(), 3);
        assert_eq!(desc.field_name(1), Some("name"));
        assert_eq!(desc.field_type(2), Some(Type::Int));
        assert_eq!(desc.field_type(3), None);
        assert_eq!(desc.index_of("age"), Some(2));
        assert_eq!(desc.index_of("missing"), None);
        assert_eq!(desc.byte_size(), 4 + 132 + 4);
    }

    #[test]
    fn test_equality_ignores_names() {
        let a = create_test_desc();
        let b = TupleDesc::from_types(&[Type::Int, Type::String, Type::Int]);
        let c = TupleDesc::from_types(&[Type::Int, Type::Int, Type::String]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, TupleDesc::from_types(&[Type::Int, Type::String]));
    }

    #[test]
    fn test_merge() {
        let a = create_test_desc();
        let b = TupleDesc::builder().field("id", Type::Int).build();
        let merged = TupleDesc::merge(&a, &b);

        assert_eq!(merged.num_fields(), 4);
        assert_eq!(merged.field_name(3), Some("id"));
        assert_eq!(merged.byte_size(), a.byte_size() + b.byte_size());
        // Duplicate names are kept; lookup finds the first
        assert_eq!(merged.index_of("id"), Some(0));
    }

    #[test]
    fn test_with_prefix() {
        let desc = create_test_desc().with_prefix("u");
        assert_eq!(desc.field_name(0), Some("u.id"));
        assert_eq!(desc.field_name(1), Some("u.name"));
        assert_eq!(desc, create_test_desc());
    }

    #[test]
    fn test_display() {
        let desc = TupleDesc::builder()
            .field("a", Type::Int)
            .field("b", Type::String)
            .build();
        assert_eq!(desc.to_string(), "INT(a), STRING(b)");
    }
}

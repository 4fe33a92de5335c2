use std::fmt;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};

use crate::common::{DbError, RecordId, Result};

use super::{Field, TupleDesc};

/// Represents a single row of a table.
///
/// A tuple holds one field per entry of its descriptor and, once stored in a heap
/// page, the record id of the slot it occupies.
///
/// ## Tuple Binary Format
///
/// ```text
/// +-----------+-----------+-----+-----------+
/// | Field 0   | Field 1   | ... | Field n-1 |
/// +-----------+-----------+-----+-----------+
/// ```
///
/// Every field has the fixed width of its type, so the serialized size of a tuple
/// is always `TupleDesc::byte_size()`.
#[derive(Debug, Clone)]
pub struct Tuple {
    /// The descriptor of this tuple
    desc: Arc<TupleDesc>,

    /// The field values (in descriptor order)
    fields: Vec<Field>,

    /// Location on disk, set once the tuple is stored
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Creates a new tuple with the given descriptor and fields.
    ///
    /// # Panics
    /// Panics if the number of fields doesn't match the descriptor.
    pub fn new(desc: Arc<TupleDesc>, fields: Vec<Field>) -> Self {
        assert_eq!(
            fields.len(),
            desc.num_fields(),
            "Field count must match descriptor field count"
        );
        debug_assert!(
            fields
                .iter()
                .zip(desc.types())
                .all(|(f, t)| f.field_type() == t),
            "Field types must match descriptor"
        );
        Self {
            desc,
            fields,
            record_id: None,
        }
    }

    /// Concatenates two tuples under the given (merged) descriptor.
    pub fn merge(desc: Arc<TupleDesc>, first: &Tuple, second: &Tuple) -> Self {
        let mut fields = Vec::with_capacity(first.len() + second.len());
        fields.extend(first.fields.iter().cloned());
        fields.extend(second.fields.iter().cloned());
        Self::new(desc, fields)
    }

    /// Creates a tuple from its serialized bytes.
    pub fn from_bytes(desc: Arc<TupleDesc>, data: &[u8]) -> Option<Self> {
        let mut buf = data;
        let fields: Option<Vec<Field>> = desc
            .types()
            .map(|t| Field::deserialize(&mut buf, t))
            .collect();
        Some(Self::new(desc, fields?))
    }

    /// Builds a tuple without checking field types against the descriptor.
    #[cfg(test)]
    pub(crate) fn new_unchecked(desc: Arc<TupleDesc>, fields: Vec<Field>) -> Self {
        Self {
            desc,
            fields,
            record_id: None,
        }
    }

    /// Returns the descriptor of this tuple.
    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    /// Replaces the descriptor, e.g. to re-label fields with a table alias.
    ///
    /// # Panics
    /// Panics (in debug builds) if the new descriptor's types differ.
    pub fn set_desc(&mut self, desc: Arc<TupleDesc>) {
        debug_assert!(*self.desc == *desc, "Descriptor types must not change");
        self.desc = desc;
    }

    /// Returns the field at the given index.
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Returns all fields in this tuple.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Sets the field at the given index.
    /// Fails if the index is out of bounds or the field has the wrong type.
    pub fn set_field(&mut self, index: usize, field: Field) -> Result<()> {
        let expected = self
            .desc
            .field_type(index)
            .ok_or(DbError::FieldIndexOutOfBounds {
                index,
                len: self.fields.len(),
            })?;
        if field.field_type() != expected {
            return Err(DbError::TypeMismatch {
                expected: expected.to_string(),
                found: field.field_type().to_string(),
            });
        }
        self.fields[index] = field;
        Ok(())
    }

    /// Returns the record id, if this tuple is stored on a page.
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    /// Sets or clears the record id.
    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }

    /// Returns the number of fields in this tuple.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if this tuple has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Writes the tuple's fields in order.
    pub fn serialize(&self, buf: &mut impl BufMut) {
        for field in &self.fields {
            field.serialize(buf);
        }
    }

    /// Serializes the tuple to bytes for storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.desc.byte_size());
        self.serialize(&mut buf);
        buf.to_vec()
    }
}

/// Tuples compare by their field values; the record id is ignored.
impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for Tuple {}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{PageId, SlotId, TableId};
    use crate::tuple::Type;

    fn create_test_desc() -> Arc<TupleDesc> {
        TupleDesc::builder()
            .field("id", Type::Int)
            .field("name", Type::String)
            .field("age", Type::Int)
            .build_arc()
    }

    fn alice(desc: &Arc<TupleDesc>) -> Tuple {
        Tuple::new(
            desc.clone(),
            vec![Field::Int(1), Field::string("Alice"), Field::Int(30)],
        )
    }

    #[test]
    fn test_tuple_creation() {
        let desc = create_test_desc();
        let tuple = alice(&desc);

        assert_eq!(tuple.len(), 3);
        assert_eq!(tuple.field(0), Some(&Field::Int(1)));
        assert_eq!(tuple.field(1), Some(&Field::string("Alice")));
        assert_eq!(tuple.field(3), None);
        assert_eq!(tuple.record_id(), None);
    }

    #[test]
    #[should_panic(expected = "Field count must match")]
    fn test_tuple_arity_mismatch_panics() {
        let desc = create_test_desc();
        Tuple::new(desc, vec![Field::Int(1)]);
    }

    #[test]
    fn test_set_field() {
        let desc = create_test_desc();
        let mut tuple = alice(&desc);

        tuple.set_field(2, Field::Int(31)).unwrap();
        assert_eq!(tuple.field(2), Some(&Field::Int(31)));

        assert!(matches!(
            tuple.set_field(2, Field::string("x")),
            Err(DbError::TypeMismatch { .. })
        ));
        assert!(matches!(
            tuple.set_field(9, Field::Int(0)),
            Err(DbError::FieldIndexOutOfBounds { index: 9, len: 3 })
        ));
    }

    #[test]
    fn test_serialized_width() {
        let desc = create_test_desc();
        let bytes = alice(&desc).to_bytes();
        assert_eq!(bytes.len(), desc.byte_size());

        let recovered = Tuple::from_bytes(desc.clone(), &bytes).unwrap();
        assert_eq!(recovered, alice(&desc));
    }

    #[test]
    fn test_merge() {
        let left_desc = TupleDesc::from_types(&[Type::Int, Type::Int]);
        let right_desc = TupleDesc::from_types(&[Type::Int]);
        let merged_desc = Arc::new(TupleDesc::merge(&left_desc, &right_desc));

        let left = Tuple::new(Arc::new(left_desc), vec![Field::Int(1), Field::Int(2)]);
        let right = Tuple::new(Arc::new(right_desc), vec![Field::Int(3)]);
        let merged = Tuple::merge(merged_desc, &left, &right);

        assert_eq!(merged.fields(), &[Field::Int(1), Field::Int(2), Field::Int(3)]);
    }

    #[test]
    fn test_equality_ignores_record_id() {
        let desc = create_test_desc();
        let mut a = alice(&desc);
        let b = alice(&desc);
        a.set_record_id(Some(RecordId::new(
            PageId::new(TableId::new(1), 0),
            SlotId::new(0),
        )));
        assert_eq!(a, b);
    }

    #[test]
    fn test_display() {
        let desc = create_test_desc();
        assert_eq!(alice(&desc).to_string(), "1\tAlice\t30");
    }
}

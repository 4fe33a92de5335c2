mod data_type;
mod schema;
mod tuple;
mod value;

pub use data_type::Type;
pub use schema::{FieldDesc, TupleDesc, TupleDescBuilder};
pub use tuple::Tuple;
pub use value::{CompareOp, Field};

mod catalog;
mod schema_file;

pub use catalog::*;
pub use schema_file::*;

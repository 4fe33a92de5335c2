mod aggregate;
mod aggregator;
mod delete;
mod filter;
mod insert;
mod join;
mod operator;
mod predicate;
mod seq_scan;
mod tuple_iterator;

pub use aggregate::*;
pub use aggregator::*;
pub use delete::*;
pub use filter::*;
pub use insert::*;
pub use join::*;
pub use operator::*;
pub use predicate::*;
pub use seq_scan::*;
pub use tuple_iterator::*;

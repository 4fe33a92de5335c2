mod buffer_pool;
mod lru_k_replacer;
mod replacer;

pub use buffer_pool::*;
pub use lru_k_replacer::*;
pub use replacer::*;

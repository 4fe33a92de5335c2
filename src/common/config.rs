/// Size of a page in bytes (4 KB)
pub const PAGE_SIZE: usize = 4096;

/// Default number of pages cached by the buffer pool
pub const DEFAULT_POOL_PAGES: usize = 50;

/// Maximum payload of a STRING field in bytes (excluding the length prefix)
pub const STRING_LEN: usize = 128;

/// Default K value for the LRU-K replacement policy
pub const DEFAULT_LRUK_K: usize = 2;

/// Which page the buffer pool evicts when it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacementPolicy {
    /// Evict a cached page chosen uniformly at random
    #[default]
    Random,
    /// Evict the page with the largest backward k-distance
    LruK(usize),
}

/// Runtime settings for a [`Database`](crate::Database) instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Maximum number of pages held by the buffer pool
    pub pool_pages: usize,
    /// Eviction policy of the buffer pool
    pub replacement: ReplacementPolicy,
}

impl DatabaseConfig {
    /// Creates a config with the given pool size and the default policy.
    pub fn with_pool_pages(pool_pages: usize) -> Self {
        Self {
            pool_pages,
            ..Self::default()
        }
    }

    /// Sets the replacement policy.
    pub fn replacement(mut self, replacement: ReplacementPolicy) -> Self {
        self.replacement = replacement;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            pool_pages: DEFAULT_POOL_PAGES,
            replacement: ReplacementPolicy::default(),
        }
    }
}

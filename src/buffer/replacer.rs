use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::{PageId, ReplacementPolicy};

use super::LruKReplacer;

/// Eviction policy of the buffer pool.
///
/// The buffer pool reports every page it admits or hands out and every page it
/// drops; the replacer only decides which tracked page leaves next. All calls are
/// made while the pool's state lock is held.
pub trait Replacer: Send {
    /// Records an access to a cached page, starting to track it if needed.
    fn record_access(&mut self, page_id: PageId);

    /// Stops tracking a page that left the cache.
    fn remove(&mut self, page_id: PageId);

    /// Chooses a victim and stops tracking it.
    /// Returns None if no page is tracked.
    fn evict(&mut self) -> Option<PageId>;

    /// Returns the number of tracked pages.
    fn size(&self) -> usize;
}

/// Creates the replacer for a configured policy.
pub fn replacer_for(policy: ReplacementPolicy) -> Box<dyn Replacer> {
    match policy {
        ReplacementPolicy::Random => Box::new(RandomReplacer::new()),
        ReplacementPolicy::LruK(k) => Box::new(LruKReplacer::new(k)),
    }
}

/// Evicts a tracked page chosen uniformly at random.
pub struct RandomReplacer {
    /// Tracked pages in arbitrary order
    pages: Vec<PageId>,
    /// Position of each page in `pages`
    positions: HashMap<PageId, usize>,
    rng: StdRng,
}

impl RandomReplacer {
    /// Creates a replacer seeded from the operating system.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates a replacer with a fixed seed, for reproducible eviction order.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            pages: Vec::new(),
            positions: HashMap::new(),
            rng,
        }
    }
}

impl Default for RandomReplacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Replacer for RandomReplacer {
    fn record_access(&mut self, page_id: PageId) {
        if !self.positions.contains_key(&page_id) {
            self.positions.insert(page_id, self.pages.len());
            self.pages.push(page_id);
        }
    }

    fn remove(&mut self, page_id: PageId) {
        if let Some(pos) = self.positions.remove(&page_id) {
            self.pages.swap_remove(pos);
            if let Some(&moved) = self.pages.get(pos) {
                self.positions.insert(moved, pos);
            }
        }
    }

    fn evict(&mut self) -> Option<PageId> {
        if self.pages.is_empty() {
            return None;
        }
        let victim = self.pages[self.rng.gen_range(0..self.pages.len())];
        self.remove(victim);
        Some(victim)
    }

    fn size(&self) -> usize {
        self.pages.len()
    }
}

use std::collections::{HashMap, VecDeque};

use crate::common::PageId;

use super::Replacer;

type Timestamp = u64;

/// Access history of one cached page
#[derive(Debug, Default)]
struct PageAccessInfo {
    /// Last k access timestamps (most recent at back)
    history: VecDeque<Timestamp>,
}

impl PageAccessInfo {
    fn record_access(&mut self, timestamp: Timestamp, k: usize) {
        self.history.push_back(timestamp);
        while self.history.len() > k {
            self.history.pop_front();
        }
    }

    /// Backward k-distance, or None (+inf) with fewer than k accesses
    fn k_distance(&self, now: Timestamp, k: usize) -> Option<Timestamp> {
        if self.history.len() < k {
            None
        } else {
            Some(now - self.history[self.history.len() - k])
        }
    }

    fn earliest_timestamp(&self) -> Option<Timestamp> {
        self.history.front().copied()
    }
}

/// LRU-K replacement policy.
///
/// Evicts the page whose backward k-distance (time since its kth most recent
/// access) is largest. Pages with fewer than k accesses have +inf distance and go
/// first, oldest first access breaking ties.
pub struct LruKReplacer {
    k: usize,
    /// Logical clock, advanced on every access
    current_timestamp: Timestamp,
    page_info: HashMap<PageId, PageAccessInfo>,
}

impl LruKReplacer {
    /// Creates an LRU-K replacer. A `k` of zero is treated as one.
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            current_timestamp: 0,
            page_info: HashMap::new(),
        }
    }

    /// Returns the k value of this replacer.
    pub fn k(&self) -> usize {
        self.k
    }
}

impl Replacer for LruKReplacer {
    fn record_access(&mut self, page_id: PageId) {
        let timestamp = self.current_timestamp;
        self.current_timestamp += 1;
        self.page_info
            .entry(page_id)
            .or_default()
            .record_access(timestamp, self.k);
    }

    fn remove(&mut self, page_id: PageId) {
        self.page_info.remove(&page_id);
    }

    fn evict(&mut self) -> Option<PageId> {
        let now = self.current_timestamp;

        let mut victim: Option<PageId> = None;
        let mut victim_k_dist: Option<Timestamp> = None;
        let mut victim_earliest_ts: Option<Timestamp> = None;

        for (page_id, info) in self.page_info.iter() {
            let k_dist = info.k_distance(now, self.k);
            let earliest_ts = info.earliest_timestamp();

            let should_replace = match (victim_k_dist, k_dist) {
                (None, Some(_)) => false,
                (Some(_), None) => true,
                (None, None) => match (victim_earliest_ts, earliest_ts) {
                    (Some(v_ts), Some(c_ts)) => c_ts < v_ts,
                    (None, Some(_)) => true,
                    _ => false,
                },
                (Some(v_dist), Some(c_dist)) => c_dist > v_dist,
            };

            if victim.is_none() || should_replace {
                victim = Some(*page_id);
                victim_k_dist = k_dist;
                victim_earliest_ts = earliest_ts;
            }
        }

        if let Some(page_id) = victim {
            self.page_info.remove(&page_id);
        }
        victim
    }

    fn size(&self) -> usize {
        self.page_info.len()
    }
}

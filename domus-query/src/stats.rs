//! Query cache counters.

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from a fresh entry.
    pub hits: u64,
    /// Reads that started a network fetch.
    pub misses: u64,
    /// Reads that joined a fetch already in flight.
    pub deduplicated: u64,
    /// Fetches that settled with an error.
    pub failures: u64,
    /// Entries currently held.
    pub entry_count: u64,
    /// Fetches currently outstanding.
    pub in_flight: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0); joins count as hits.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.deduplicated;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }
}

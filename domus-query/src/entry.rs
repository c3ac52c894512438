//! Cache entries and the freshness predicate.

use domus_core::{EpochMillis, FetchError};
use std::time::Duration;

/// Lifecycle status of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// One slot of the cache.
///
/// Invariants maintained by the reducer:
/// - `status == Success` implies `fetched_at > 0` and `error.is_none()`
/// - `status == Error` implies `error.is_some()`
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub data: Option<T>,
    pub status: CacheStatus,
    pub error: Option<FetchError>,
    /// Epoch millis of the last successful fetch or local mutation; 0 if never.
    pub fetched_at: EpochMillis,
}

impl<T> CacheEntry<T> {
    pub fn idle() -> Self {
        Self {
            data: None,
            status: CacheStatus::Idle,
            error: None,
            fetched_at: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == CacheStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == CacheStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == CacheStatus::Error
    }

    pub fn is_fresh(&self, ttl: Duration, now: EpochMillis) -> bool {
        is_fresh(self, ttl, now)
    }

    /// Time since the last successful fetch, `None` if there never was one.
    pub fn staleness(&self, now: EpochMillis) -> Option<Duration> {
        if self.fetched_at <= 0 {
            return None;
        }
        let age = now.saturating_sub(self.fetched_at).max(0);
        Some(Duration::from_millis(age.unsigned_abs()))
    }
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self::idle()
    }
}

/// `fetched_at > 0 && now - fetched_at < ttl`.
pub fn is_fresh<T>(entry: &CacheEntry<T>, ttl: Duration, now: EpochMillis) -> bool {
    if entry.fetched_at <= 0 {
        return false;
    }
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now.saturating_sub(entry.fetched_at) < ttl_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetched(at: EpochMillis) -> CacheEntry<u32> {
        CacheEntry {
            data: Some(1),
            status: CacheStatus::Success,
            error: None,
            fetched_at: at,
        }
    }

    #[test]
    fn test_never_fetched_is_never_fresh() {
        let entry = CacheEntry::<u32>::idle();
        assert!(!is_fresh(&entry, Duration::from_secs(3600), 10));
        assert_eq!(entry.staleness(10), None);
    }

    #[test]
    fn test_fresh_within_ttl_only() {
        let entry = fetched(1_000);
        let ttl = Duration::from_millis(500);
        assert!(entry.is_fresh(ttl, 1_000));
        assert!(entry.is_fresh(ttl, 1_499));
        assert!(!entry.is_fresh(ttl, 1_500));
        assert!(!entry.is_fresh(ttl, 9_000));
    }

    #[test]
    fn test_zero_ttl_is_never_fresh() {
        let entry = fetched(1_000);
        assert!(!entry.is_fresh(Duration::ZERO, 1_000));
    }

    #[test]
    fn test_staleness() {
        let entry = fetched(1_000);
        assert_eq!(entry.staleness(1_250), Some(Duration::from_millis(250)));
        assert_eq!(entry.staleness(900), Some(Duration::ZERO));
    }
}

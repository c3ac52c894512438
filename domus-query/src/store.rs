//! Cache store: a map of key → entry, changed only by [`reduce`].

use crate::entry::{CacheEntry, CacheStatus};
use domus_core::{EpochMillis, FetchError};
use std::collections::HashMap;
use std::fmt;

/// Local rewrite of an entry's data, applied by [`CacheAction::Mutate`].
pub type Updater<T> = Box<dyn FnOnce(Option<T>) -> T + Send>;

/// State transitions of the cache store.
///
/// Timestamps travel inside the actions so that applying an action never
/// reads a clock.
pub enum CacheAction<T> {
    /// Fetch started: `Loading`, error cleared, stale data kept.
    Start { key: String },
    /// Fetch succeeded.
    Success {
        key: String,
        data: T,
        at: EpochMillis,
    },
    /// Fetch failed: `Error`, data left untouched.
    Error { key: String, error: FetchError },
    /// Remove the listed keys entirely.
    Invalidate { keys: Vec<String> },
    /// Optimistic local update without a network round-trip.
    Mutate {
        key: String,
        updater: Updater<T>,
        at: EpochMillis,
    },
    /// Drop every entry.
    Reset,
}

impl<T> CacheAction<T> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
            Self::Invalidate { .. } => "invalidate",
            Self::Mutate { .. } => "mutate",
            Self::Reset => "reset",
        }
    }
}

impl<T> fmt::Debug for CacheAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start { key } => f.debug_struct("Start").field("key", key).finish(),
            Self::Success { key, at, .. } => f
                .debug_struct("Success")
                .field("key", key)
                .field("at", at)
                .finish_non_exhaustive(),
            Self::Error { key, error } => f
                .debug_struct("Error")
                .field("key", key)
                .field("error", error)
                .finish(),
            Self::Invalidate { keys } => f.debug_struct("Invalidate").field("keys", keys).finish(),
            Self::Mutate { key, at, .. } => f
                .debug_struct("Mutate")
                .field("key", key)
                .field("at", at)
                .finish_non_exhaustive(),
            Self::Reset => f.write_str("Reset"),
        }
    }
}

/// Mapping from resource key to cache entry.
#[derive(Debug, Clone)]
pub struct CacheState<T> {
    entries: HashMap<String, CacheEntry<T>>,
}

impl<T> Default for CacheState<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> CacheState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheEntry<T>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Apply one action in place.
    pub fn apply(&mut self, action: CacheAction<T>) {
        match action {
            CacheAction::Start { key } => {
                let entry = self.entries.entry(key).or_default();
                entry.status = CacheStatus::Loading;
                entry.error = None;
            }
            CacheAction::Success { key, data, at } => {
                self.entries.insert(
                    key,
                    CacheEntry {
                        data: Some(data),
                        status: CacheStatus::Success,
                        error: None,
                        fetched_at: stamp(at),
                    },
                );
            }
            CacheAction::Error { key, error } => {
                let entry = self.entries.entry(key).or_default();
                entry.status = CacheStatus::Error;
                entry.error = Some(error);
            }
            CacheAction::Invalidate { keys } => {
                for key in keys {
                    self.entries.remove(&key);
                }
            }
            CacheAction::Mutate { key, updater, at } => {
                let entry = self.entries.entry(key).or_default();
                let previous = entry.data.take();
                entry.data = Some(updater(previous));
                entry.status = CacheStatus::Success;
                entry.error = None;
                entry.fetched_at = stamp(at);
            }
            CacheAction::Reset => self.entries.clear(),
        }
    }
}

/// Pure transition: `(state, action) -> state`.
pub fn reduce<T>(mut state: CacheState<T>, action: CacheAction<T>) -> CacheState<T> {
    state.apply(action);
    state
}

// fetched_at == 0 means "never fetched"; a success must never look like that.
fn stamp(at: EpochMillis) -> EpochMillis {
    at.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(key: &str, data: u32, at: EpochMillis) -> CacheAction<u32> {
        CacheAction::Success {
            key: key.to_string(),
            data,
            at,
        }
    }

    fn transport(msg: &str) -> FetchError {
        FetchError::Transport(msg.to_string())
    }

    #[test]
    fn test_start_creates_loading_entry() {
        let state = reduce(
            CacheState::<u32>::new(),
            CacheAction::Start {
                key: "mtk:list".into(),
            },
        );
        let entry = state.get("mtk:list").unwrap();
        assert_eq!(entry.status, CacheStatus::Loading);
        assert_eq!(entry.data, None);
        assert_eq!(entry.fetched_at, 0);
    }

    #[test]
    fn test_start_preserves_stale_data_and_clears_error() {
        let mut state = reduce(CacheState::new(), success("k", 7, 100));
        state.apply(CacheAction::Error {
            key: "k".into(),
            error: transport("down"),
        });
        state.apply(CacheAction::Start { key: "k".into() });
        let entry = state.get("k").unwrap();
        assert_eq!(entry.status, CacheStatus::Loading);
        assert_eq!(entry.data, Some(7));
        assert_eq!(entry.error, None);
        assert_eq!(entry.fetched_at, 100);
    }

    #[test]
    fn test_success_sets_data_and_stamp() {
        let state = reduce(CacheState::new(), success("k", 3, 500));
        let entry = state.get("k").unwrap();
        assert_eq!(entry.status, CacheStatus::Success);
        assert_eq!(entry.data, Some(3));
        assert_eq!(entry.error, None);
        assert_eq!(entry.fetched_at, 500);
    }

    #[test]
    fn test_success_stamp_is_never_zero() {
        let state = reduce(CacheState::new(), success("k", 3, 0));
        assert!(state.get("k").unwrap().fetched_at > 0);
    }

    #[test]
    fn test_error_keeps_last_good_data() {
        let mut state = reduce(CacheState::new(), success("k", 9, 100));
        state.apply(CacheAction::Start { key: "k".into() });
        state.apply(CacheAction::Error {
            key: "k".into(),
            error: transport("timeout"),
        });
        let entry = state.get("k").unwrap();
        assert_eq!(entry.status, CacheStatus::Error);
        assert_eq!(entry.data, Some(9));
        assert_eq!(entry.error, Some(transport("timeout")));
    }

    #[test]
    fn test_invalidate_removes_only_listed_keys() {
        let mut state = reduce(CacheState::new(), success("a", 1, 1));
        state.apply(success("b", 2, 1));
        state.apply(success("c", 3, 1));
        state.apply(CacheAction::Invalidate {
            keys: vec!["a".into(), "c".into(), "missing".into()],
        });
        assert!(!state.contains("a"));
        assert!(state.contains("b"));
        assert!(!state.contains("c"));
    }

    #[test]
    fn test_mutate_forces_success() {
        let mut state = CacheState::new();
        state.apply(CacheAction::Error {
            key: "k".into(),
            error: transport("x"),
        });
        state.apply(CacheAction::Mutate {
            key: "k".into(),
            updater: Box::new(|prev: Option<u32>| prev.unwrap_or(0) + 10),
            at: 42,
        });
        let entry = state.get("k").unwrap();
        assert_eq!(entry.status, CacheStatus::Success);
        assert_eq!(entry.data, Some(10));
        assert_eq!(entry.error, None);
        assert_eq!(entry.fetched_at, 42);
    }

    #[test]
    fn test_mutate_sees_previous_data() {
        let mut state = reduce(CacheState::new(), success("k", 5, 1));
        state.apply(CacheAction::Mutate {
            key: "k".into(),
            updater: Box::new(|prev: Option<u32>| prev.map(|v| v * 2).unwrap_or(0)),
            at: 2,
        });
        assert_eq!(state.get("k").unwrap().data, Some(10));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = reduce(CacheState::new(), success("a", 1, 1));
        state.apply(success("b", 2, 1));
        state.apply(CacheAction::Reset);
        assert!(state.is_empty());
        assert_eq!(CacheAction::<u32>::Reset.name(), "reset");
    }
}

//! Query orchestrator: freshness check, request deduplication, fetch.
//!
//! [`QueryClient::fetch_once`] decides, atomically under one lock, between
//! three outcomes:
//!
//! 1. serve fresh cached data,
//! 2. join the fetch already in flight for the key,
//! 3. start a new fetch and register it as in flight.
//!
//! New fetches run as spawned tasks. A caller that stops waiting does not
//! cancel the fetch; its result still lands in the cache. A flight writes
//! its result only while it still owns the key's in-flight slot: an
//! invalidate or reset that covers the key detaches the flight, and its
//! result then reaches the waiting callers but not the cache.

use crate::clock::{Clock, SystemClock};
use crate::entry::CacheEntry;
use crate::in_flight::{InFlightMap, SharedFetch};
use crate::key::{base_of, build_key};
use crate::registry::{FetchRegistry, Fetcher, RegistryError, ResourceKey};
use crate::stats::CacheStats;
use crate::store::{CacheAction, CacheState};
use domus_core::{FetchError, QueryParams};
use futures_util::FutureExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Freshness window used when the caller does not pick one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Configuration for the query cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied by [`QueryClient::options`].
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// Per-call options of [`QueryClient::fetch_once`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Maximum age of cached data the caller accepts.
    pub ttl: Duration,
    /// Skip the freshness check and always go to the network
    /// (an in-flight fetch is still joined).
    pub force: bool,
    pub params: QueryParams,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            force: false,
            params: QueryParams::new(),
        }
    }
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn forced(self) -> Self {
        self.with_force(true)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl QueryError {
    pub fn as_fetch_error(&self) -> Option<&FetchError> {
        match self {
            Self::Fetch(err) => Some(err),
            Self::Registry(_) => None,
        }
    }
}

struct QueryState<T: Clone> {
    cache: CacheState<T>,
    in_flight: InFlightMap<T>,
    stats: CacheStats,
}

impl<T: Clone> QueryState<T> {
    /// Apply through the reducer, detaching flights whose keys the action
    /// drops.
    fn apply(&mut self, action: CacheAction<T>) {
        let detached = match &action {
            CacheAction::Invalidate { keys } => self.in_flight.detach(keys),
            CacheAction::Reset => self.in_flight.clear(),
            _ => 0,
        };
        if detached > 0 {
            debug!(action = action.name(), detached, "in-flight fetches detached");
        }
        self.cache.apply(action);
    }
}

struct Inner<K: ResourceKey, T: Clone> {
    registry: FetchRegistry<K, T>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    state: Mutex<QueryState<T>>,
    revision: watch::Sender<u64>,
}

impl<K: ResourceKey, T: Clone> Inner<K, T> {
    // The reducer cannot leave the state half-applied, so a poisoned lock
    // still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, QueryState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

enum Begin<T: Clone> {
    Cached(T),
    Pending(SharedFetch<T>),
}

/// Owner of one session's cache and in-flight map.
///
/// Cheap to clone; clones share state. Construct one per application
/// session and drop it (or call [`QueryClient::reset`]) on teardown.
pub struct QueryClient<K: ResourceKey, T: Clone> {
    inner: Arc<Inner<K, T>>,
}

impl<K: ResourceKey, T: Clone> Clone for QueryClient<K, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, T> QueryClient<K, T>
where
    K: ResourceKey,
    T: Clone + Send + Sync + 'static,
{
    pub fn new(registry: FetchRegistry<K, T>, config: CacheConfig) -> Self {
        Self::with_clock(registry, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        registry: FetchRegistry<K, T>,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                registry,
                clock,
                config,
                state: Mutex::new(QueryState {
                    cache: CacheState::new(),
                    in_flight: InFlightMap::new(),
                    stats: CacheStats::default(),
                }),
                revision,
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Default options carrying the configured TTL.
    pub fn options(&self) -> FetchOptions {
        FetchOptions::new().with_ttl(self.inner.config.default_ttl)
    }

    pub fn key_for(&self, kind: K, params: &QueryParams) -> String {
        build_key(kind.as_str(), params)
    }

    /// Return cached data when fresh, otherwise fetch it exactly once.
    ///
    /// Starting a fetch needs a tokio runtime; without one the call fails
    /// with [`FetchError::Aborted`] and leaves the cache untouched. Every caller that
    /// requests a key while its fetch is in flight receives the same value
    /// or the same error. Transport errors are also recorded on the cache
    /// entry; registry errors are returned without touching the cache.
    pub async fn fetch_once(&self, kind: K, options: FetchOptions) -> Result<T, QueryError> {
        match self.begin(kind, &options)? {
            Begin::Cached(data) => Ok(data),
            Begin::Pending(fetch) => fetch.await.map_err(QueryError::from),
        }
    }

    fn begin(&self, kind: K, options: &FetchOptions) -> Result<Begin<T>, QueryError> {
        let key = build_key(kind.as_str(), &options.params);
        let mut state = self.inner.lock();

        if !options.force {
            let now = self.inner.clock.now_ms();
            let cached = state
                .cache
                .get(&key)
                .filter(|entry| entry.is_success() && entry.is_fresh(options.ttl, now))
                .and_then(|entry| entry.data.clone());
            if let Some(data) = cached {
                state.stats.hits += 1;
                debug!(key = %key, "cache hit");
                return Ok(Begin::Cached(data));
            }
        }

        if let Some(fetch) = state.in_flight.get(&key) {
            state.stats.deduplicated += 1;
            debug!(key = %key, "joining in-flight fetch");
            return Ok(Begin::Pending(fetch));
        }

        let fetcher = self.inner.registry.fetcher(kind)?;
        let runtime = Handle::try_current()
            .map_err(|e| FetchError::Aborted(format!("no tokio runtime: {e}")))?;
        state.stats.misses += 1;
        state.cache.apply(CacheAction::Start { key: key.clone() });
        let id = state.in_flight.next_flight_id();
        let fetch = self.spawn_fetch(&runtime, key.clone(), id, fetcher, options.params.clone());
        state.in_flight.insert(key.clone(), id, fetch.clone());
        drop(state);

        info!(key = %key, force = options.force, "fetch started");
        self.inner.bump();
        Ok(Begin::Pending(fetch))
    }

    fn spawn_fetch(
        &self,
        runtime: &Handle,
        key: String,
        id: u64,
        fetcher: Arc<dyn Fetcher<T>>,
        params: QueryParams,
    ) -> SharedFetch<T> {
        let mut guard = FlightGuard {
            inner: Arc::clone(&self.inner),
            key,
            id,
            settled: false,
        };
        let task = runtime.spawn(async move {
            let result = fetcher.fetch(&params).await;
            guard.settle(&result);
            result
        });
        async move {
            match task.await {
                Ok(result) => result,
                Err(err) => Err(FetchError::Aborted(err.to_string())),
            }
        }
        .boxed()
        .shared()
    }

    /// Snapshot of the entry for `kind` queried with `params`.
    pub fn entry(&self, kind: K, params: &QueryParams) -> Option<CacheEntry<T>> {
        self.entry_by_key(&build_key(kind.as_str(), params))
    }

    pub fn entry_by_key(&self, key: &str) -> Option<CacheEntry<T>> {
        self.inner.lock().cache.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().cache.keys().map(str::to_string).collect()
    }

    /// Entries currently in the error state, for passive error surfaces.
    pub fn errors(&self) -> Vec<(String, FetchError)> {
        self.inner
            .lock()
            .cache
            .iter()
            .filter_map(|(key, entry)| {
                entry
                    .error
                    .clone()
                    .filter(|_| entry.is_error())
                    .map(|err| (key.to_string(), err))
            })
            .collect()
    }

    /// Apply one action through the reducer.
    pub fn dispatch(&self, action: CacheAction<T>) {
        debug!(action = action.name(), detail = ?action, "cache dispatch");
        self.inner.lock().apply(action);
        self.inner.bump();
    }

    pub fn invalidate(&self, keys: Vec<String>) {
        self.dispatch(CacheAction::Invalidate { keys });
    }

    /// Drop every cached key of `kind`, whatever its parameters, and detach
    /// the fetches in flight for them.
    pub fn invalidate_resource(&self, kind: K) -> usize {
        let keys: Vec<String> = {
            let state = self.inner.lock();
            state
                .cache
                .keys()
                .filter(|key| base_of(key) == kind.as_str())
                .map(str::to_string)
                .collect()
        };
        let count = keys.len();
        if count > 0 {
            info!(resource = kind.as_str(), count, "invalidating resource");
            self.invalidate(keys);
        }
        count
    }

    /// Overwrite the data under `key` locally; the entry becomes fresh.
    pub fn mutate<F>(&self, key: &str, updater: F)
    where
        F: FnOnce(Option<T>) -> T + Send + 'static,
    {
        let at = self.inner.clock.now_ms();
        self.dispatch(CacheAction::Mutate {
            key: key.to_string(),
            updater: Box::new(updater),
            at,
        });
    }

    /// Apply `update` to every cached page of `kind` that holds data.
    pub fn mutate_resource<F>(&self, kind: K, update: F) -> usize
    where
        F: Fn(T) -> T,
    {
        let at = self.inner.clock.now_ms();
        let mut state = self.inner.lock();
        let updates: Vec<(String, T)> = state
            .cache
            .iter()
            .filter(|(key, _)| base_of(key) == kind.as_str())
            .filter_map(|(key, entry)| {
                entry
                    .data
                    .clone()
                    .map(|data| (key.to_string(), update(data)))
            })
            .collect();
        let count = updates.len();
        for (key, data) in updates {
            state.cache.apply(CacheAction::Mutate {
                key,
                updater: Box::new(move |_| data),
                at,
            });
        }
        drop(state);
        if count > 0 {
            self.inner.bump();
        }
        count
    }

    /// Clear the entire cache. Fetches still in flight are detached: their
    /// callers get the result, the cache does not, and the next read starts
    /// a new fetch.
    pub fn reset(&self) {
        info!("query cache reset");
        self.dispatch(CacheAction::Reset);
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.inner.lock();
        CacheStats {
            entry_count: state.cache.len() as u64,
            in_flight: state.in_flight.len() as u64,
            ..state.stats.clone()
        }
    }

    /// Receiver whose value changes after every cache transition.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }
}

/// Records the outcome of one flight and always clears its in-flight slot,
/// including when the fetch task panics or is cancelled.
struct FlightGuard<K: ResourceKey, T: Clone> {
    inner: Arc<Inner<K, T>>,
    key: String,
    id: u64,
    settled: bool,
}

impl<K: ResourceKey, T: Clone> FlightGuard<K, T> {
    fn settle(&mut self, result: &Result<T, FetchError>) {
        let at = self.inner.clock.now_ms();
        let mut state = self.inner.lock();
        self.settled = true;
        if result.is_err() {
            state.stats.failures += 1;
        }
        if !state.in_flight.remove(&self.key, self.id) {
            debug!(key = %self.key, "detached fetch settled; result not cached");
            return;
        }
        match result {
            Ok(data) => {
                state.cache.apply(CacheAction::Success {
                    key: self.key.clone(),
                    data: data.clone(),
                    at,
                });
                debug!(key = %self.key, "fetch succeeded");
            }
            Err(error) => {
                state.cache.apply(CacheAction::Error {
                    key: self.key.clone(),
                    error: error.clone(),
                });
                warn!(key = %self.key, error = %error, "fetch failed");
            }
        }
        drop(state);
        self.inner.bump();
    }
}

impl<K: ResourceKey, T: Clone> Drop for FlightGuard<K, T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.inner.lock();
        state.stats.failures += 1;
        if !state.in_flight.remove(&self.key, self.id) {
            return;
        }
        state.cache.apply(CacheAction::Error {
            key: self.key.clone(),
            error: FetchError::Aborted("fetch ended without a result".to_string()),
        });
        drop(state);
        warn!(key = %self.key, "fetch aborted");
        self.inner.bump();
    }
}

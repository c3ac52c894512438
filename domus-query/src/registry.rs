//! Typed mapping from resource kinds to fetchers.

use async_trait::async_trait;
use domus_core::{FetchError, QueryParams};
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

/// A kind of cacheable resource.
///
/// Implemented by a fieldless enum; `all()` must list every variant so a
/// registry can be checked for completeness.
pub trait ResourceKey: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Namespaced base key, `resource:action`.
    fn as_str(&self) -> &'static str;

    fn all() -> &'static [Self];
}

/// Performs the network call for one resource kind.
///
/// Fetchers never touch cache state; the orchestrator records results.
#[async_trait]
pub trait Fetcher<T>: Send + Sync {
    async fn fetch(&self, params: &QueryParams) -> Result<T, FetchError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No fetcher registered for resource '{key}'")]
    MissingFetcher { key: String },
}

/// Resource kind → fetcher.
pub struct FetchRegistry<K: ResourceKey, T> {
    fetchers: HashMap<K, Arc<dyn Fetcher<T>>>,
}

impl<K: ResourceKey, T> Default for FetchRegistry<K, T> {
    fn default() -> Self {
        Self {
            fetchers: HashMap::new(),
        }
    }
}

impl<K: ResourceKey, T> FetchRegistry<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a complete registry from a function over every kind.
    ///
    /// Writing `f` as a `match` on the kind makes a forgotten variant a
    /// compile error instead of a runtime lookup failure.
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(K) -> Arc<dyn Fetcher<T>>,
    {
        let fetchers = K::all().iter().map(|kind| (*kind, f(*kind))).collect();
        Self { fetchers }
    }

    pub fn register(&mut self, kind: K, fetcher: Arc<dyn Fetcher<T>>) -> &mut Self {
        self.fetchers.insert(kind, fetcher);
        self
    }

    pub fn with(mut self, kind: K, fetcher: Arc<dyn Fetcher<T>>) -> Self {
        self.register(kind, fetcher);
        self
    }

    /// Look up the fetcher for `kind`, failing loudly when none exists.
    pub fn fetcher(&self, kind: K) -> Result<Arc<dyn Fetcher<T>>, RegistryError> {
        self.fetchers
            .get(&kind)
            .cloned()
            .ok_or_else(|| RegistryError::MissingFetcher {
                key: kind.as_str().to_string(),
            })
    }

    pub fn contains(&self, kind: K) -> bool {
        self.fetchers.contains_key(&kind)
    }

    /// Kinds with no registered fetcher, in declaration order.
    pub fn missing(&self) -> Vec<K> {
        K::all()
            .iter()
            .copied()
            .filter(|kind| !self.fetchers.contains_key(kind))
            .collect()
    }
}

/// Adapter turning an async closure into a [`Fetcher`].
pub struct FnFetcher<F, T> {
    f: F,
    _output: PhantomData<fn() -> T>,
}

/// Wrap `f(params)` as a shareable fetcher.
pub fn fn_fetcher<F, Fut, T>(f: F) -> Arc<dyn Fetcher<T>>
where
    F: Fn(QueryParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    T: Send + 'static,
{
    Arc::new(FnFetcher {
        f,
        _output: PhantomData,
    })
}

#[async_trait]
impl<F, Fut, T> Fetcher<T> for FnFetcher<F, T>
where
    F: Fn(QueryParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    T: Send + 'static,
{
    async fn fetch(&self, params: &QueryParams) -> Result<T, FetchError> {
        (self.f)(params.clone()).await
    }
}

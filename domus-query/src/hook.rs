//! View-facing query handle.
//!
//! A [`ManagementQuery`] is what a list view holds: it fetches on mount and
//! whenever its parameters produce a new key, and reads `data`, `loading`
//! and `error` back out of the shared cache.

use crate::entry::CacheEntry;
use crate::key::build_key;
use crate::orchestrator::{FetchOptions, QueryClient, QueryError};
use crate::registry::{RegistryError, ResourceKey};
use domus_core::{FetchError, QueryParams};
use tokio::sync::watch;

/// What a view renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<FetchError>,
}

impl<T> Default for QuerySnapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> From<Option<CacheEntry<T>>> for QuerySnapshot<T> {
    fn from(entry: Option<CacheEntry<T>>) -> Self {
        match entry {
            Some(entry) => Self {
                loading: entry.is_loading(),
                error: entry.error,
                data: entry.data,
            },
            None => Self::default(),
        }
    }
}

pub struct ManagementQuery<K: ResourceKey, T: Clone> {
    client: QueryClient<K, T>,
    kind: K,
    options: FetchOptions,
    key: String,
    revision: watch::Receiver<u64>,
}

impl<K, T> ManagementQuery<K, T>
where
    K: ResourceKey,
    T: Clone + Send + Sync + 'static,
{
    pub fn new(client: QueryClient<K, T>, kind: K, options: FetchOptions) -> Self {
        let key = build_key(kind.as_str(), &options.params);
        let revision = client.subscribe();
        Self {
            client,
            kind,
            options,
            key,
            revision,
        }
    }

    pub fn kind(&self) -> K {
        self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn params(&self) -> &QueryParams {
        &self.options.params
    }

    /// Initial fetch. Transport errors end up in the snapshot; only a
    /// missing fetcher is returned as an error.
    pub async fn mount(&self) -> Result<QuerySnapshot<T>, RegistryError> {
        self.load().await
    }

    /// Replace the parameters, fetching only when the key changes.
    pub async fn set_params(
        &mut self,
        params: QueryParams,
    ) -> Result<QuerySnapshot<T>, RegistryError> {
        let key = build_key(self.kind.as_str(), &params);
        self.options.params = params;
        if key == self.key {
            return Ok(self.snapshot());
        }
        self.key = key;
        self.load().await
    }

    /// Deliberate retry: always goes to the network.
    pub async fn refetch(&self) -> Result<T, QueryError> {
        self.client
            .fetch_once(self.kind, self.options.clone().forced())
            .await
    }

    pub fn snapshot(&self) -> QuerySnapshot<T> {
        self.client.entry_by_key(&self.key).into()
    }

    /// Wait for the next cache transition, then read the current snapshot.
    pub async fn changed(&mut self) -> QuerySnapshot<T> {
        // The sender lives inside `self.client`, so this cannot fail.
        let _ = self.revision.changed().await;
        self.snapshot()
    }

    async fn load(&self) -> Result<QuerySnapshot<T>, RegistryError> {
        match self.client.fetch_once(self.kind, self.options.clone()).await {
            Err(QueryError::Registry(err)) => Err(err),
            Ok(_) | Err(QueryError::Fetch(_)) => Ok(self.snapshot()),
        }
    }
}

//! Query layer with explicit freshness, request deduplication and cascading
//! selection.
//!
//! # Design
//!
//! All cache state lives in a [`QueryClient`] that the application constructs
//! and owns for one session. Nothing here is global. Every write to the cache
//! goes through the pure [`reduce`] function, so the store can be reasoned
//! about one [`CacheAction`] at a time.
//!
//! Reads declare their staleness tolerance through [`FetchOptions::ttl`].
//! Concurrent reads of the same key share one network call.
//!
//! # Example
//!
//! ```ignore
//! let client = QueryClient::new(registry, CacheConfig::default());
//!
//! // First call hits the network, the second is served from cache.
//! let page = client.fetch_once(ResourceKind::MtkList, client.options()).await?;
//! let again = client.fetch_once(ResourceKind::MtkList, client.options()).await?;
//!
//! // Deliberate retry bypasses freshness.
//! let fresh = client.fetch_once(ResourceKind::MtkList, client.options().forced()).await?;
//! ```

pub mod clock;
pub mod entry;
pub mod hook;
pub mod in_flight;
pub mod key;
pub mod orchestrator;
pub mod registry;
pub mod selection;
pub mod stats;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{is_fresh, CacheEntry, CacheStatus};
pub use hook::{ManagementQuery, QuerySnapshot};
pub use in_flight::{InFlightMap, SharedFetch};
pub use key::{base_of, build_key};
pub use orchestrator::{CacheConfig, FetchOptions, QueryClient, QueryError, DEFAULT_TTL};
pub use registry::{fn_fetcher, FetchRegistry, Fetcher, FnFetcher, RegistryError, ResourceKey};
pub use selection::{EntityLoader, SelectionController, SelectionError, SelectionState};
pub use stats::CacheStats;
pub use store::{reduce, CacheAction, CacheState, Updater};

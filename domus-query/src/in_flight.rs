//! Outstanding fetches, at most one per key.

use domus_core::FetchError;
use futures_util::future::{BoxFuture, Shared};
use std::collections::HashMap;

/// A fetch every caller for the same key awaits together.
///
/// Cloning is cheap; all clones resolve to the same result.
pub type SharedFetch<T> = Shared<BoxFuture<'static, Result<T, FetchError>>>;

struct Flight<T: Clone> {
    id: u64,
    fetch: SharedFetch<T>,
}

/// Key → pending fetch.
pub struct InFlightMap<T: Clone> {
    flights: HashMap<String, Flight<T>>,
    next_id: u64,
}

impl<T: Clone> Default for InFlightMap<T> {
    fn default() -> Self {
        Self {
            flights: HashMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Clone> InFlightMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the id the next registered flight will carry.
    pub fn next_flight_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn get(&self, key: &str) -> Option<SharedFetch<T>> {
        self.flights.get(key).map(|flight| flight.fetch.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.flights.contains_key(key)
    }

    pub fn insert(&mut self, key: String, id: u64, fetch: SharedFetch<T>) {
        self.flights.insert(key, Flight { id, fetch });
    }

    /// Remove the flight for `key` only if it is still flight `id`.
    pub fn remove(&mut self, key: &str, id: u64) -> bool {
        match self.flights.get(key) {
            Some(flight) if flight.id == id => {
                self.flights.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Forget the flights for `keys`. Their callers still get the result,
    /// but the flights no longer own a cache slot.
    pub fn detach<'a, I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a String>,
    {
        keys.into_iter()
            .filter(|key| self.flights.remove(key.as_str()).is_some())
            .count()
    }

    /// Forget every flight.
    pub fn clear(&mut self) -> usize {
        let count = self.flights.len();
        self.flights.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}

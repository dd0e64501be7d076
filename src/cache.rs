// src/cache.rs

//! Session-lifetime memoization keyed by lookup key.
//!
//! One `Cache` instance exists per data kind (cover URL, title search,
//! availability, branch detail). Entries never expire; a "not found"
//! result is stored like any other completed value, so a failed lookup
//! is not retried within the session.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

/// Memoizing cache with a single-flight guarantee per key.
///
/// Concurrent lookups for the same key collapse onto one producer
/// invocation; later callers wait for the first to finish and share
/// the stored value. The cache only ever holds completed results.
pub struct Cache<K, V> {
    entries: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, producing it on first lookup.
    ///
    /// The map lock is held only long enough to fetch or insert the
    /// entry cell; the producer itself runs unlocked, so lookups for
    /// distinct keys proceed independently.
    pub async fn get_or_compute<F, Fut>(&self, key: K, producer: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries
                .entry(key)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        cell.get_or_init(producer).await.clone()
    }

    /// Return the cached value without computing, if present.
    pub async fn peek(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock().await;
        entries.get(key).and_then(|cell| cell.get().cloned())
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

//! Named response caches.
//!
//! Each cache maps a request URL to a stored response. Lookups search every
//! cache, oldest name first.

use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use crate::http::CachedResponse;

/// Thread-safe set of named caches.
#[derive(Default)]
pub struct CacheStorage {
    caches: RwLock<BTreeMap<String, HashMap<String, CachedResponse>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the named cache if it does not exist.
    pub async fn open(&self, name: &str) {
        self.caches
            .write()
            .await
            .entry(name.to_string())
            .or_default();
    }

    /// Store a response, creating the cache if needed.
    pub async fn put(&self, name: &str, key: &str, response: CachedResponse) {
        self.caches
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .insert(key.to_string(), response);
        debug!(cache = name, key, "Cached response");
    }

    /// Store several responses at once.
    pub async fn put_all(&self, name: &str, entries: Vec<(String, CachedResponse)>) {
        let mut caches = self.caches.write().await;
        let cache = caches.entry(name.to_string()).or_default();
        cache.extend(entries);
    }

    /// Find a response in any cache.
    pub async fn match_key(&self, key: &str) -> Option<CachedResponse> {
        self.caches
            .read()
            .await
            .values()
            .find_map(|cache| cache.get(key).cloned())
    }

    /// Names of all caches.
    pub async fn keys(&self) -> Vec<String> {
        self.caches.read().await.keys().cloned().collect()
    }

    /// Keys stored in one cache, sorted.
    pub async fn entries(&self, name: &str) -> Vec<String> {
        let caches = self.caches.read().await;
        let mut keys: Vec<String> = caches
            .get(name)
            .map(|cache| cache.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Delete a cache. Returns whether it existed.
    pub async fn delete(&self, name: &str) -> bool {
        self.caches.write().await.remove(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_match() {
        let storage = CacheStorage::new();
        storage
            .put("v1", "https://app/x", CachedResponse::ok("x"))
            .await;

        assert_eq!(
            storage.match_key("https://app/x").await,
            Some(CachedResponse::ok("x"))
        );
        assert_eq!(storage.match_key("https://app/y").await, None);
    }

    #[tokio::test]
    async fn test_match_searches_all_caches() {
        let storage = CacheStorage::new();
        storage.put("old", "k", CachedResponse::ok("old")).await;
        storage.open("new").await;

        assert_eq!(storage.match_key("k").await, Some(CachedResponse::ok("old")));
        assert_eq!(storage.keys().await, vec!["new".to_string(), "old".to_string()]);
    }

    #[tokio::test]
    async fn test_delete() {
        let storage = CacheStorage::new();
        storage.open("v1").await;

        assert!(storage.delete("v1").await);
        assert!(!storage.delete("v1").await);
        assert!(storage.keys().await.is_empty());
    }
}

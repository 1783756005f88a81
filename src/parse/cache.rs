use crate::*;
use moka::future::Cache;
use std::sync::Arc;

/// A cached value and the content hash it was computed for.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub content_hash: u64,
    pub value: Arc<T>,
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            content_hash: self.content_hash,
            value: Arc::clone(&self.value),
        }
    }
}

/// Per statement results keyed by [`StatementKey::cache_key`]. An entry
/// only answers for the content hash it was stored with, so an edited
/// statement misses while a merely shifted one hits.
#[derive(Clone)]
pub struct StatementCache<T: Send + Sync + 'static> {
    entries: Cache<u64, CacheEntry<T>>,
}

impl<T: Send + Sync + 'static> StatementCache<T> {
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub async fn get(&self, key: &StatementKey, content_hash: u64) -> Option<Arc<T>> {
        self.entries
            .get(&key.cache_key())
            .await
            .filter(|entry| entry.content_hash == content_hash)
            .map(|entry| entry.value)
    }

    /// Entry under `key` whatever content it was computed for.
    pub async fn peek(&self, key: &StatementKey) -> Option<CacheEntry<T>> {
        self.entries.get(&key.cache_key()).await
    }

    pub async fn insert(&self, key: &StatementKey, content_hash: u64, value: Arc<T>) {
        self.entries
            .insert(key.cache_key(), CacheEntry { content_hash, value })
            .await;
    }

    pub async fn invalidate(&self, key: &StatementKey) {
        self.entries.invalidate(&key.cache_key()).await;
    }
}

use crate::*;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tokio::sync::{Mutex, RwLock};

/// Lazily loaded catalog snapshot.
///
/// Empty until the first successful [`load`](SchemaCache::load). Consumers
/// treat an empty cache as "no schema available" and switch off schema
/// aware features.
///
/// A failed fetch is remembered: `load` stays empty without asking the
/// source again until [`refresh`](SchemaCache::refresh) or
/// [`clear`](SchemaCache::clear).
#[derive(Debug, Default)]
pub struct SchemaCache {
    snapshot: RwLock<Option<Arc<SchemaSnapshot>>>,
    loading: Mutex<()>,
    failed: AtomicBool,
    fetches: AtomicUsize,
}

impl SchemaCache {
    /// Populate from `source` unless already populated or an earlier fetch
    /// failed. Returns whether the cache holds a snapshot afterwards.
    pub async fn load(&self, source: &dyn SchemaSource) -> bool {
        if self.is_loaded().await {
            return true;
        }
        self.fetch(source, false).await
    }

    /// Like [`load`](SchemaCache::load), but retries after a failed fetch.
    pub async fn refresh(&self, source: &dyn SchemaSource) -> bool {
        if self.is_loaded().await {
            return true;
        }
        self.fetch(source, true).await
    }

    async fn fetch(&self, source: &dyn SchemaSource, retry: bool) -> bool {
        if !retry && self.failed.load(Ordering::Acquire) {
            return false;
        }
        let _loading = self.loading.lock().await;
        if self.is_loaded().await {
            return true;
        }
        if !retry && self.failed.load(Ordering::Acquire) {
            return false;
        }

        self.fetches.fetch_add(1, Ordering::Relaxed);
        match source.fetch_catalog().await {
            Ok(snapshot) => {
                info!(
                    tables = snapshot.tables.len(),
                    functions = snapshot.functions.len(),
                    "Schema cache loaded"
                );
                *self.snapshot.write().await = Some(Arc::new(snapshot));
                self.failed.store(false, Ordering::Release);
                true
            }
            Err(error) => {
                warn!("Schema cache stays empty, catalog fetch failed: {error}");
                self.failed.store(true, Ordering::Release);
                false
            }
        }
    }

    pub async fn snapshot(&self) -> Option<Arc<SchemaSnapshot>> {
        self.snapshot.read().await.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.snapshot.read().await.is_some()
    }

    /// Drop the snapshot and any remembered failure so the next `load`
    /// fetches again.
    pub async fn clear(&self) {
        *self.snapshot.write().await = None;
        self.failed.store(false, Ordering::Release);
    }

    /// Number of catalog fetches attempted so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

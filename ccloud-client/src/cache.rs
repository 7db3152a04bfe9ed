//! Keyed cache for values that do not change during a client's lifetime.
//!
//! Entries are never invalidated. Reads share the lock; a miss fetches
//! without holding it and the first value written for a key wins.

use crate::error::{CloudError, CloudResult};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type Entry = Arc<dyn Any + Send + Sync>;

/// Type-erased, write-once value cache.
#[derive(Default)]
pub struct ValueCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl ValueCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key`, if present.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::CacheTypeMismatch`] if the entry holds another type.
    pub async fn get<T>(&self, key: &str) -> CloudResult<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read().await;
        entries.get(key).map(|entry| downcast(key, entry)).transpose()
    }

    /// Return the cached value for `key`, fetching and storing it on a miss.
    ///
    /// A failed fetch stores nothing.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or [`CloudError::CacheTypeMismatch`] if the
    /// entry holds another type.
    pub async fn get_or_try_insert_with<T, F, Fut>(&self, key: &str, fetch: F) -> CloudResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CloudResult<T>>,
    {
        if let Some(value) = self.get(key).await? {
            debug!(key, "Cache hit");
            return Ok(value);
        }

        debug!(key, "Cache miss");
        let value = fetch().await?;

        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(value) as Entry);
        downcast(key, entry)
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing has been cached yet.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn downcast<T: Clone + 'static>(key: &str, entry: &Entry) -> CloudResult<T> {
    entry
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| CloudError::CacheTypeMismatch(key.to_string()))
}

impl fmt::Debug for ValueCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self
            .entries
            .try_read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("ValueCache").field("keys", &keys).finish()
    }
}

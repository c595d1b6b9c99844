//! Time-boxed cache for rendered pages.
//!
//! Entries are served verbatim until their TTL runs out or the cache is
//! cleared, whatever happened to the underlying posts in the meantime.
//! Expiry is checked when reading; stale entries are pruned on the next write.
//! A full cache makes room by dropping the entry closest to expiry.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{sync::RwLock, time::Instant};

use crate::pagination::PageNumber;

/// Cache key of one page of the index feed.
pub fn index_page_key(page: PageNumber) -> String {
    format!("index_page:{page}")
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Entries held when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 256;

/// Cheap to clone; clones share the same entries.
pub struct PageCache<V> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    capacity: usize,
}

impl<V> Clone for PageCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            capacity: self.capacity,
        }
    }
}

impl<V> Default for PageCache<V> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<V> PageCache<V> {
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }
}

impl<V: Clone> PageCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let guard = self.entries.read().await;
        guard
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    /// Last writer wins.
    pub async fn put(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let now = Instant::now();
        let mut guard = self.entries.write().await;
        guard.retain(|_, entry| entry.expires_at > now);
        if !guard.contains_key(&key) && guard.len() >= self.capacity {
            let soonest = guard
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone());
            if let Some(evicted) = soonest {
                guard.remove(&evicted);
                tracing::debug!(%evicted, "page cache full, evicted entry");
            }
        }
        guard.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    pub async fn clear(&self) {
        let mut guard = self.entries.write().await;
        let dropped = guard.len();
        guard.clear();
        tracing::debug!(dropped, "page cache cleared");
    }

    /// Entries held, including expired ones not yet pruned.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

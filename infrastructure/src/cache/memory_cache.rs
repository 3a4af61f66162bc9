//! Bounded in-memory response cache with per-entry TTL.
//!
//! Entries are keyed by [`CacheRequest::fingerprint`] in an LRU. Expired
//! entries are dropped lazily on read; at capacity the least recently used
//! entry is evicted.

use async_trait::async_trait;
use conductor_application::ports::cache::{CacheRequest, ResponseCache};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::trace;

pub const DEFAULT_MAX_ENTRIES: usize = 1_000;

struct Entry {
    value: String,
    expires: Instant,
}

pub struct MemoryResponseCache {
    entries: Mutex<LruCache<String, Entry>>,
}

impl Default for MemoryResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl MemoryResponseCache {
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    async fn get(&self, request: &CacheRequest) -> Option<String> {
        let key = request.fingerprint();
        let mut entries = self.entries.lock().await;
        match entries.get(&key) {
            Some(entry) if entry.expires > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                trace!("Cache entry {} expired", key);
                entries.pop(&key);
                None
            }
            None => None,
        }
    }

    async fn set(&self, request: &CacheRequest, value: &str, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let key = request.fingerprint();
        let entry = Entry {
            value: value.to_string(),
            expires: Instant::now() + ttl,
        };
        let mut entries = self.entries.lock().await;
        if let Some((evicted, _)) = entries.push(key.clone(), entry)
            && evicted != key
        {
            trace!("Cache evicted {}", evicted);
        }
    }
}

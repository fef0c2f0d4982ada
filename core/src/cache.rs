//! Response caching for GET calls.
//!
//! Successful GET responses are stored under a key derived from the request
//! URL and query. An entry older than the configured TTL is treated as absent
//! and evicted by the lookup that finds it. There is no per-key invalidation;
//! [`ResponseCache::clear`] drops everything.
//!
//! Timestamps come from `tokio::time::Instant`, so tests can drive expiry
//! with paused time.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::compose::encode_query;
use crate::envelope::ResponseEnvelope;
use crate::http::HttpRequest;

pub const DEFAULT_TTL: Duration = Duration::from_millis(20_000);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: ResponseEnvelope,
    created_at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// TTL cache of response envelopes, shared by every resource of a client.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    inner: Mutex<Inner>,
}

/// Cache key for `request`: its URL followed by its serialized query.
pub fn cache_key(request: &HttpRequest) -> String {
    format!("{}#{}", request.url, encode_query(&request.query))
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached envelope for `key`, unless absent or expired.
    pub fn lookup(&self, key: &str) -> Option<ResponseEnvelope> {
        let mut inner = self.lock();
        let expired = match inner.entries.get(key) {
            None => {
                inner.misses += 1;
                debug!(key, "cache miss");
                return None;
            }
            Some(entry) => entry.created_at.elapsed() > self.ttl,
        };
        if expired {
            inner.entries.remove(key);
            inner.misses += 1;
            debug!(key, "cache entry expired");
            return None;
        }
        inner.hits += 1;
        debug!(key, "cache hit");
        inner.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Store `value` under `key`, replacing any earlier entry and its age.
    pub fn store(&self, key: impl Into<String>, value: ResponseEnvelope) {
        let entry = CacheEntry {
            value,
            created_at: Instant::now(),
        };
        self.lock().entries.insert(key.into(), entry);
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.lock().hits
    }

    pub fn misses(&self) -> u64 {
        self.lock().misses
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

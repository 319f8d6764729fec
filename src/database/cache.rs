//! Keyed query result cache with a time-to-live

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use serde::Serialize;

use super::{DatabaseResult, QueryExecutor, QueryResult};
use crate::config::DEFAULT_CACHE_TTL_SECS;

/// Results kept before the least recently used one is evicted
pub const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

struct CacheEntry {
    result: QueryResult,
    expires_at: Instant,
}

struct CacheState {
    entries: LruCache<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl CacheState {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Wraps an executor and reuses results for identical SQL and parameters
/// until they expire.
///
/// At most `capacity` results are held; the least recently used is evicted
/// first. Failed queries are never cached.
pub struct CachedExecutor<E> {
    inner: E,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl<E: QueryExecutor> CachedExecutor<E> {
    /// Cache with the default five minute lifetime
    pub fn new(inner: E) -> Self {
        Self::with_ttl(inner, Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
    }

    pub fn with_ttl(inner: E, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            state: Mutex::new(CacheState::new(DEFAULT_CACHE_CAPACITY)),
        }
    }

    /// Bound the number of cached results, dropping current entries
    pub fn with_capacity(self, capacity: NonZeroUsize) -> Self {
        Self {
            state: Mutex::new(CacheState::new(capacity)),
            ..self
        }
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.lock().entries.cap()
    }

    /// Key identifying a query and its parameters
    pub fn cache_key(sql: &str, params: &[serde_json::Value]) -> String {
        let params = serde_json::Value::Array(params.to_vec());
        format!("{}\u{0}{}", sql.trim(), params)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Drop one cached result; returns whether it was present
    pub fn invalidate(&self, sql: &str, params: &[serde_json::Value]) -> bool {
        self.lock()
            .entries
            .pop(&Self::cache_key(sql, params))
            .is_some()
    }

    /// Drop all cached results
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Remove expired entries, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.lock();
        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            state.entries.pop(key);
        }
        expired.len()
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.entries.len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait(?Send)]
impl<E: QueryExecutor> QueryExecutor for CachedExecutor<E> {
    async fn execute(
        &self,
        sql: &str,
        params: &[serde_json::Value],
    ) -> DatabaseResult<QueryResult> {
        let key = Self::cache_key(sql, params);

        {
            let now = Instant::now();
            let mut state = self.lock();
            let cached = state
                .entries
                .get(&key)
                .map(|entry| (entry.expires_at > now).then(|| entry.result.clone()));
            match cached {
                Some(Some(result)) => {
                    state.hits += 1;
                    tracing::debug!("Query cache hit");
                    return Ok(result);
                }
                Some(None) => {
                    state.entries.pop(&key);
                }
                None => {}
            }
            state.misses += 1;
        }

        let result = self.inner.execute(sql, params).await?;

        self.lock().entries.put(
            key,
            CacheEntry {
                result: result.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(result)
    }
}

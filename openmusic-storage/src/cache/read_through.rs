//! Cache-aside reads.
//!
//! `read_through` tries the cache, falls back to the loader on a miss or a
//! cache failure, and repopulates the cache only when the loader succeeded.
//! Cache failures are logged and counted, never returned.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use openmusic_core::{CacheError, OpenMusicResult};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::invalidation::Invalidator;
use super::lookup::{CacheLookup, CacheRead};
use super::traits::{
    CacheBackend, CacheCounters, CacheEvent, CacheObserver, CacheOperation, CacheStats,
    NoopObserver,
};

/// Cache-aside accessor shared by every resource service.
///
/// Cloning is cheap; clones share the backend, observer and counters.
#[derive(Clone)]
pub struct CacheAside {
    /// The cache backend.
    backend: Arc<dyn CacheBackend>,
    /// Receives hit/miss/error events.
    observer: Arc<dyn CacheObserver>,
    counters: Arc<CacheCounters>,
}

impl CacheAside {
    /// Create an accessor over `backend` with no observer.
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            observer: Arc::new(NoopObserver),
            counters: Arc::new(CacheCounters::default()),
        }
    }

    /// Report every cache outcome to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Get a reference to the cache backend.
    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// Hit/miss/error counts since this accessor was built.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Invalidation handle sharing this accessor's backend and observer.
    pub fn invalidator(&self) -> Invalidator {
        Invalidator::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.observer),
            Arc::clone(&self.counters),
        )
    }

    fn emit(&self, event: CacheEvent) {
        self.counters.record(event);
        self.observer.observe(event);
    }

    /// Look a key up and decode it.
    pub async fn lookup<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        match self.backend.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    debug!(key = %key, "cache hit");
                    self.emit(CacheEvent::Hit);
                    CacheLookup::Hit(value)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "cached payload does not decode, treating as unavailable");
                    self.emit(CacheEvent::Error(CacheOperation::Get));
                    CacheLookup::Unavailable(CacheError::Serialization {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })
                }
            },
            Ok(None) => {
                debug!(key = %key, "cache miss");
                self.emit(CacheEvent::Miss);
                CacheLookup::Miss
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, falling back to store");
                self.emit(CacheEvent::Error(CacheOperation::Get));
                CacheLookup::Unavailable(e)
            }
        }
    }

    /// Write a value. Failures are logged and swallowed.
    pub async fn store<T>(&self, key: &str, value: &T, ttl: Duration)
    where
        T: Serialize + Sync + ?Sized,
    {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "value does not serialize, not caching");
                self.emit(CacheEvent::Error(CacheOperation::Set));
                return;
            }
        };

        match self.backend.set(key, &payload, ttl).await {
            Ok(()) => {
                debug!(key = %key, ttl_secs = ttl.as_secs(), "cache set");
                self.emit(CacheEvent::Ok(CacheOperation::Set));
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache set failed");
                self.emit(CacheEvent::Error(CacheOperation::Set));
            }
        }
    }

    /// Serve `key` from the cache, or load it and populate the cache.
    ///
    /// The loader runs only when the cache has no usable value. Its error
    /// (typically NotFound) is returned untouched and nothing is cached.
    pub async fn read_through<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> OpenMusicResult<CacheRead<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = OpenMusicResult<T>> + Send,
    {
        if let Some(value) = self.lookup::<T>(key).await.hit() {
            return Ok(CacheRead::from_cache(value));
        }

        let value = loader().await?;
        self.store(key, &value, ttl).await;
        Ok(CacheRead::from_storage(value))
    }
}

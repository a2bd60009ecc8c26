//! Invalidation coordinator.
//!
//! Called after a durable write has committed and before the mutating call
//! returns. A failed delete does not fail the write: it is logged and
//! reported, and the stale entry ages out with its TTL.

use std::sync::Arc;

use tracing::{debug, warn};

use super::traits::{CacheBackend, CacheCounters, CacheEvent, CacheObserver, CacheOperation};

/// Issues targeted and prefix deletes against the cache.
#[derive(Clone)]
pub struct Invalidator {
    backend: Arc<dyn CacheBackend>,
    observer: Arc<dyn CacheObserver>,
    counters: Arc<CacheCounters>,
}

impl Invalidator {
    pub(crate) fn new(
        backend: Arc<dyn CacheBackend>,
        observer: Arc<dyn CacheObserver>,
        counters: Arc<CacheCounters>,
    ) -> Self {
        Self {
            backend,
            observer,
            counters,
        }
    }

    fn emit(&self, event: CacheEvent) {
        self.counters.record(event);
        self.observer.observe(event);
    }

    /// Delete one exact key. Returns whether the backend acknowledged it.
    pub async fn invalidate(&self, key: &str) -> bool {
        match self.backend.delete(key).await {
            Ok(()) => {
                debug!(key = %key, "cache invalidated");
                self.emit(CacheEvent::Ok(CacheOperation::Invalidate));
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache invalidation failed, entry stays until TTL");
                self.emit(CacheEvent::Error(CacheOperation::Invalidate));
                false
            }
        }
    }

    /// Delete every key under `prefix`. Returns whether the backend
    /// acknowledged it.
    pub async fn invalidate_prefix(&self, prefix: &str) -> bool {
        match self.backend.delete_by_prefix(prefix).await {
            Ok(removed) => {
                debug!(prefix = %prefix, removed, "cache prefix invalidated");
                self.emit(CacheEvent::Ok(CacheOperation::InvalidatePrefix));
                true
            }
            Err(e) => {
                warn!(prefix = %prefix, error = %e, "cache prefix invalidation failed, entries stay until TTL");
                self.emit(CacheEvent::Error(CacheOperation::InvalidatePrefix));
                false
            }
        }
    }

    /// Delete several exact keys in order. Every key is attempted even if an
    /// earlier one fails.
    pub async fn invalidate_all<I, K>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = K> + Send,
        I::IntoIter: Send,
        K: AsRef<str> + Send + Sync,
    {
        let mut all_ok = true;
        for key in keys {
            all_ok &= self.invalidate(key.as_ref()).await;
        }
        all_ok
    }
}

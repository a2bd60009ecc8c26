//! Cache backend and observer traits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use openmusic_core::CacheError;

/// Cache backend trait for pluggable key/value stores.
///
/// Values are opaque strings; serialization is the caller's concern. Any
/// method may fail when the store is unreachable, and callers must treat
/// that as transient.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get the value stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Delete one exact key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every key starting with `prefix`. Returns how many were removed.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError>;

    /// Cheap liveness probe for health checks.
    async fn ping(&self) -> Result<(), CacheError>;

    /// Short backend name for logs and the health endpoint.
    fn backend_name(&self) -> &'static str;
}

/// Operation a [`CacheEvent`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOperation {
    Get,
    Set,
    Invalidate,
    InvalidatePrefix,
}

impl CacheOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOperation::Get => "get",
            CacheOperation::Set => "set",
            CacheOperation::Invalidate => "invalidate",
            CacheOperation::InvalidatePrefix => "invalidate_prefix",
        }
    }
}

/// Outcome of one cache interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    Hit,
    Miss,
    /// The backend failed; the operation was absorbed.
    Error(CacheOperation),
    /// A set or delete that succeeded.
    Ok(CacheOperation),
}

/// Receives every cache outcome. The API crate plugs Prometheus counters in
/// here.
pub trait CacheObserver: Send + Sync {
    fn observe(&self, event: CacheEvent);
}

/// Observer that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CacheObserver for NoopObserver {
    fn observe(&self, _event: CacheEvent) {}
}

/// Statistics about cache usage since process start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of backend failures absorbed on any operation.
    pub errors: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Lock-free counters behind [`CacheStats`].
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn record(&self, event: CacheEvent) {
        let counter = match event {
            CacheEvent::Hit => &self.hits,
            CacheEvent::Miss => &self.misses,
            CacheEvent::Error(_) => &self.errors,
            CacheEvent::Ok(_) => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

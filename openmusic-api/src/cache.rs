//! Redis cache backend.
//!
//! Values are stored as JSON strings with `SET .. EX`. Prefix deletes walk
//! the keyspace with `SCAN MATCH` so a large keyspace never blocks Redis the
//! way `KEYS` would.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use openmusic_core::CacheError;
use openmusic_storage::{CacheBackend, InMemoryCache};
use redis::AsyncCommands;

use crate::config::CacheConfig;
use crate::error::{ApiError, ApiResult};

/// Keys fetched per SCAN round trip.
const SCAN_BATCH: usize = 100;

/// [`CacheBackend`] over a deadpool-redis pool.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    /// Build the pool. No connection is made until first use.
    pub fn connect(url: &str, pool_size: usize) -> ApiResult<Self> {
        let mut config = Config::from_url(url);
        let mut pool_config = PoolConfig::new(pool_size);
        pool_config.timeouts.wait = Some(Duration::from_secs(2));
        pool_config.timeouts.create = Some(Duration::from_secs(2));
        config.pool = Some(pool_config);

        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| ApiError::internal_error(format!("Failed to create Redis pool: {}", e)))?;
        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool.get().await.map_err(|e| CacheError::Unavailable {
            reason: e.to_string(),
        })
    }
}

fn command_error(operation: &'static str, key: &str, err: redis::RedisError) -> CacheError {
    CacheError::Command {
        operation,
        key: key.to_string(),
        reason: err.to_string(),
    }
}

/// Escape glob metacharacters so a prefix matches literally.
fn scan_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| command_error("GET", key, e))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        // EX 0 is rejected by Redis.
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, secs)
            .await
            .map_err(|e| command_error("SET", key, e))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| command_error("DEL", key, e))
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn().await?;
        let pattern = scan_pattern(prefix);
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| command_error("SCAN", prefix, e))?;

            if !keys.is_empty() {
                let deleted: u64 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| command_error("DEL", prefix, e))?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(removed)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("PING", "", e))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

/// Pick the cache backend: Redis when a URL is configured, otherwise the
/// in-process cache.
pub fn cache_backend(config: &CacheConfig) -> ApiResult<Arc<dyn CacheBackend>> {
    match &config.redis_url {
        Some(url) => {
            tracing::info!(url = %url, pool_size = config.pool_size, "Using Redis cache");
            Ok(Arc::new(RedisCache::connect(url, config.pool_size)?))
        }
        None => {
            tracing::info!("No Redis URL configured, using in-process cache");
            Ok(Arc::new(InMemoryCache::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_pattern_escapes_globs() {
        assert_eq!(scan_pattern("songs:"), "songs:*");
        assert_eq!(scan_pattern("songs:a*b?"), "songs:a\\*b\\?*");
        assert_eq!(scan_pattern("x[1]"), "x\\[1\\]*");
    }

    #[test]
    fn test_in_process_cache_without_url() {
        let backend = cache_backend(&CacheConfig::default()).unwrap();
        assert_eq!(backend.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_redis_backend_is_lazy() {
        let config = CacheConfig {
            redis_url: Some("redis://127.0.0.1:1".to_string()),
            pool_size: 2,
        };
        let backend = cache_backend(&config).unwrap();
        assert_eq!(backend.backend_name(), "redis");
        // Nothing listens on port 1; the failure surfaces as a cache error.
        assert!(backend.get("album:album-1").await.is_err());
    }
}

//! API Configuration Module
//!
//! Configuration for the HTTP server, cover uploads, the cache backend and
//! the export queue. Everything is loaded from environment variables with
//! development defaults. Each `OPENMUSIC_*` variable falls back to the
//! unprefixed name used by existing deployments (`HOST`, `PORT`,
//! `REDIS_SERVER`, ...).

use std::net::SocketAddr;

use openmusic_core::ConfigError;

/// Read `primary`, then `fallback`, ignoring empty values.
pub(crate) fn env_var(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .or_else(|| std::env::var(fallback).ok())
        .filter(|v| !v.trim().is_empty())
}

pub(crate) fn env_parse<T: std::str::FromStr>(primary: &str, fallback: &str) -> Option<T> {
    env_var(primary, fallback).and_then(|v| v.trim().parse().ok())
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP server, CORS and upload settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind.
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Directory uploaded album covers are written to and served from.
    pub upload_dir: String,

    /// Base URL embedded in cover URLs. Defaults to `http://host:port`.
    pub public_base_url: String,

    /// Maximum accepted cover size in bytes.
    pub max_cover_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5000,
            cors_origins: Vec::new(),
            cors_max_age_secs: 86400,
            upload_dir: "upload/images".to_string(),
            public_base_url: "http://localhost:5000".to_string(),
            max_cover_bytes: 512_000,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `OPENMUSIC_HOST` / `HOST`: bind host (default: localhost)
    /// - `OPENMUSIC_PORT` / `PORT`: bind port (default: 5000)
    /// - `OPENMUSIC_CORS_ORIGINS`: comma-separated allowed origins (empty = allow all)
    /// - `OPENMUSIC_CORS_MAX_AGE_SECS`: preflight cache duration (default: 86400)
    /// - `OPENMUSIC_STORAGE_PATH` / `STORAGE_PATH`: cover directory (default: upload/images)
    /// - `OPENMUSIC_PUBLIC_URL`: base URL for cover links (default: http://host:port)
    /// - `OPENMUSIC_MAX_COVER_BYTES`: cover size limit (default: 512000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = env_var("OPENMUSIC_HOST", "HOST").unwrap_or(defaults.host);
        let port = env_parse("OPENMUSIC_PORT", "PORT").unwrap_or(defaults.port);

        let cors_origins = std::env::var("OPENMUSIC_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let public_base_url = std::env::var("OPENMUSIC_PUBLIC_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| format!("http://{}:{}", host, port));

        Self {
            cors_origins,
            cors_max_age_secs: env_parse("OPENMUSIC_CORS_MAX_AGE_SECS", "CORS_MAX_AGE_SECS")
                .unwrap_or(defaults.cors_max_age_secs),
            upload_dir: env_var("OPENMUSIC_STORAGE_PATH", "STORAGE_PATH")
                .unwrap_or(defaults.upload_dir),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_cover_bytes: env_parse("OPENMUSIC_MAX_COVER_BYTES", "MAX_COVER_BYTES")
                .unwrap_or(defaults.max_cover_bytes),
            host,
            port,
        }
    }

    /// Resolve the socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        // `localhost` is not an IP literal.
        let host = if self.host == "localhost" {
            "127.0.0.1"
        } else {
            self.host.as_str()
        };
        let addr = format!("{}:{}", host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "host".to_string(),
                value: addr.clone(),
                reason: e.to_string(),
            })
    }
}

// ============================================================================
// CACHE CONFIGURATION
// ============================================================================

/// Cache backend selection.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Redis URL. `None` selects the in-process cache.
    pub redis_url: Option<String>,

    /// Redis connection pool size.
    pub pool_size: usize,
}

impl CacheConfig {
    /// - `OPENMUSIC_REDIS_URL` / `REDIS_SERVER`: Redis URL or bare host name
    /// - `OPENMUSIC_REDIS_POOL_SIZE`: pool size (default: 16)
    pub fn from_env() -> Self {
        let redis_url = env_var("OPENMUSIC_REDIS_URL", "REDIS_SERVER").map(|server| {
            if server.contains("://") {
                server
            } else {
                format!("redis://{}", server)
            }
        });
        Self {
            redis_url,
            pool_size: env_parse("OPENMUSIC_REDIS_POOL_SIZE", "REDIS_POOL_SIZE").unwrap_or(16),
        }
    }
}

// ============================================================================
// EXPORT CONFIGURATION
// ============================================================================

/// Export queue settings.
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    /// NATS server URL. `None` disables exports (503 on request).
    pub nats_url: Option<String>,
}

/// Queue consumed by the playlist export worker.
pub const EXPORT_PLAYLIST_QUEUE: &str = "export:playlist";

impl ExportConfig {
    /// - `OPENMUSIC_NATS_URL` / `NATS_SERVER`: broker URL
    pub fn from_env() -> Self {
        Self {
            nats_url: env_var("OPENMUSIC_NATS_URL", "NATS_SERVER"),
        }
    }
}

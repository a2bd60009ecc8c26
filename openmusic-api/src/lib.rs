//! OpenMusic API - REST Layer for the Music Catalog
//!
//! Axum handlers over a [`CatalogStore`](openmusic_storage::CatalogStore)
//! (Postgres in production) with cache-aside reads through a
//! [`CacheAside`](openmusic_storage::CacheAside) accessor (Redis in
//! production). Playlist exports are published to NATS.
//!
//! Every collaborator is constructed in `main` and injected through
//! [`AppState`]; nothing is held in globals apart from the metrics registry.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod macros;
pub mod middleware;
pub mod producer;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod uploads;
pub mod validation;

// Re-export commonly used types
pub use auth::{AuthConfig, JwtClock, SystemClock};
pub use cache::{cache_backend, RedisCache};
pub use config::{ApiConfig, CacheConfig, ExportConfig, EXPORT_PLAYLIST_QUEUE};
pub use db::{apply_schema, DbConfig, PgCatalogStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::AuthUser;
pub use producer::{export_producer, ExportProducer, ExportRequest, NatsExportProducer};
pub use response::Success;
pub use routes::create_api_router;
pub use state::AppState;

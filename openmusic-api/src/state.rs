//! Shared application state for Axum routers.

use std::sync::Arc;

use openmusic_storage::{CacheAside, CatalogStore};

use crate::auth::AuthConfig;
use crate::config::ApiConfig;
use crate::producer::ExportProducer;
use crate::uploads::CoverStorage;

/// Application-wide state shared across all routes.
///
/// Every collaborator is built in `main` (or a test harness) and injected
/// here; handlers pull the pieces they need through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Durable store, the source of truth.
    pub store: Arc<dyn CatalogStore>,
    /// Cache-aside accessor over the configured cache backend.
    pub cache: CacheAside,
    pub auth: Arc<AuthConfig>,
    pub api_config: Arc<ApiConfig>,
    /// Export queue producer.
    pub producer: Arc<dyn ExportProducer>,
    /// Album cover file storage.
    pub covers: Arc<CoverStorage>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: CacheAside,
        auth: AuthConfig,
        api_config: ApiConfig,
        producer: Arc<dyn ExportProducer>,
    ) -> Self {
        let covers = Arc::new(CoverStorage::new(&api_config));
        Self {
            store,
            cache,
            auth: Arc::new(auth),
            api_config: Arc::new(api_config),
            producer,
            covers,
            start_time: std::time::Instant::now(),
        }
    }
}

crate::impl_from_ref!(Arc<dyn CatalogStore>, store);
crate::impl_from_ref!(CacheAside, cache);
crate::impl_from_ref!(Arc<AuthConfig>, auth);
crate::impl_from_ref!(Arc<ApiConfig>, api_config);
crate::impl_from_ref!(Arc<dyn ExportProducer>, producer);
crate::impl_from_ref!(Arc<CoverStorage>, covers);
crate::impl_from_ref!(std::time::Instant, start_time);

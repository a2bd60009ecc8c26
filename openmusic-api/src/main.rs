//! OpenMusic API Server Entry Point
//!
//! Loads configuration, connects the store, cache and export queue, and
//! serves the router until Ctrl-C.

use std::sync::Arc;

use openmusic_api::telemetry::{init_tracer, PrometheusCacheObserver, TelemetryConfig};
use openmusic_api::{
    apply_schema, cache_backend, create_api_router, export_producer, ApiConfig, ApiError,
    ApiResult, AppState, AuthConfig, CacheConfig, DbConfig, ExportConfig, PgCatalogStore,
};
use openmusic_storage::CacheAside;

#[tokio::main]
async fn main() -> ApiResult<()> {
    // A missing .env is normal outside local development.
    let _ = dotenvy::dotenv();

    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;

    let db_config = DbConfig::from_env();
    let pool = db_config.create_pool()?;
    apply_schema(&pool).await?;
    let store = Arc::new(PgCatalogStore::new(pool));

    let cache = CacheAside::new(cache_backend(&CacheConfig::from_env())?)
        .with_observer(Arc::new(PrometheusCacheObserver));
    let producer = export_producer(&ExportConfig::from_env()).await;

    let api_config = ApiConfig::from_env();
    let addr = api_config.bind_addr().map_err(|e| ApiError::invalid_input(e.to_string()))?;
    let state = AppState::new(store, cache, AuthConfig::from_env(), api_config, producer);
    let app = create_api_router(state);

    tracing::info!(%addr, "Starting OpenMusic API server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
        })
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    Ok(())
}

//! REST API Routes Module
//!
//! One module per resource, each exposing `create_router()`. This module
//! assembles them with CORS, tracing, metrics and the cover file server.

pub mod albums;
pub mod authentications;
pub mod collaborations;
pub mod exports;
pub mod health;
pub mod playlists;
pub mod songs;
pub mod users;

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};
use crate::uploads::COVER_ROUTE;

/// Room for multipart framing around a cover at the size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([albums::DATA_SOURCE_HEADER])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        // Development mode: allow all origins
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Build the complete router over `state`.
///
/// - Resource routes (`/albums`, `/songs`, `/users`, `/authentications`,
///   `/playlists`, `/collaborations`, `/export`)
/// - Uploaded covers under `/upload/images`
/// - `/health` and `/metrics` (public)
pub fn create_api_router(state: AppState) -> Router {
    let config = state.api_config.clone();
    let body_limit = config.max_cover_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .nest("/albums", albums::create_router())
        .nest("/songs", songs::create_router())
        .nest("/users", users::create_router())
        .nest("/authentications", authentications::create_router())
        .nest("/playlists", playlists::create_router())
        .nest("/collaborations", collaborations::create_router())
        .nest("/export", exports::create_router())
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .nest_service(COVER_ROUTE, ServeDir::new(state.covers.dir()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(&config))
                .layer(from_fn(observability_middleware))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_builds_for_both_modes() {
        let _dev = build_cors_layer(&ApiConfig::default());
        let _prod = build_cors_layer(&ApiConfig {
            cors_origins: vec!["https://openmusic.example".to_string()],
            ..ApiConfig::default()
        });
    }
}

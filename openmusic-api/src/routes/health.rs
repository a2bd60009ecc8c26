//! Health Check Endpoint
//!
//! `GET /health` reports the durable store and the cache separately. A cache
//! outage only degrades the service, since reads fall back to the store; a
//! store outage makes it unhealthy.

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub details: HealthDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDetails {
    pub database: ComponentHealth,
    pub cache: ComponentHealth,
    pub export_queue: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn from_check<E: std::fmt::Display>(
        backend: Option<&str>,
        started: Instant,
        result: Result<(), E>,
    ) -> Self {
        match result {
            Ok(()) => Self {
                status: HealthStatus::Healthy,
                backend: backend.map(str::to_string),
                latency_ms: Some(started.elapsed().as_millis() as u64),
                error: None,
            },
            Err(e) => Self {
                status: HealthStatus::Unhealthy,
                backend: backend.map(str::to_string),
                latency_ms: None,
                error: Some(e.to_string()),
            },
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health - Store and cache availability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let database = ComponentHealth::from_check(None, started, state.store.ping().await);

    let backend = state.cache.backend();
    let started = Instant::now();
    let cache =
        ComponentHealth::from_check(Some(backend.backend_name()), started, backend.ping().await);

    let status = match (database.status, cache.status) {
        (HealthStatus::Healthy, HealthStatus::Healthy) => HealthStatus::Healthy,
        (HealthStatus::Healthy, _) => HealthStatus::Degraded,
        _ => HealthStatus::Unhealthy,
    };
    let code = if status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    let response = HealthResponse {
        status,
        details: HealthDetails {
            database,
            cache,
            export_queue: state.producer.producer_name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
        },
    };
    (code, Json(response))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route("/", axum::routing::get(health))
}

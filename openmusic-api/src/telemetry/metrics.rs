//! Prometheus Metrics Definitions
//!
//! Defines all OpenMusic metrics with appropriate labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use openmusic_storage::{CacheEvent, CacheObserver};
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Database operation latency buckets (seconds)
const DB_LATENCY_BUCKETS: &[f64] =
    &[0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<OpenMusicMetrics>> = Lazy::new(OpenMusicMetrics::new);

/// Container for all OpenMusic metrics.
#[derive(Clone)]
pub struct OpenMusicMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Database operation counter - labels: operation, status
    pub db_operations_total: CounterVec,

    /// Database operation duration histogram - labels: operation
    pub db_operation_duration_seconds: HistogramVec,

    /// Cache operation counter - labels: operation, result (hit/miss/ok/error)
    pub cache_operations_total: CounterVec,

    /// Export requests - labels: status (queued/failed)
    pub export_requests_total: CounterVec,
}

impl OpenMusicMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "openmusic_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| {
                ApiError::internal_error(format!("Failed to register http_requests_total: {}", e))
            })?,

            http_request_duration_seconds: register_histogram_vec!(
                "openmusic_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| {
                ApiError::internal_error(format!(
                    "Failed to register http_request_duration_seconds: {}",
                    e
                ))
            })?,

            db_operations_total: register_counter_vec!(
                "openmusic_db_operations_total",
                "Total number of database operations",
                &["operation", "status"]
            )
            .map_err(|e| {
                ApiError::internal_error(format!("Failed to register db_operations_total: {}", e))
            })?,

            db_operation_duration_seconds: register_histogram_vec!(
                "openmusic_db_operation_duration_seconds",
                "Database operation duration in seconds",
                &["operation"],
                DB_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| {
                ApiError::internal_error(format!(
                    "Failed to register db_operation_duration_seconds: {}",
                    e
                ))
            })?,

            cache_operations_total: register_counter_vec!(
                "openmusic_cache_operations_total",
                "Total cache operations by outcome",
                &["operation", "result"]
            )
            .map_err(|e| {
                ApiError::internal_error(format!(
                    "Failed to register cache_operations_total: {}",
                    e
                ))
            })?,

            export_requests_total: register_counter_vec!(
                "openmusic_export_requests_total",
                "Playlist export requests",
                &["status"]
            )
            .map_err(|e| {
                ApiError::internal_error(format!("Failed to register export_requests_total: {}", e))
            })?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, status_str.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record a database operation.
    pub fn record_db_operation(&self, operation: &str, success: bool, duration_secs: f64) {
        let status = if success { "success" } else { "error" };
        self.db_operations_total
            .with_label_values(&[operation, status])
            .inc();
        self.db_operation_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Record one cache outcome.
    pub fn record_cache_event(&self, event: CacheEvent) {
        let (operation, result) = match event {
            CacheEvent::Hit => ("get", "hit"),
            CacheEvent::Miss => ("get", "miss"),
            CacheEvent::Ok(op) => (op.as_str(), "ok"),
            CacheEvent::Error(op) => (op.as_str(), "error"),
        };
        self.cache_operations_total
            .with_label_values(&[operation, result])
            .inc();
    }

    /// Record an export request.
    pub fn record_export(&self, queued: bool) {
        let status = if queued { "queued" } else { "failed" };
        self.export_requests_total.with_label_values(&[status]).inc();
    }
}

/// Forwards cache events to the global registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusCacheObserver;

impl CacheObserver for PrometheusCacheObserver {
    fn observe(&self, event: CacheEvent) {
        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_cache_event(event);
        }
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

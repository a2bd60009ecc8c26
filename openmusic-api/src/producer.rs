//! Export queue producer.
//!
//! Playlist exports are handed to an external worker over a message queue.
//! The API only publishes; delivery and the e-mail itself are the worker's
//! business.

use std::sync::Arc;
use std::time::Duration;

use async_nats::{Client, ConnectOptions};
use async_trait::async_trait;
use bytes::Bytes;
use openmusic_core::{OpenMusicError, OpenMusicResult, PlaylistId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ExportConfig;

/// Upper bound on a publish round trip.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Message body published for each export request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub playlist_id: PlaylistId,
    pub target_email: String,
}

/// Publishes messages onto a named queue.
#[async_trait]
pub trait ExportProducer: Send + Sync {
    /// Publish `payload` on `queue`. Any broker failure is `Unavailable`.
    async fn send(&self, queue: &str, payload: Bytes) -> OpenMusicResult<()>;

    /// Short producer name for logs and the health endpoint.
    fn producer_name(&self) -> &'static str;
}

/// Producer backed by a NATS connection.
#[derive(Clone)]
pub struct NatsExportProducer {
    client: Client,
}

impl NatsExportProducer {
    /// Connect to the broker. Fails fast if it is not reachable.
    pub async fn connect(url: &str) -> OpenMusicResult<Self> {
        info!(url = %url, "Connecting to NATS");
        let client = ConnectOptions::new()
            .name("openmusic-api")
            .connection_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(|e| OpenMusicError::unavailable("export queue", e.to_string()))?;
        info!(url = %url, "Connected to NATS");
        Ok(Self { client })
    }
}

#[async_trait]
impl ExportProducer for NatsExportProducer {
    async fn send(&self, queue: &str, payload: Bytes) -> OpenMusicResult<()> {
        let publish = async {
            self.client
                .publish(queue.to_string(), payload)
                .await
                .map_err(|e| e.to_string())?;
            // publish only buffers; flush surfaces a dead connection.
            self.client.flush().await.map_err(|e| e.to_string())
        };

        match tokio::time::timeout(PUBLISH_TIMEOUT, publish).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(OpenMusicError::unavailable("export queue", reason)),
            Err(_) => Err(OpenMusicError::unavailable(
                "export queue",
                format!("publish timed out after {}s", PUBLISH_TIMEOUT.as_secs()),
            )),
        }
    }

    fn producer_name(&self) -> &'static str {
        "nats"
    }
}

/// Producer used when no broker is configured or reachable. Every send is
/// rejected as `Unavailable`.
#[derive(Debug, Clone)]
pub struct UnavailableProducer {
    reason: String,
}

impl UnavailableProducer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ExportProducer for UnavailableProducer {
    async fn send(&self, _queue: &str, _payload: Bytes) -> OpenMusicResult<()> {
        Err(OpenMusicError::unavailable("export queue", self.reason.clone()))
    }

    fn producer_name(&self) -> &'static str {
        "unavailable"
    }
}

/// Build the producer for `config`. A broker that cannot be reached at
/// startup does not stop the server; exports answer 503 instead.
pub async fn export_producer(config: &ExportConfig) -> Arc<dyn ExportProducer> {
    match &config.nats_url {
        Some(url) => match NatsExportProducer::connect(url).await {
            Ok(producer) => Arc::new(producer),
            Err(e) => {
                warn!(error = %e, "Export queue unreachable, exports disabled");
                Arc::new(UnavailableProducer::new(e.to_string()))
            }
        },
        None => {
            info!("No NATS URL configured, exports disabled");
            Arc::new(UnavailableProducer::new("no broker configured"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_request_wire_shape() {
        let request = ExportRequest {
            playlist_id: PlaylistId::new("playlist-1"),
            target_email: "listener@example.com".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "playlistId": "playlist-1",
                "targetEmail": "listener@example.com"
            })
        );
    }

    #[tokio::test]
    async fn test_unavailable_producer_rejects() {
        let producer = UnavailableProducer::new("down");
        let err = producer
            .send("export:playlist", Bytes::from_static(b"{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, OpenMusicError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_missing_url_disables_exports() {
        let producer = export_producer(&ExportConfig::default()).await;
        assert_eq!(producer.producer_name(), "unavailable");
    }
}

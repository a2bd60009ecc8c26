//! Playlist export requests.

use bytes::Bytes;
use openmusic_core::{PlaylistId, UserId};
use openmusic_storage::CatalogStore;
use tracing::{info, warn};

use super::authorizer::require_access;
use crate::config::EXPORT_PLAYLIST_QUEUE;
use crate::error::ApiResult;
use crate::producer::{ExportProducer, ExportRequest};
use crate::telemetry::METRICS;

/// Queue an export of `playlist_id` to `target_email`. Access is checked
/// before anything is published.
pub async fn export_playlist(
    store: &dyn CatalogStore,
    producer: &dyn ExportProducer,
    playlist_id: &PlaylistId,
    user_id: &UserId,
    target_email: String,
) -> ApiResult<()> {
    require_access(store, playlist_id, user_id).await?;

    let request = ExportRequest {
        playlist_id: playlist_id.clone(),
        target_email,
    };
    let payload = Bytes::from(serde_json::to_vec(&request)?);

    let outcome = producer.send(EXPORT_PLAYLIST_QUEUE, payload).await;
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_export(outcome.is_ok());
    }

    match outcome {
        Ok(()) => {
            info!(playlist_id = %playlist_id, queue = EXPORT_PLAYLIST_QUEUE, "export queued");
            Ok(())
        }
        Err(e) => {
            warn!(playlist_id = %playlist_id, error = %e, "export not queued");
            Err(e.into())
        }
    }
}

//! Activity ledger.
//!
//! Records are append-only. The playlist service writes them together with
//! the membership change; [`record_activity`] appends a standalone record.

use openmusic_core::{Activity, ActivityAction, ActivityEntry, PlaylistId, SongId, UserId};
use openmusic_storage::CatalogStore;

use super::authorizer::require_access;
use crate::error::ApiResult;

/// Append one ledger record stamped now.
pub async fn record_activity(
    store: &dyn CatalogStore,
    playlist_id: &PlaylistId,
    song_id: &SongId,
    user_id: &UserId,
    action: ActivityAction,
) -> ApiResult<Activity> {
    let activity = Activity::record(
        playlist_id.clone(),
        song_id.clone(),
        user_id.clone(),
        action,
    );
    store.activity_insert(&activity).await?;
    Ok(activity)
}

/// Ledger for a playlist, oldest first. Requires access to the playlist.
pub async fn list_activities(
    store: &dyn CatalogStore,
    playlist_id: &PlaylistId,
    user_id: &UserId,
) -> ApiResult<Vec<ActivityEntry>> {
    require_access(store, playlist_id, user_id).await?;
    Ok(store.activity_list(playlist_id).await?)
}

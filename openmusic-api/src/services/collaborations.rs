//! Collaboration service. Only a playlist's owner manages its
//! collaborators.

use openmusic_core::{CollaborationId, EntityType, OpenMusicError, PlaylistId, UserId};
use openmusic_storage::CatalogStore;
use tracing::info;

use super::authorizer::require_owner;
use crate::error::ApiResult;

pub async fn add_collaborator(
    store: &dyn CatalogStore,
    playlist_id: &PlaylistId,
    collaborator: &UserId,
    requester: &UserId,
) -> ApiResult<CollaborationId> {
    require_owner(store, playlist_id, requester).await?;
    if store.user_get(collaborator).await?.is_none() {
        return Err(OpenMusicError::not_found(EntityType::User, collaborator).into());
    }

    match store.collaboration_insert(playlist_id, collaborator).await {
        Ok(id) => {
            info!(playlist_id = %playlist_id, user_id = %collaborator, "collaborator added");
            Ok(id)
        }
        Err(e) if e.is_unique_violation() => {
            Err(OpenMusicError::conflict("User already collaborates on this playlist").into())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn remove_collaborator(
    store: &dyn CatalogStore,
    playlist_id: &PlaylistId,
    collaborator: &UserId,
    requester: &UserId,
) -> ApiResult<()> {
    require_owner(store, playlist_id, requester).await?;
    if !store.collaboration_delete(playlist_id, collaborator).await? {
        return Err(OpenMusicError::invariant("Collaboration does not exist").into());
    }
    info!(playlist_id = %playlist_id, user_id = %collaborator, "collaborator removed");
    Ok(())
}

//! Playlist Access Authorizer
//!
//! Ownership is checked first. A missing playlist ends the check at once;
//! a non-owner falls back to the collaboration table. The outcome is a
//! value, not an error, so callers branch on it explicitly.

use openmusic_core::{EntityType, OpenMusicError, OpenMusicResult, PlaylistId, UserId};
use openmusic_storage::CatalogStore;
use tracing::warn;

use crate::error::ApiResult;

/// How access was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessGrant {
    Owner,
    Collaborator,
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted(AccessGrant),
    NotFound,
    Forbidden,
}

impl AccessDecision {
    /// Turn a denial into the matching error.
    pub fn into_result(self, playlist_id: &PlaylistId) -> OpenMusicResult<AccessGrant> {
        match self {
            Self::Granted(grant) => Ok(grant),
            Self::NotFound => Err(OpenMusicError::not_found(EntityType::Playlist, playlist_id)),
            Self::Forbidden => Err(OpenMusicError::forbidden(
                "You are not entitled to access this playlist",
            )),
        }
    }
}

/// Owner check: NotFound if the playlist is absent, Forbidden if someone
/// else owns it.
pub async fn verify_owner(
    store: &dyn CatalogStore,
    playlist_id: &PlaylistId,
    user_id: &UserId,
) -> OpenMusicResult<AccessDecision> {
    let decision = match store.playlist_get(playlist_id).await? {
        None => AccessDecision::NotFound,
        Some(playlist) if &playlist.owner == user_id => AccessDecision::Granted(AccessGrant::Owner),
        Some(_) => AccessDecision::Forbidden,
    };
    Ok(decision)
}

/// Owner check with collaboration fallback.
///
/// A failing collaboration lookup is logged and yields the original
/// Forbidden; it never surfaces as its own error.
pub async fn verify_access(
    store: &dyn CatalogStore,
    playlist_id: &PlaylistId,
    user_id: &UserId,
) -> OpenMusicResult<AccessDecision> {
    let owner_decision = verify_owner(store, playlist_id, user_id).await?;
    if owner_decision != AccessDecision::Forbidden {
        return Ok(owner_decision);
    }

    match store.collaboration_exists(playlist_id, user_id).await {
        Ok(true) => Ok(AccessDecision::Granted(AccessGrant::Collaborator)),
        Ok(false) => Ok(owner_decision),
        Err(e) => {
            warn!(
                playlist_id = %playlist_id,
                user_id = %user_id,
                error = %e,
                "collaboration lookup failed, denying access"
            );
            Ok(owner_decision)
        }
    }
}

/// [`verify_owner`], failing on anything but a grant.
pub async fn require_owner(
    store: &dyn CatalogStore,
    playlist_id: &PlaylistId,
    user_id: &UserId,
) -> ApiResult<()> {
    verify_owner(store, playlist_id, user_id)
        .await?
        .into_result(playlist_id)?;
    Ok(())
}

/// [`verify_access`], failing on anything but a grant.
pub async fn require_access(
    store: &dyn CatalogStore,
    playlist_id: &PlaylistId,
    user_id: &UserId,
) -> ApiResult<AccessGrant> {
    Ok(verify_access(store, playlist_id, user_id)
        .await?
        .into_result(playlist_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use openmusic_core::{NewPlaylist, NewUser};
    use openmusic_storage::InMemoryCatalog;
    use openmusic_test_utils::CountingCatalog;

    async fn user(store: &InMemoryCatalog, name: &str) -> UserId {
        store
            .user_insert(&NewUser {
                username: name.to_string(),
                password_hash: "$argon2id$x".to_string(),
                fullname: name.to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_owner_granted_without_collaboration() {
        let store = CountingCatalog::new();
        let owner = user(store.inner(), "owner").await;
        let playlist = store
            .playlist_insert(&NewPlaylist {
                name: "Road trip".to_string(),
                owner: owner.clone(),
            })
            .await
            .unwrap();
        // A collaboration row for the owner is never read.
        store.collaboration_insert(&playlist, &owner).await.unwrap();

        assert_eq!(
            verify_access(&store, &playlist, &owner).await.unwrap(),
            AccessDecision::Granted(AccessGrant::Owner)
        );
        assert_eq!(store.collaboration_checks(), 0);
    }

    #[tokio::test]
    async fn test_collaborator_fallback() {
        let store = InMemoryCatalog::new();
        let owner = user(&store, "owner").await;
        let guest = user(&store, "guest").await;
        let playlist = store
            .playlist_insert(&NewPlaylist {
                name: "Road trip".to_string(),
                owner,
            })
            .await
            .unwrap();

        assert_eq!(
            verify_access(&store, &playlist, &guest).await.unwrap(),
            AccessDecision::Forbidden
        );
        store.collaboration_insert(&playlist, &guest).await.unwrap();
        assert_eq!(
            verify_access(&store, &playlist, &guest).await.unwrap(),
            AccessDecision::Granted(AccessGrant::Collaborator)
        );
        // Collaboration never satisfies the owner check.
        assert_eq!(
            verify_owner(&store, &playlist, &guest).await.unwrap(),
            AccessDecision::Forbidden
        );
    }

    #[tokio::test]
    async fn test_missing_playlist_is_not_found() {
        let store = CountingCatalog::new();
        let guest = user(store.inner(), "guest").await;
        let missing = PlaylistId::new("playlist-missing");
        // An orphan collaboration row must not turn NotFound into a grant.
        store.collaboration_insert(&missing, &guest).await.unwrap();

        let decision = verify_access(&store, &missing, &guest).await.unwrap();
        assert_eq!(decision, AccessDecision::NotFound);
        assert_eq!(store.collaboration_checks(), 0);
        assert!(decision.into_result(&missing).unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_non_owner_consults_collaborations_once() {
        let store = CountingCatalog::new();
        let owner = user(store.inner(), "owner").await;
        let guest = user(store.inner(), "guest").await;
        let playlist = store
            .playlist_insert(&NewPlaylist {
                name: "Road trip".to_string(),
                owner,
            })
            .await
            .unwrap();

        assert_eq!(
            verify_access(&store, &playlist, &guest).await.unwrap(),
            AccessDecision::Forbidden
        );
        assert_eq!(store.collaboration_checks(), 1);
    }

    #[test]
    fn test_forbidden_maps_to_forbidden_error() {
        let err = AccessDecision::Forbidden
            .into_result(&PlaylistId::new("p"))
            .unwrap_err();
        assert!(matches!(err, OpenMusicError::Forbidden(_)));
    }
}

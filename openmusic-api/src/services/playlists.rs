//! Playlist service.
//!
//! Membership changes go through the store's combined "change and record
//! activity" operations so the ledger never disagrees with the playlist.

use openmusic_core::{
    Activity, ActivityAction, CacheKey, CacheTtl, EntityType, NewPlaylist, OpenMusicError,
    PlaylistId, PlaylistSongs, PlaylistSummary, SongId, UserId,
};
use openmusic_storage::{CacheAside, CacheRead, CatalogStore};
use tracing::info;

use super::authorizer::{require_access, require_owner};
use crate::error::ApiResult;

pub async fn create_playlist(
    store: &dyn CatalogStore,
    owner: &UserId,
    name: String,
) -> ApiResult<PlaylistId> {
    let id = store
        .playlist_insert(&NewPlaylist {
            name,
            owner: owner.clone(),
        })
        .await?;
    info!(playlist_id = %id, owner = %owner, "playlist created");
    Ok(id)
}

/// Playlists the user owns or collaborates on.
pub async fn list_playlists(
    store: &dyn CatalogStore,
    user_id: &UserId,
) -> ApiResult<Vec<PlaylistSummary>> {
    Ok(store.playlist_list_for_user(user_id).await?)
}

pub async fn delete_playlist(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    playlist_id: &PlaylistId,
    user_id: &UserId,
) -> ApiResult<()> {
    require_owner(store, playlist_id, user_id).await?;
    if !store.playlist_delete(playlist_id).await? {
        return Err(OpenMusicError::not_found(EntityType::Playlist, playlist_id).into());
    }
    cache
        .invalidator()
        .invalidate(&CacheKey::playlist_songs(playlist_id))
        .await;
    info!(playlist_id = %playlist_id, "playlist deleted");
    Ok(())
}

pub async fn add_playlist_song(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    playlist_id: &PlaylistId,
    song_id: &SongId,
    user_id: &UserId,
) -> ApiResult<()> {
    require_access(store, playlist_id, user_id).await?;
    if store.song_get(song_id).await?.is_none() {
        return Err(OpenMusicError::not_found(EntityType::Song, song_id).into());
    }

    let activity = Activity::record(
        playlist_id.clone(),
        song_id.clone(),
        user_id.clone(),
        ActivityAction::Add,
    );
    store.playlist_song_add_with_activity(&activity).await?;
    cache
        .invalidator()
        .invalidate(&CacheKey::playlist_songs(playlist_id))
        .await;
    Ok(())
}

/// Playlist with its songs, served through `playlist_songs:<id>`. Access is
/// checked on every call, cached or not.
pub async fn get_playlist_songs(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    playlist_id: &PlaylistId,
    user_id: &UserId,
) -> ApiResult<CacheRead<PlaylistSongs>> {
    require_access(store, playlist_id, user_id).await?;

    let read = cache
        .read_through(
            &CacheKey::playlist_songs(playlist_id),
            CacheTtl::PLAYLIST_SONGS,
            || async move {
                let playlist = store
                    .playlist_summary(playlist_id)
                    .await?
                    .ok_or_else(|| OpenMusicError::not_found(EntityType::Playlist, playlist_id))?;
                let songs = store.playlist_songs(playlist_id).await?;
                Ok(PlaylistSongs { playlist, songs })
            },
        )
        .await?;
    Ok(read)
}

pub async fn remove_playlist_song(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    playlist_id: &PlaylistId,
    song_id: &SongId,
    user_id: &UserId,
) -> ApiResult<()> {
    require_access(store, playlist_id, user_id).await?;

    let activity = Activity::record(
        playlist_id.clone(),
        song_id.clone(),
        user_id.clone(),
        ActivityAction::Delete,
    );
    if !store.playlist_song_remove_with_activity(&activity).await? {
        return Err(OpenMusicError::invariant("Song is not on this playlist").into());
    }
    cache
        .invalidator()
        .invalidate(&CacheKey::playlist_songs(playlist_id))
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use openmusic_core::{NewSong, NewUser};
    use openmusic_storage::{InMemoryCache, InMemoryCatalog};
    use std::sync::Arc;

    struct Fixture {
        store: InMemoryCatalog,
        backend: Arc<InMemoryCache>,
        cache: CacheAside,
        owner: UserId,
        stranger: UserId,
        playlist: PlaylistId,
        song: SongId,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryCatalog::new();
        let backend = Arc::new(InMemoryCache::new());
        let cache = CacheAside::new(backend.clone());
        let mut users = Vec::new();
        for name in ["owner", "stranger"] {
            users.push(
                store
                    .user_insert(&NewUser {
                        username: name.to_string(),
                        password_hash: "$argon2id$x".to_string(),
                        fullname: name.to_string(),
                    })
                    .await
                    .unwrap(),
            );
        }
        let stranger = users.pop().unwrap();
        let owner = users.pop().unwrap();
        let playlist = create_playlist(&store, &owner, "Morning".to_string())
            .await
            .unwrap();
        let song = store
            .song_insert(&NewSong {
                title: "Sparks".to_string(),
                year: 2000,
                genre: "Indie".to_string(),
                performer: "Coldplay".to_string(),
                duration: None,
                album_id: None,
            })
            .await
            .unwrap();
        Fixture {
            store,
            backend,
            cache,
            owner,
            stranger,
            playlist,
            song,
        }
    }

    #[tokio::test]
    async fn test_add_song_records_activity_and_invalidates() {
        let f = fixture().await;
        let key = CacheKey::playlist_songs(&f.playlist);

        let empty = get_playlist_songs(&f.store, &f.cache, &f.playlist, &f.owner)
            .await
            .unwrap();
        assert!(empty.value().songs.is_empty());
        assert!(f.backend.contains(&key).await);

        add_playlist_song(&f.store, &f.cache, &f.playlist, &f.song, &f.owner)
            .await
            .unwrap();
        assert!(!f.backend.contains(&key).await);
        assert_eq!(f.store.activity_count(&f.playlist).await, 1);

        let read = get_playlist_songs(&f.store, &f.cache, &f.playlist, &f.owner)
            .await
            .unwrap();
        assert_eq!(read.value().songs.len(), 1);
        assert_eq!(read.value().playlist.username, "owner");
    }

    #[tokio::test]
    async fn test_add_unknown_song() {
        let f = fixture().await;
        let err = add_playlist_song(
            &f.store,
            &f.cache,
            &f.playlist,
            &SongId::new("song-missing"),
            &f.owner,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::EntityNotFound);
        assert_eq!(f.store.activity_count(&f.playlist).await, 0);
    }

    #[tokio::test]
    async fn test_cached_read_still_checks_access() {
        let f = fixture().await;
        get_playlist_songs(&f.store, &f.cache, &f.playlist, &f.owner)
            .await
            .unwrap();

        let err = get_playlist_songs(&f.store, &f.cache, &f.playlist, &f.stranger)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_remove_absent_song_is_invariant() {
        let f = fixture().await;
        let err = remove_playlist_song(&f.store, &f.cache, &f.playlist, &f.song, &f.owner)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvariantViolation);
        assert_eq!(f.store.activity_count(&f.playlist).await, 0);
    }

    #[tokio::test]
    async fn test_only_owner_deletes() {
        let f = fixture().await;
        f.store
            .collaboration_insert(&f.playlist, &f.stranger)
            .await
            .unwrap();

        let err = delete_playlist(&f.store, &f.cache, &f.playlist, &f.stranger)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        delete_playlist(&f.store, &f.cache, &f.playlist, &f.owner)
            .await
            .unwrap();
        assert!(list_playlists(&f.store, &f.owner).await.unwrap().is_empty());
        assert!(list_playlists(&f.store, &f.stranger).await.unwrap().is_empty());
    }
}

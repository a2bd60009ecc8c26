//! Song service.
//!
//! Song writes fan out to several cache entries: the song itself, every
//! filtered listing (by prefix), and the detail of each album the song
//! belongs or belonged to.

use openmusic_core::{
    AlbumId, CacheKey, CacheTtl, EntityType, NewSong, OpenMusicError, Song, SongFilter, SongId,
    SongSummary, SongUpdate,
};
use openmusic_storage::{CacheAside, CacheRead, CatalogStore};
use tracing::{debug, info};

use crate::error::ApiResult;

async fn ensure_album_exists(store: &dyn CatalogStore, album_id: Option<&AlbumId>) -> ApiResult<()> {
    if let Some(album_id) = album_id {
        if store.album_get(album_id).await?.is_none() {
            return Err(OpenMusicError::not_found(EntityType::Album, album_id).into());
        }
    }
    Ok(())
}

async fn invalidate_song_keys(cache: &CacheAside, id: &SongId, albums: &[Option<&AlbumId>]) {
    let invalidator = cache.invalidator();
    let mut keys = vec![CacheKey::song(id)];
    for album_id in albums.iter().flatten() {
        let key = CacheKey::album(album_id);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    invalidator.invalidate_all(&keys).await;
    invalidator
        .invalidate_prefix(CacheKey::SONG_LIST_PREFIX)
        .await;
}

pub async fn create_song(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    song: &NewSong,
) -> ApiResult<SongId> {
    ensure_album_exists(store, song.album_id.as_ref()).await?;
    let id = store.song_insert(song).await?;
    invalidate_song_keys(cache, &id, &[song.album_id.as_ref()]).await;
    info!(song_id = %id, "song created");
    Ok(id)
}

pub async fn get_song(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    id: &SongId,
) -> ApiResult<CacheRead<Song>> {
    let read = cache
        .read_through(&CacheKey::song(id), CacheTtl::SONG, || async move {
            store
                .song_get(id)
                .await?
                .ok_or_else(|| OpenMusicError::not_found(EntityType::Song, id))
        })
        .await?;
    Ok(read)
}

/// Filtered listing, cached per distinct filter. Filters that cannot be
/// keyed unambiguously skip the cache entirely.
pub async fn list_songs(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    filter: &SongFilter,
) -> ApiResult<CacheRead<Vec<SongSummary>>> {
    let Some(key) = CacheKey::song_list(filter) else {
        debug!(?filter, "song listing not cacheable, reading store");
        return Ok(CacheRead::from_storage(store.song_list(filter).await?));
    };
    let read = cache
        .read_through(&key, CacheTtl::SONG_LIST, || async move {
            store.song_list(filter).await
        })
        .await?;
    Ok(read)
}

pub async fn update_song(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    id: &SongId,
    update: &SongUpdate,
) -> ApiResult<()> {
    let existing = store
        .song_get(id)
        .await?
        .ok_or_else(|| OpenMusicError::not_found(EntityType::Song, id))?;
    ensure_album_exists(store, update.album_id.as_ref()).await?;

    if !store.song_update(id, update).await? {
        return Err(OpenMusicError::not_found(EntityType::Song, id).into());
    }
    invalidate_song_keys(
        cache,
        id,
        &[existing.album_id.as_ref(), update.album_id.as_ref()],
    )
    .await;
    Ok(())
}

pub async fn delete_song(store: &dyn CatalogStore, cache: &CacheAside, id: &SongId) -> ApiResult<()> {
    let existing = store
        .song_get(id)
        .await?
        .ok_or_else(|| OpenMusicError::not_found(EntityType::Song, id))?;

    if !store.song_delete(id).await? {
        return Err(OpenMusicError::not_found(EntityType::Song, id).into());
    }
    invalidate_song_keys(cache, id, &[existing.album_id.as_ref()]).await;
    info!(song_id = %id, "song deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::{create_album, get_album};
    use openmusic_core::NewAlbum;
    use openmusic_storage::{InMemoryCache, InMemoryCatalog};
    use std::sync::Arc;

    fn setup() -> (InMemoryCatalog, Arc<InMemoryCache>, CacheAside) {
        let backend = Arc::new(InMemoryCache::new());
        let cache = CacheAside::new(backend.clone());
        (InMemoryCatalog::new(), backend, cache)
    }

    fn song(title: &str, performer: &str, album_id: Option<AlbumId>) -> NewSong {
        NewSong {
            title: title.to_string(),
            year: 2008,
            genre: "Indie".to_string(),
            performer: performer.to_string(),
            duration: Some(240),
            album_id,
        }
    }

    #[tokio::test]
    async fn test_create_song_with_unknown_album() {
        let (store, _, cache) = setup();
        let err = create_song(
            &store,
            &cache,
            &song("Yellow", "Coldplay", Some(AlbumId::new("album-missing"))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::EntityNotFound);
    }

    #[tokio::test]
    async fn test_listing_cache_dropped_on_create() {
        let (store, backend, cache) = setup();
        create_song(&store, &cache, &song("Yellow", "Coldplay", None))
            .await
            .unwrap();

        let filter = SongFilter::new(None, Some("cold".to_string()));
        let listed = list_songs(&store, &cache, &filter).await.unwrap();
        assert_eq!(listed.value().len(), 1);
        let key = CacheKey::song_list(&filter).unwrap();
        assert!(backend.contains(&key).await);

        create_song(&store, &cache, &song("Clocks", "Coldplay", None))
            .await
            .unwrap();
        assert!(!backend.contains(&key).await);

        let listed = list_songs(&store, &cache, &filter).await.unwrap();
        assert!(!listed.was_cache_hit());
        assert_eq!(listed.value().len(), 2);
    }

    #[tokio::test]
    async fn test_literal_all_filter_not_served_unfiltered_listing() {
        let (store, backend, cache) = setup();
        create_song(&store, &cache, &song("Yellow", "Coldplay", None))
            .await
            .unwrap();
        create_song(&store, &cache, &song("Fall Again", "Ben Allen", None))
            .await
            .unwrap();

        let unfiltered = list_songs(&store, &cache, &SongFilter::default())
            .await
            .unwrap();
        assert_eq!(unfiltered.value().len(), 2);

        let title_all = SongFilter::new(Some("all".to_string()), None);
        let listed = list_songs(&store, &cache, &title_all).await.unwrap();
        assert!(!listed.was_cache_hit());
        let titles: Vec<_> = listed.value().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Fall Again"]);

        // A second read still goes to the store and nothing new is cached.
        let again = list_songs(&store, &cache, &title_all).await.unwrap();
        assert!(!again.was_cache_hit());
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_separator_in_filter_bypasses_cache() {
        let (store, _, cache) = setup();
        create_song(&store, &cache, &song("Live 2012: Paradise", "Coldplay", None))
            .await
            .unwrap();
        create_song(&store, &cache, &song("Paradise", "Coldplay: Live", None))
            .await
            .unwrap();

        let with_colon = SongFilter::new(Some("2012: Para".to_string()), None);
        let first = list_songs(&store, &cache, &with_colon).await.unwrap();
        assert_eq!(first.value().len(), 1);
        let second = list_songs(&store, &cache, &with_colon).await.unwrap();
        assert!(!second.was_cache_hit());

        let performer = SongFilter::new(None, Some("coldplay: live".to_string()));
        let listed = list_songs(&store, &cache, &performer).await.unwrap();
        let titles: Vec<_> = listed.value().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Paradise"]);
    }

    #[tokio::test]
    async fn test_update_invalidates_old_and_new_album() {
        let (store, backend, cache) = setup();
        let first = create_album(
            &store,
            &NewAlbum {
                name: "Parachutes".to_string(),
                year: 2000,
            },
        )
        .await
        .unwrap();
        let second = create_album(
            &store,
            &NewAlbum {
                name: "X&Y".to_string(),
                year: 2005,
            },
        )
        .await
        .unwrap();
        let id = create_song(&store, &cache, &song("Yellow", "Coldplay", Some(first.clone())))
            .await
            .unwrap();

        get_album(&store, &cache, &first).await.unwrap();
        get_album(&store, &cache, &second).await.unwrap();
        get_song(&store, &cache, &id).await.unwrap();

        update_song(
            &store,
            &cache,
            &id,
            &song("Yellow", "Coldplay", Some(second.clone())),
        )
        .await
        .unwrap();

        assert!(!backend.contains(&CacheKey::song(&id)).await);
        assert!(!backend.contains(&CacheKey::album(&first)).await);
        assert!(!backend.contains(&CacheKey::album(&second)).await);

        let album = get_album(&store, &cache, &second).await.unwrap();
        assert_eq!(album.value().songs.len(), 1);
    }

    #[tokio::test]
    async fn test_song_read_after_edit_is_fresh() {
        let (store, _, cache) = setup();
        let id = create_song(&store, &cache, &song("Yellow", "Coldplay", None))
            .await
            .unwrap();
        get_song(&store, &cache, &id).await.unwrap();

        update_song(&store, &cache, &id, &song("Yellow (Live)", "Coldplay", None))
            .await
            .unwrap();
        let read = get_song(&store, &cache, &id).await.unwrap();
        assert!(!read.was_cache_hit());
        assert_eq!(read.value().title, "Yellow (Live)");
    }

    #[tokio::test]
    async fn test_delete_song_then_get_is_not_found() {
        let (store, _, cache) = setup();
        let id = create_song(&store, &cache, &song("Yellow", "Coldplay", None))
            .await
            .unwrap();
        get_song(&store, &cache, &id).await.unwrap();

        delete_song(&store, &cache, &id).await.unwrap();
        let err = get_song(&store, &cache, &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EntityNotFound);

        let err = delete_song(&store, &cache, &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EntityNotFound);
    }
}

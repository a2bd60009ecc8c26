//! Album service.

use openmusic_core::{
    AlbumDetail, AlbumId, AlbumUpdate, CacheKey, CacheTtl, EntityType, NewAlbum, OpenMusicError,
};
use openmusic_storage::{CacheAside, CacheRead, CatalogStore};
use tracing::info;

use crate::error::ApiResult;
use crate::uploads::CoverStorage;

pub async fn create_album(store: &dyn CatalogStore, album: &NewAlbum) -> ApiResult<AlbumId> {
    let id = store.album_insert(album).await?;
    info!(album_id = %id, "album created");
    Ok(id)
}

/// Album with its songs, served through the `album:<id>` cache entry.
pub async fn get_album(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    id: &AlbumId,
) -> ApiResult<CacheRead<AlbumDetail>> {
    let read = cache
        .read_through(&CacheKey::album(id), CacheTtl::ALBUM, || async move {
            let album = store
                .album_get(id)
                .await?
                .ok_or_else(|| OpenMusicError::not_found(EntityType::Album, id))?;
            let songs = store.song_list_by_album(id).await?;
            Ok(AlbumDetail::from_album(album, songs))
        })
        .await?;
    Ok(read)
}

pub async fn update_album(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    id: &AlbumId,
    update: &AlbumUpdate,
) -> ApiResult<()> {
    if !store.album_update(id, update).await? {
        return Err(OpenMusicError::not_found(EntityType::Album, id).into());
    }
    cache.invalidator().invalidate(&CacheKey::album(id)).await;
    Ok(())
}

/// Delete an album. Songs that referenced it lose their album, so their
/// cached entries go too.
pub async fn delete_album(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    id: &AlbumId,
) -> ApiResult<()> {
    let songs = store.song_list_by_album(id).await?;
    if !store.album_delete(id).await? {
        return Err(OpenMusicError::not_found(EntityType::Album, id).into());
    }

    let mut keys = vec![CacheKey::album(id), CacheKey::album_likes(id)];
    keys.extend(songs.iter().map(|song| CacheKey::song(&song.id)));
    cache.invalidator().invalidate_all(&keys).await;
    info!(album_id = %id, detached_songs = songs.len(), "album deleted");
    Ok(())
}

/// Store a cover file and point the album at it. Returns the public URL.
pub async fn set_album_cover(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    covers: &CoverStorage,
    id: &AlbumId,
    file_name: &str,
    contents: &[u8],
) -> ApiResult<String> {
    // Nothing is written to disk for an album that does not exist.
    if store.album_get(id).await?.is_none() {
        return Err(OpenMusicError::not_found(EntityType::Album, id).into());
    }

    let url = covers.save(file_name, contents).await?;
    if !store.album_set_cover(id, &url).await? {
        return Err(OpenMusicError::not_found(EntityType::Album, id).into());
    }
    cache.invalidator().invalidate(&CacheKey::album(id)).await;
    Ok(url)
}

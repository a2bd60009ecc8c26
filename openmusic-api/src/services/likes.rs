//! Like counter.
//!
//! The count is read through `album_likes:<id>`; every like or unlike on the
//! album drops that entry.

use openmusic_core::{AlbumId, CacheKey, CacheTtl, EntityType, Like, OpenMusicError, UserId};
use openmusic_storage::{CacheAside, CacheRead, CatalogStore};

use crate::error::ApiResult;

pub async fn add_like(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    user_id: &UserId,
    album_id: &AlbumId,
) -> ApiResult<()> {
    if store.album_get(album_id).await?.is_none() {
        return Err(OpenMusicError::not_found(EntityType::Album, album_id).into());
    }

    // Uniqueness is the store's job; a lost race shows up here as a
    // unique violation.
    match store.like_insert(&Like::new(user_id.clone(), album_id.clone())).await {
        Ok(()) => {}
        Err(e) if e.is_unique_violation() => {
            return Err(OpenMusicError::conflict("You have already liked this album").into());
        }
        Err(e) => return Err(e.into()),
    }

    cache
        .invalidator()
        .invalidate(&CacheKey::album_likes(album_id))
        .await;
    Ok(())
}

pub async fn remove_like(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    user_id: &UserId,
    album_id: &AlbumId,
) -> ApiResult<()> {
    if !store.like_delete(user_id, album_id).await? {
        return Err(OpenMusicError::not_found(EntityType::Like, album_id).into());
    }
    cache
        .invalidator()
        .invalidate(&CacheKey::album_likes(album_id))
        .await;
    Ok(())
}

/// Like count, with where it came from.
pub async fn likes_count(
    store: &dyn CatalogStore,
    cache: &CacheAside,
    album_id: &AlbumId,
) -> ApiResult<CacheRead<u64>> {
    let read = cache
        .read_through(
            &CacheKey::album_likes(album_id),
            CacheTtl::ALBUM_LIKES,
            || async move { store.like_count(album_id).await },
        )
        .await?;
    Ok(read)
}

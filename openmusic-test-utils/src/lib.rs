//! OpenMusic Test Utilities
//!
//! Shared test infrastructure for the OpenMusic workspace:
//! - Cache backend doubles that fail on demand or record deletes
//! - A catalog store wrapper that counts collaboration lookups
//! - Fixtures that seed a [`CatalogStore`] with common scenarios
//! - Proptest generators for catalog payloads

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

// Re-export the in-memory implementations tests build on
pub use openmusic_storage::{CacheAside, CacheBackend, CatalogStore, InMemoryCache, InMemoryCatalog};

pub use openmusic_core::{
    ActivityAction, AlbumId, CacheError, CacheKey, NewAlbum, NewPlaylist, NewSong, NewUser,
    PlaylistId, SongFilter, SongId, UserId,
};
use openmusic_core::{
    Activity, ActivityEntry, Album, AlbumUpdate, CollaborationId, Like, OpenMusicResult,
    Playlist, PlaylistSummary, Song, SongSummary, SongUpdate, User,
};

// ============================================================================
// CACHE DOUBLES
// ============================================================================

/// In-memory cache that can be switched into a failing state, standing in
/// for a Redis outage.
#[derive(Default)]
pub struct FlakyCache {
    inner: InMemoryCache,
    failing: AtomicBool,
}

impl FlakyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The backing store, for inspecting what was cached.
    pub fn inner(&self) -> &InMemoryCache {
        &self.inner
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CacheError::Unavailable {
                reason: "connection refused".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheBackend for FlakyCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        self.check()?;
        self.inner.delete_by_prefix(prefix).await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.check()
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

/// One delete issued against a [`RecordingCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletion {
    Key(String),
    Prefix(String),
}

/// In-memory cache that logs every delete, so tests can assert exactly which
/// keys a write invalidated.
#[derive(Default)]
pub struct RecordingCache {
    inner: InMemoryCache,
    deletions: Mutex<Vec<Deletion>>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryCache {
        &self.inner
    }

    /// Deletes issued so far, oldest first.
    pub fn deletions(&self) -> Vec<Deletion> {
        self.deletions
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    /// Forget recorded deletes.
    pub fn reset(&self) {
        if let Ok(mut d) = self.deletions.lock() {
            d.clear();
        }
    }

    fn record(&self, deletion: Deletion) {
        if let Ok(mut d) = self.deletions.lock() {
            d.push(deletion);
        }
    }
}

#[async_trait]
impl CacheBackend for RecordingCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.record(Deletion::Key(key.to_string()));
        self.inner.delete(key).await
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        self.record(Deletion::Prefix(prefix.to_string()));
        self.inner.delete_by_prefix(prefix).await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

/// Accessor over a fresh [`RecordingCache`], with a handle to inspect it.
pub fn recording_cache() -> (Arc<RecordingCache>, CacheAside) {
    let backend = Arc::new(RecordingCache::new());
    let cache = CacheAside::new(backend.clone());
    (backend, cache)
}

/// Accessor over a fresh [`FlakyCache`], with a handle to break it.
pub fn flaky_cache() -> (Arc<FlakyCache>, CacheAside) {
    let backend = Arc::new(FlakyCache::new());
    let cache = CacheAside::new(backend.clone());
    (backend, cache)
}

// ============================================================================
// STORE DOUBLES
// ============================================================================

/// [`InMemoryCatalog`] wrapper that counts collaboration lookups, so tests
/// can show when the authorizer consults the collaboration table.
#[derive(Default)]
pub struct CountingCatalog {
    inner: InMemoryCatalog,
    collaboration_checks: AtomicUsize,
}

impl CountingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryCatalog {
        &self.inner
    }

    /// `collaboration_exists` calls so far.
    pub fn collaboration_checks(&self) -> usize {
        self.collaboration_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogStore for CountingCatalog {
    async fn album_insert(&self, album: &NewAlbum) -> OpenMusicResult<AlbumId> {
        self.inner.album_insert(album).await
    }

    async fn album_get(&self, id: &AlbumId) -> OpenMusicResult<Option<Album>> {
        self.inner.album_get(id).await
    }

    async fn album_update(&self, id: &AlbumId, update: &AlbumUpdate) -> OpenMusicResult<bool> {
        self.inner.album_update(id, update).await
    }

    async fn album_set_cover(&self, id: &AlbumId, cover_url: &str) -> OpenMusicResult<bool> {
        self.inner.album_set_cover(id, cover_url).await
    }

    async fn album_delete(&self, id: &AlbumId) -> OpenMusicResult<bool> {
        self.inner.album_delete(id).await
    }

    async fn song_insert(&self, song: &NewSong) -> OpenMusicResult<SongId> {
        self.inner.song_insert(song).await
    }

    async fn song_get(&self, id: &SongId) -> OpenMusicResult<Option<Song>> {
        self.inner.song_get(id).await
    }

    async fn song_list(&self, filter: &SongFilter) -> OpenMusicResult<Vec<SongSummary>> {
        self.inner.song_list(filter).await
    }

    async fn song_list_by_album(&self, album_id: &AlbumId) -> OpenMusicResult<Vec<SongSummary>> {
        self.inner.song_list_by_album(album_id).await
    }

    async fn song_update(&self, id: &SongId, update: &SongUpdate) -> OpenMusicResult<bool> {
        self.inner.song_update(id, update).await
    }

    async fn song_delete(&self, id: &SongId) -> OpenMusicResult<bool> {
        self.inner.song_delete(id).await
    }

    async fn user_insert(&self, user: &NewUser) -> OpenMusicResult<UserId> {
        self.inner.user_insert(user).await
    }

    async fn user_get(&self, id: &UserId) -> OpenMusicResult<Option<User>> {
        self.inner.user_get(id).await
    }

    async fn user_get_by_username(&self, username: &str) -> OpenMusicResult<Option<User>> {
        self.inner.user_get_by_username(username).await
    }

    async fn refresh_token_insert(&self, token_digest: &str) -> OpenMusicResult<()> {
        self.inner.refresh_token_insert(token_digest).await
    }

    async fn refresh_token_exists(&self, token_digest: &str) -> OpenMusicResult<bool> {
        self.inner.refresh_token_exists(token_digest).await
    }

    async fn refresh_token_delete(&self, token_digest: &str) -> OpenMusicResult<bool> {
        self.inner.refresh_token_delete(token_digest).await
    }

    async fn playlist_insert(&self, playlist: &NewPlaylist) -> OpenMusicResult<PlaylistId> {
        self.inner.playlist_insert(playlist).await
    }

    async fn playlist_get(&self, id: &PlaylistId) -> OpenMusicResult<Option<Playlist>> {
        self.inner.playlist_get(id).await
    }

    async fn playlist_summary(&self, id: &PlaylistId) -> OpenMusicResult<Option<PlaylistSummary>> {
        self.inner.playlist_summary(id).await
    }

    async fn playlist_list_for_user(
        &self,
        user_id: &UserId,
    ) -> OpenMusicResult<Vec<PlaylistSummary>> {
        self.inner.playlist_list_for_user(user_id).await
    }

    async fn playlist_delete(&self, id: &PlaylistId) -> OpenMusicResult<bool> {
        self.inner.playlist_delete(id).await
    }

    async fn playlist_songs(&self, id: &PlaylistId) -> OpenMusicResult<Vec<SongSummary>> {
        self.inner.playlist_songs(id).await
    }

    async fn playlist_song_add_with_activity(&self, activity: &Activity) -> OpenMusicResult<()> {
        self.inner.playlist_song_add_with_activity(activity).await
    }

    async fn playlist_song_remove_with_activity(
        &self,
        activity: &Activity,
    ) -> OpenMusicResult<bool> {
        self.inner.playlist_song_remove_with_activity(activity).await
    }

    async fn collaboration_insert(
        &self,
        playlist_id: &PlaylistId,
        user_id: &UserId,
    ) -> OpenMusicResult<CollaborationId> {
        self.inner.collaboration_insert(playlist_id, user_id).await
    }

    async fn collaboration_exists(
        &self,
        playlist_id: &PlaylistId,
        user_id: &UserId,
    ) -> OpenMusicResult<bool> {
        self.collaboration_checks.fetch_add(1, Ordering::SeqCst);
        self.inner.collaboration_exists(playlist_id, user_id).await
    }

    async fn collaboration_delete(
        &self,
        playlist_id: &PlaylistId,
        user_id: &UserId,
    ) -> OpenMusicResult<bool> {
        self.inner.collaboration_delete(playlist_id, user_id).await
    }

    async fn activity_insert(&self, activity: &Activity) -> OpenMusicResult<()> {
        self.inner.activity_insert(activity).await
    }

    async fn activity_list(&self, playlist_id: &PlaylistId) -> OpenMusicResult<Vec<ActivityEntry>> {
        self.inner.activity_list(playlist_id).await
    }

    async fn like_insert(&self, like: &Like) -> OpenMusicResult<()> {
        self.inner.like_insert(like).await
    }

    async fn like_delete(&self, user_id: &UserId, album_id: &AlbumId) -> OpenMusicResult<bool> {
        self.inner.like_delete(user_id, album_id).await
    }

    async fn like_count(&self, album_id: &AlbumId) -> OpenMusicResult<u64> {
        self.inner.like_count(album_id).await
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Seeding helpers. They panic on store errors, which is what a test
    //! wants from its setup.

    use super::*;

    /// Placeholder PHC string for users whose password is never checked.
    pub const UNUSED_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA";

    pub fn new_album(name: &str, year: i32) -> NewAlbum {
        NewAlbum {
            name: name.to_string(),
            year,
        }
    }

    pub fn new_song(title: &str, performer: &str, album_id: Option<AlbumId>) -> NewSong {
        NewSong {
            title: title.to_string(),
            year: 2008,
            genre: "Indie".to_string(),
            performer: performer.to_string(),
            duration: Some(240),
            album_id,
        }
    }

    pub async fn seed_user(store: &dyn CatalogStore, username: &str) -> UserId {
        store
            .user_insert(&NewUser {
                username: username.to_string(),
                password_hash: UNUSED_PASSWORD_HASH.to_string(),
                fullname: username.to_string(),
            })
            .await
            .expect("seed user")
    }

    pub async fn seed_album(store: &dyn CatalogStore, name: &str) -> AlbumId {
        store
            .album_insert(&new_album(name, 2008))
            .await
            .expect("seed album")
    }

    pub async fn seed_song(
        store: &dyn CatalogStore,
        title: &str,
        album_id: Option<AlbumId>,
    ) -> SongId {
        store
            .song_insert(&new_song(title, "Coldplay", album_id))
            .await
            .expect("seed song")
    }

    pub async fn seed_playlist(store: &dyn CatalogStore, owner: &UserId, name: &str) -> PlaylistId {
        store
            .playlist_insert(&NewPlaylist {
                name: name.to_string(),
                owner: owner.clone(),
            })
            .await
            .expect("seed playlist")
    }

    /// Owner, non-collaborating stranger, a playlist owned by the owner and
    /// one song not yet on it.
    pub struct PlaylistScenario {
        pub owner: UserId,
        pub stranger: UserId,
        pub playlist: PlaylistId,
        pub song: SongId,
    }

    pub async fn playlist_scenario(store: &dyn CatalogStore) -> PlaylistScenario {
        let owner = seed_user(store, "owner").await;
        let stranger = seed_user(store, "stranger").await;
        let playlist = seed_playlist(store, &owner, "Road trip").await;
        let song = seed_song(store, "Viva la Vida", None).await;
        PlaylistScenario {
            owner,
            stranger,
            playlist,
            song,
        }
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for catalog payloads.

    use super::*;
    use proptest::prelude::*;

    /// Short human-ish text, never empty.
    pub fn arb_text() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,23}"
    }

    pub fn arb_year() -> impl Strategy<Value = i32> {
        1900i32..=2100
    }

    pub fn arb_new_album() -> impl Strategy<Value = NewAlbum> {
        (arb_text(), arb_year()).prop_map(|(name, year)| NewAlbum { name, year })
    }

    pub fn arb_new_song() -> impl Strategy<Value = NewSong> {
        (
            arb_text(),
            arb_year(),
            arb_text(),
            arb_text(),
            proptest::option::of(1i32..3600),
        )
            .prop_map(|(title, year, genre, performer, duration)| NewSong {
                title,
                year,
                genre,
                performer,
                duration,
                album_id: None,
            })
    }

    pub fn arb_song_filter() -> impl Strategy<Value = SongFilter> {
        (
            proptest::option::of("[a-z]{0,6}"),
            proptest::option::of("[a-z]{0,6}"),
        )
            .prop_map(|(title, performer)| SongFilter::new(title, performer))
    }

    pub fn arb_activity_action() -> impl Strategy<Value = ActivityAction> {
        prop_oneof![Just(ActivityAction::Add), Just(ActivityAction::Delete)]
    }
}

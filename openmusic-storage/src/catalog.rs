//! Durable store trait for the catalog.
//!
//! Inserts return the generated id. Updates and deletes report whether a row
//! was affected; turning "nothing affected" into NotFound or Invariant is the
//! caller's decision. Unique index violations surface as
//! `StorageError::UniqueViolation`.

use ::async_trait::async_trait;
use openmusic_core::{
    Activity, ActivityEntry, Album, AlbumId, AlbumUpdate, Like, NewAlbum, NewPlaylist, NewSong,
    NewUser, OpenMusicResult, Playlist, PlaylistId, PlaylistSummary, Song, SongFilter, SongId,
    SongSummary, SongUpdate, User, UserId, CollaborationId,
};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    // ========================================================================
    // ALBUM OPERATIONS
    // ========================================================================

    /// Insert a new album.
    async fn album_insert(&self, album: &NewAlbum) -> OpenMusicResult<AlbumId>;

    /// Get an album by ID.
    async fn album_get(&self, id: &AlbumId) -> OpenMusicResult<Option<Album>>;

    /// Replace name and year. Returns false if the album does not exist.
    async fn album_update(&self, id: &AlbumId, update: &AlbumUpdate) -> OpenMusicResult<bool>;

    /// Set the cover URL. Returns false if the album does not exist.
    async fn album_set_cover(&self, id: &AlbumId, cover_url: &str) -> OpenMusicResult<bool>;

    /// Delete an album. Songs keep existing with their album cleared; likes
    /// on the album are removed.
    async fn album_delete(&self, id: &AlbumId) -> OpenMusicResult<bool>;

    // ========================================================================
    // SONG OPERATIONS
    // ========================================================================

    async fn song_insert(&self, song: &NewSong) -> OpenMusicResult<SongId>;

    async fn song_get(&self, id: &SongId) -> OpenMusicResult<Option<Song>>;

    /// Songs matching a case-insensitive substring filter.
    async fn song_list(&self, filter: &SongFilter) -> OpenMusicResult<Vec<SongSummary>>;

    async fn song_list_by_album(&self, album_id: &AlbumId) -> OpenMusicResult<Vec<SongSummary>>;

    async fn song_update(&self, id: &SongId, update: &SongUpdate) -> OpenMusicResult<bool>;

    /// Delete a song and its playlist memberships.
    async fn song_delete(&self, id: &SongId) -> OpenMusicResult<bool>;

    // ========================================================================
    // USER & SESSION OPERATIONS
    // ========================================================================

    /// Insert a user. A taken username is a unique violation.
    async fn user_insert(&self, user: &NewUser) -> OpenMusicResult<UserId>;

    async fn user_get(&self, id: &UserId) -> OpenMusicResult<Option<User>>;

    async fn user_get_by_username(&self, username: &str) -> OpenMusicResult<Option<User>>;

    /// Persist the digest of an issued refresh token.
    async fn refresh_token_insert(&self, token_digest: &str) -> OpenMusicResult<()>;

    async fn refresh_token_exists(&self, token_digest: &str) -> OpenMusicResult<bool>;

    async fn refresh_token_delete(&self, token_digest: &str) -> OpenMusicResult<bool>;

    // ========================================================================
    // PLAYLIST OPERATIONS
    // ========================================================================

    async fn playlist_insert(&self, playlist: &NewPlaylist) -> OpenMusicResult<PlaylistId>;

    async fn playlist_get(&self, id: &PlaylistId) -> OpenMusicResult<Option<Playlist>>;

    /// Playlist joined with the owner's username.
    async fn playlist_summary(&self, id: &PlaylistId) -> OpenMusicResult<Option<PlaylistSummary>>;

    /// Playlists the user owns or collaborates on, each listed once.
    async fn playlist_list_for_user(&self, user_id: &UserId)
        -> OpenMusicResult<Vec<PlaylistSummary>>;

    /// Delete a playlist with its memberships and collaborations. The
    /// activity ledger is kept.
    async fn playlist_delete(&self, id: &PlaylistId) -> OpenMusicResult<bool>;

    async fn playlist_songs(&self, id: &PlaylistId) -> OpenMusicResult<Vec<SongSummary>>;

    /// Add the activity's song to its playlist and append the activity, as
    /// one unit.
    async fn playlist_song_add_with_activity(&self, activity: &Activity) -> OpenMusicResult<()>;

    /// Remove the activity's song from its playlist and append the activity,
    /// as one unit. Returns false, with nothing written, if the song was not
    /// on the playlist.
    async fn playlist_song_remove_with_activity(&self, activity: &Activity)
        -> OpenMusicResult<bool>;

    // ========================================================================
    // COLLABORATION OPERATIONS
    // ========================================================================

    /// Insert a collaboration. A duplicate pair is a unique violation.
    async fn collaboration_insert(
        &self,
        playlist_id: &PlaylistId,
        user_id: &UserId,
    ) -> OpenMusicResult<CollaborationId>;

    async fn collaboration_exists(
        &self,
        playlist_id: &PlaylistId,
        user_id: &UserId,
    ) -> OpenMusicResult<bool>;

    async fn collaboration_delete(
        &self,
        playlist_id: &PlaylistId,
        user_id: &UserId,
    ) -> OpenMusicResult<bool>;

    // ========================================================================
    // ACTIVITY LEDGER
    // ========================================================================

    /// Append one ledger record.
    async fn activity_insert(&self, activity: &Activity) -> OpenMusicResult<()>;

    /// All records for a playlist, oldest first.
    async fn activity_list(&self, playlist_id: &PlaylistId) -> OpenMusicResult<Vec<ActivityEntry>>;

    // ========================================================================
    // LIKE OPERATIONS
    // ========================================================================

    /// Insert a like. A second like for the same (user, album) is a unique
    /// violation.
    async fn like_insert(&self, like: &Like) -> OpenMusicResult<()>;

    async fn like_delete(&self, user_id: &UserId, album_id: &AlbumId) -> OpenMusicResult<bool>;

    async fn like_count(&self, album_id: &AlbumId) -> OpenMusicResult<u64>;

    // ========================================================================
    // HEALTH
    // ========================================================================

    /// Cheap round trip used by the health endpoint.
    async fn ping(&self) -> OpenMusicResult<()> {
        Ok(())
    }
}

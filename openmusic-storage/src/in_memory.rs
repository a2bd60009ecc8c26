//! In-memory catalog store.
//!
//! All tables sit behind one `RwLock`, so the composite writes (membership
//! change plus ledger append, check-then-insert on unique pairs) are atomic
//! with respect to each other. Used by tests and single-process dev runs.

use std::collections::{BTreeMap, HashSet};

use ::async_trait::async_trait;
use openmusic_core::{
    now, Activity, ActivityAction, ActivityEntry, Album, AlbumId, AlbumUpdate, Collaboration,
    CollaborationId, EntityType, Like, NewAlbum, NewPlaylist, NewSong, NewUser, OpenMusicResult,
    Playlist, PlaylistId, PlaylistSummary, Song, SongFilter, SongId, SongSummary, SongUpdate,
    StorageError, User, UserId,
};
use tokio::sync::RwLock;

use crate::catalog::CatalogStore;

#[derive(Debug, Default)]
struct Tables {
    albums: BTreeMap<AlbumId, Album>,
    songs: BTreeMap<SongId, Song>,
    users: BTreeMap<UserId, User>,
    refresh_tokens: HashSet<String>,
    playlists: BTreeMap<PlaylistId, Playlist>,
    playlist_songs: Vec<(PlaylistId, SongId)>,
    collaborations: Vec<Collaboration>,
    activities: Vec<Activity>,
    likes: Vec<Like>,
}

impl Tables {
    fn username_of(&self, user_id: &UserId) -> Option<String> {
        self.users.get(user_id).map(|u| u.username.clone())
    }

    fn summarize(&self, playlist: &Playlist) -> PlaylistSummary {
        PlaylistSummary {
            id: playlist.id.clone(),
            name: playlist.name.clone(),
            // Mirrors the LEFT JOIN: an owner row that vanished yields an empty name.
            username: self.username_of(&playlist.owner).unwrap_or_default(),
        }
    }

    fn has_membership(&self, playlist_id: &PlaylistId, song_id: &SongId) -> bool {
        self.playlist_songs
            .iter()
            .any(|(p, s)| p == playlist_id && s == song_id)
    }
}

/// In-memory catalog store.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    tables: RwLock<Tables>,
}

impl InMemoryCatalog {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledger records for a playlist.
    pub async fn activity_count(&self, playlist_id: &PlaylistId) -> usize {
        self.tables
            .read()
            .await
            .activities
            .iter()
            .filter(|a| &a.playlist_id == playlist_id)
            .count()
    }

    /// Number of stored refresh token digests.
    pub async fn refresh_token_count(&self) -> usize {
        self.tables.read().await.refresh_tokens.len()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    // === Album Operations ===

    async fn album_insert(&self, album: &NewAlbum) -> OpenMusicResult<AlbumId> {
        let id = AlbumId::generate();
        let created_at = now();
        self.tables.write().await.albums.insert(
            id.clone(),
            Album {
                id: id.clone(),
                name: album.name.clone(),
                year: album.year,
                cover_url: None,
                created_at,
                updated_at: created_at,
            },
        );
        Ok(id)
    }

    async fn album_get(&self, id: &AlbumId) -> OpenMusicResult<Option<Album>> {
        Ok(self.tables.read().await.albums.get(id).cloned())
    }

    async fn album_update(&self, id: &AlbumId, update: &AlbumUpdate) -> OpenMusicResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(album) = tables.albums.get_mut(id) else {
            return Ok(false);
        };
        album.name = update.name.clone();
        album.year = update.year;
        album.updated_at = now();
        Ok(true)
    }

    async fn album_set_cover(&self, id: &AlbumId, cover_url: &str) -> OpenMusicResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(album) = tables.albums.get_mut(id) else {
            return Ok(false);
        };
        album.cover_url = Some(cover_url.to_string());
        album.updated_at = now();
        Ok(true)
    }

    async fn album_delete(&self, id: &AlbumId) -> OpenMusicResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.albums.remove(id).is_none() {
            return Ok(false);
        }
        for song in tables.songs.values_mut() {
            if song.album_id.as_ref() == Some(id) {
                song.album_id = None;
            }
        }
        tables.likes.retain(|l| &l.album_id != id);
        Ok(true)
    }

    // === Song Operations ===

    async fn song_insert(&self, song: &NewSong) -> OpenMusicResult<SongId> {
        let id = SongId::generate();
        self.tables.write().await.songs.insert(
            id.clone(),
            Song {
                id: id.clone(),
                title: song.title.clone(),
                year: song.year,
                genre: song.genre.clone(),
                performer: song.performer.clone(),
                duration: song.duration,
                album_id: song.album_id.clone(),
            },
        );
        Ok(id)
    }

    async fn song_get(&self, id: &SongId) -> OpenMusicResult<Option<Song>> {
        Ok(self.tables.read().await.songs.get(id).cloned())
    }

    async fn song_list(&self, filter: &SongFilter) -> OpenMusicResult<Vec<SongSummary>> {
        Ok(self
            .tables
            .read()
            .await
            .songs
            .values()
            .filter(|s| filter.matches(s))
            .map(Song::summary)
            .collect())
    }

    async fn song_list_by_album(&self, album_id: &AlbumId) -> OpenMusicResult<Vec<SongSummary>> {
        Ok(self
            .tables
            .read()
            .await
            .songs
            .values()
            .filter(|s| s.album_id.as_ref() == Some(album_id))
            .map(Song::summary)
            .collect())
    }

    async fn song_update(&self, id: &SongId, update: &SongUpdate) -> OpenMusicResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(song) = tables.songs.get_mut(id) else {
            return Ok(false);
        };
        song.title = update.title.clone();
        song.year = update.year;
        song.genre = update.genre.clone();
        song.performer = update.performer.clone();
        song.duration = update.duration;
        song.album_id = update.album_id.clone();
        Ok(true)
    }

    async fn song_delete(&self, id: &SongId) -> OpenMusicResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.songs.remove(id).is_none() {
            return Ok(false);
        }
        tables.playlist_songs.retain(|(_, s)| s != id);
        Ok(true)
    }

    // === User & Session Operations ===

    async fn user_insert(&self, user: &NewUser) -> OpenMusicResult<UserId> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StorageError::UniqueViolation {
                entity_type: EntityType::User,
                constraint: "users_username_key".to_string(),
            }
            .into());
        }
        let id = UserId::generate();
        tables.users.insert(
            id.clone(),
            User {
                id: id.clone(),
                username: user.username.clone(),
                password_hash: user.password_hash.clone(),
                fullname: user.fullname.clone(),
            },
        );
        Ok(id)
    }

    async fn user_get(&self, id: &UserId) -> OpenMusicResult<Option<User>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn user_get_by_username(&self, username: &str) -> OpenMusicResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn refresh_token_insert(&self, token_digest: &str) -> OpenMusicResult<()> {
        self.tables
            .write()
            .await
            .refresh_tokens
            .insert(token_digest.to_string());
        Ok(())
    }

    async fn refresh_token_exists(&self, token_digest: &str) -> OpenMusicResult<bool> {
        Ok(self.tables.read().await.refresh_tokens.contains(token_digest))
    }

    async fn refresh_token_delete(&self, token_digest: &str) -> OpenMusicResult<bool> {
        Ok(self.tables.write().await.refresh_tokens.remove(token_digest))
    }

    // === Playlist Operations ===

    async fn playlist_insert(&self, playlist: &NewPlaylist) -> OpenMusicResult<PlaylistId> {
        let id = PlaylistId::generate();
        self.tables.write().await.playlists.insert(
            id.clone(),
            Playlist {
                id: id.clone(),
                name: playlist.name.clone(),
                owner: playlist.owner.clone(),
            },
        );
        Ok(id)
    }

    async fn playlist_get(&self, id: &PlaylistId) -> OpenMusicResult<Option<Playlist>> {
        Ok(self.tables.read().await.playlists.get(id).cloned())
    }

    async fn playlist_summary(&self, id: &PlaylistId) -> OpenMusicResult<Option<PlaylistSummary>> {
        let tables = self.tables.read().await;
        Ok(tables.playlists.get(id).map(|p| tables.summarize(p)))
    }

    async fn playlist_list_for_user(
        &self,
        user_id: &UserId,
    ) -> OpenMusicResult<Vec<PlaylistSummary>> {
        let tables = self.tables.read().await;
        Ok(tables
            .playlists
            .values()
            .filter(|p| {
                &p.owner == user_id
                    || tables
                        .collaborations
                        .iter()
                        .any(|c| c.playlist_id == p.id && &c.user_id == user_id)
            })
            .map(|p| tables.summarize(p))
            .collect())
    }

    async fn playlist_delete(&self, id: &PlaylistId) -> OpenMusicResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.playlists.remove(id).is_none() {
            return Ok(false);
        }
        tables.playlist_songs.retain(|(p, _)| p != id);
        tables.collaborations.retain(|c| &c.playlist_id != id);
        Ok(true)
    }

    async fn playlist_songs(&self, id: &PlaylistId) -> OpenMusicResult<Vec<SongSummary>> {
        let tables = self.tables.read().await;
        Ok(tables
            .playlist_songs
            .iter()
            .filter(|(p, _)| p == id)
            .filter_map(|(_, s)| tables.songs.get(s).map(Song::summary))
            .collect())
    }

    async fn playlist_song_add_with_activity(&self, activity: &Activity) -> OpenMusicResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .playlist_songs
            .push((activity.playlist_id.clone(), activity.song_id.clone()));
        tables.activities.push(Activity {
            action: ActivityAction::Add,
            ..activity.clone()
        });
        Ok(())
    }

    async fn playlist_song_remove_with_activity(
        &self,
        activity: &Activity,
    ) -> OpenMusicResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.has_membership(&activity.playlist_id, &activity.song_id) {
            return Ok(false);
        }
        tables
            .playlist_songs
            .retain(|(p, s)| !(p == &activity.playlist_id && s == &activity.song_id));
        tables.activities.push(Activity {
            action: ActivityAction::Delete,
            ..activity.clone()
        });
        Ok(true)
    }

    // === Collaboration Operations ===

    async fn collaboration_insert(
        &self,
        playlist_id: &PlaylistId,
        user_id: &UserId,
    ) -> OpenMusicResult<CollaborationId> {
        let mut tables = self.tables.write().await;
        if tables
            .collaborations
            .iter()
            .any(|c| &c.playlist_id == playlist_id && &c.user_id == user_id)
        {
            return Err(StorageError::UniqueViolation {
                entity_type: EntityType::Collaboration,
                constraint: "collaborations_playlist_user_key".to_string(),
            }
            .into());
        }
        let id = CollaborationId::generate();
        tables.collaborations.push(Collaboration {
            id: id.clone(),
            playlist_id: playlist_id.clone(),
            user_id: user_id.clone(),
        });
        Ok(id)
    }

    async fn collaboration_exists(
        &self,
        playlist_id: &PlaylistId,
        user_id: &UserId,
    ) -> OpenMusicResult<bool> {
        Ok(self
            .tables
            .read()
            .await
            .collaborations
            .iter()
            .any(|c| &c.playlist_id == playlist_id && &c.user_id == user_id))
    }

    async fn collaboration_delete(
        &self,
        playlist_id: &PlaylistId,
        user_id: &UserId,
    ) -> OpenMusicResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.collaborations.len();
        tables
            .collaborations
            .retain(|c| !(&c.playlist_id == playlist_id && &c.user_id == user_id));
        Ok(tables.collaborations.len() < before)
    }

    // === Activity Ledger ===

    async fn activity_insert(&self, activity: &Activity) -> OpenMusicResult<()> {
        self.tables.write().await.activities.push(activity.clone());
        Ok(())
    }

    async fn activity_list(&self, playlist_id: &PlaylistId) -> OpenMusicResult<Vec<ActivityEntry>> {
        let tables = self.tables.read().await;
        let mut records: Vec<&Activity> = tables
            .activities
            .iter()
            .filter(|a| &a.playlist_id == playlist_id)
            .collect();
        // Stable: records with equal timestamps keep append order.
        records.sort_by_key(|a| a.time);
        Ok(records
            .into_iter()
            .map(|a| ActivityEntry {
                username: tables.username_of(&a.user_id),
                title: tables.songs.get(&a.song_id).map(|s| s.title.clone()),
                action: a.action,
                time: a.time,
            })
            .collect())
    }

    // === Like Operations ===

    async fn like_insert(&self, like: &Like) -> OpenMusicResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .likes
            .iter()
            .any(|l| l.user_id == like.user_id && l.album_id == like.album_id)
        {
            return Err(StorageError::UniqueViolation {
                entity_type: EntityType::Like,
                constraint: "user_album_likes_user_album_key".to_string(),
            }
            .into());
        }
        tables.likes.push(like.clone());
        Ok(())
    }

    async fn like_delete(&self, user_id: &UserId, album_id: &AlbumId) -> OpenMusicResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.likes.len();
        tables
            .likes
            .retain(|l| !(&l.user_id == user_id && &l.album_id == album_id));
        Ok(tables.likes.len() < before)
    }

    async fn like_count(&self, album_id: &AlbumId) -> OpenMusicResult<u64> {
        Ok(self
            .tables
            .read()
            .await
            .likes
            .iter()
            .filter(|l| &l.album_id == album_id)
            .count() as u64)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_song(title: &str, album_id: Option<AlbumId>) -> NewSong {
        NewSong {
            title: title.to_string(),
            year: 2008,
            genre: "Rock".to_string(),
            performer: "Coldplay".to_string(),
            duration: Some(242),
            album_id,
        }
    }

    async fn seed_user(store: &InMemoryCatalog, username: &str) -> UserId {
        store
            .user_insert(&NewUser {
                username: username.to_string(),
                password_hash: "hash".to_string(),
                fullname: username.to_uppercase(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_album_insert_update_delete() {
        let store = InMemoryCatalog::new();
        let id = store
            .album_insert(&NewAlbum {
                name: "Viva la Vida".to_string(),
                year: 2008,
            })
            .await
            .unwrap();
        assert!(id.as_str().starts_with("album-"));

        let updated = store
            .album_update(
                &id,
                &AlbumUpdate {
                    name: "Parachutes".to_string(),
                    year: 2000,
                },
            )
            .await
            .unwrap();
        assert!(updated);
        assert_eq!(store.album_get(&id).await.unwrap().unwrap().name, "Parachutes");

        assert!(store.album_delete(&id).await.unwrap());
        assert!(!store.album_delete(&id).await.unwrap());
        assert!(store.album_get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_album_delete_detaches_songs() {
        let store = InMemoryCatalog::new();
        let album = store
            .album_insert(&NewAlbum {
                name: "A".to_string(),
                year: 2000,
            })
            .await
            .unwrap();
        let song = store
            .song_insert(&new_song("Yellow", Some(album.clone())))
            .await
            .unwrap();
        assert_eq!(store.song_list_by_album(&album).await.unwrap().len(), 1);

        store.album_delete(&album).await.unwrap();
        assert_eq!(store.song_get(&song).await.unwrap().unwrap().album_id, None);
    }

    #[tokio::test]
    async fn test_update_missing_rows_reports_false() {
        let store = InMemoryCatalog::new();
        let missing_album = AlbumId::new("album-missing");
        let missing_song = SongId::new("song-missing");
        assert!(!store
            .album_update(
                &missing_album,
                &AlbumUpdate {
                    name: "x".to_string(),
                    year: 1
                }
            )
            .await
            .unwrap());
        assert!(!store.album_set_cover(&missing_album, "url").await.unwrap());
        assert!(!store
            .song_update(&missing_song, &new_song("x", None))
            .await
            .unwrap());
        assert!(!store.song_delete(&missing_song).await.unwrap());
    }

    #[tokio::test]
    async fn test_song_list_filters() {
        let store = InMemoryCatalog::new();
        store.song_insert(&new_song("Yellow", None)).await.unwrap();
        store.song_insert(&new_song("Fix You", None)).await.unwrap();

        let all = store.song_list(&SongFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = store
            .song_list(&SongFilter::new(Some("yel".to_string()), None))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Yellow");
    }

    #[tokio::test]
    async fn test_duplicate_username_is_unique_violation() {
        let store = InMemoryCatalog::new();
        seed_user(&store, "dicoding").await;
        let err = store
            .user_insert(&NewUser {
                username: "dicoding".to_string(),
                password_hash: "h".to_string(),
                fullname: "Other".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_playlist_membership_and_ledger_move_together() {
        let store = InMemoryCatalog::new();
        let owner = seed_user(&store, "owner").await;
        let song = store.song_insert(&new_song("Yellow", None)).await.unwrap();
        let playlist = store
            .playlist_insert(&NewPlaylist {
                name: "Road trip".to_string(),
                owner: owner.clone(),
            })
            .await
            .unwrap();

        let add = Activity::record(playlist.clone(), song.clone(), owner.clone(), ActivityAction::Add);
        store.playlist_song_add_with_activity(&add).await.unwrap();
        assert_eq!(store.playlist_songs(&playlist).await.unwrap().len(), 1);
        assert_eq!(store.activity_count(&playlist).await, 1);

        let remove = Activity::record(
            playlist.clone(),
            song.clone(),
            owner.clone(),
            ActivityAction::Delete,
        );
        assert!(store.playlist_song_remove_with_activity(&remove).await.unwrap());
        assert!(store.playlist_songs(&playlist).await.unwrap().is_empty());
        assert_eq!(store.activity_count(&playlist).await, 2);

        // Nothing to remove: no ledger record either.
        assert!(!store.playlist_song_remove_with_activity(&remove).await.unwrap());
        assert_eq!(store.activity_count(&playlist).await, 2);
    }

    #[tokio::test]
    async fn test_activity_list_joins_names_in_time_order() {
        let store = InMemoryCatalog::new();
        let owner = seed_user(&store, "owner").await;
        let song = store.song_insert(&new_song("Yellow", None)).await.unwrap();
        let playlist = PlaylistId::new("playlist-1");

        let mut later = Activity::record(
            playlist.clone(),
            song.clone(),
            owner.clone(),
            ActivityAction::Delete,
        );
        let earlier = Activity::record(playlist.clone(), song.clone(), owner.clone(), ActivityAction::Add);
        later.time = earlier.time + chrono::Duration::seconds(5);

        store.activity_insert(&later).await.unwrap();
        store.activity_insert(&earlier).await.unwrap();

        let entries = store.activity_list(&playlist).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, ActivityAction::Add);
        assert_eq!(entries[1].action, ActivityAction::Delete);
        assert_eq!(entries[0].username.as_deref(), Some("owner"));
        assert_eq!(entries[0].title.as_deref(), Some("Yellow"));
    }

    #[tokio::test]
    async fn test_playlists_for_user_include_collaborations_once() {
        let store = InMemoryCatalog::new();
        let owner = seed_user(&store, "owner").await;
        let guest = seed_user(&store, "guest").await;
        let playlist = store
            .playlist_insert(&NewPlaylist {
                name: "Shared".to_string(),
                owner: owner.clone(),
            })
            .await
            .unwrap();
        store
            .playlist_insert(&NewPlaylist {
                name: "Private".to_string(),
                owner: owner.clone(),
            })
            .await
            .unwrap();

        assert!(store
            .playlist_list_for_user(&guest)
            .await
            .unwrap()
            .is_empty());

        store.collaboration_insert(&playlist, &guest).await.unwrap();
        let dup = store.collaboration_insert(&playlist, &guest).await.unwrap_err();
        assert!(dup.is_unique_violation());

        let listed = store.playlist_list_for_user(&guest).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].username, "owner");
        assert_eq!(store.playlist_list_for_user(&owner).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_like_uniqueness_and_count() {
        let store = InMemoryCatalog::new();
        let user = UserId::new("user-1");
        let album = AlbumId::new("album-1");

        store.like_insert(&Like::new(user.clone(), album.clone())).await.unwrap();
        let err = store
            .like_insert(&Like::new(user.clone(), album.clone()))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(store.like_count(&album).await.unwrap(), 1);

        assert!(store.like_delete(&user, &album).await.unwrap());
        assert!(!store.like_delete(&user, &album).await.unwrap());
        assert_eq!(store.like_count(&album).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refresh_tokens() {
        let store = InMemoryCatalog::new();
        store.refresh_token_insert("digest").await.unwrap();
        assert!(store.refresh_token_exists("digest").await.unwrap());
        assert!(store.refresh_token_delete("digest").await.unwrap());
        assert!(!store.refresh_token_exists("digest").await.unwrap());
        assert_eq!(store.refresh_token_count().await, 0);
    }
}

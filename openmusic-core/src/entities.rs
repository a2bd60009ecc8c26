//! Catalog entities and the payloads used to create or change them.
//!
//! Field names serialize in camelCase because the same structs are written
//! into the cache and rendered by the HTTP layer.

use crate::identity::{
    ActivityId, AlbumId, CollaborationId, LikeId, PlaylistId, SongId, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ALBUMS
// ============================================================================

/// An album row as held by the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: AlbumId,
    pub name: String,
    pub year: i32,
    pub cover_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Album together with the songs that reference it. This is the value
/// cached under `album:<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumDetail {
    pub id: AlbumId,
    pub name: String,
    pub year: i32,
    pub cover_url: Option<String>,
    pub songs: Vec<SongSummary>,
}

impl AlbumDetail {
    pub fn from_album(album: Album, songs: Vec<SongSummary>) -> Self {
        Self {
            id: album.id,
            name: album.name,
            year: album.year,
            cover_url: album.cover_url,
            songs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlbum {
    pub name: String,
    pub year: i32,
}

/// Full replacement of an album's editable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumUpdate {
    pub name: String,
    pub year: i32,
}

// ============================================================================
// SONGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub performer: String,
    pub duration: Option<i32>,
    pub album_id: Option<AlbumId>,
}

impl Song {
    pub fn summary(&self) -> SongSummary {
        SongSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            performer: self.performer.clone(),
        }
    }
}

/// The projection used in listings, album details and playlists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSummary {
    pub id: SongId,
    pub title: String,
    pub performer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSong {
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub performer: String,
    pub duration: Option<i32>,
    pub album_id: Option<AlbumId>,
}

/// Full replacement of a song's editable fields.
pub type SongUpdate = NewSong;

/// Case-insensitive substring filter over title and performer. Both
/// conditions must hold when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongFilter {
    pub title: Option<String>,
    pub performer: Option<String>,
}

impl SongFilter {
    pub fn new(title: Option<String>, performer: Option<String>) -> Self {
        // Empty query parameters behave like absent ones.
        Self {
            title: title.filter(|t| !t.is_empty()),
            performer: performer.filter(|p| !p.is_empty()),
        }
    }

    pub fn matches(&self, song: &Song) -> bool {
        fn contains_ci(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }
        self.title
            .as_deref()
            .map_or(true, |t| contains_ci(&song.title, t))
            && self
                .performer
                .as_deref()
                .map_or(true, |p| contains_ci(&song.performer, p))
    }
}

// ============================================================================
// USERS
// ============================================================================

/// A registered user. `password_hash` is a PHC string and is never
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub fullname: String,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            username: self.username.clone(),
            fullname: self.fullname.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub fullname: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub fullname: String,
}

// ============================================================================
// PLAYLISTS & COLLABORATIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub owner: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlaylist {
    pub name: String,
    pub owner: UserId,
}

/// Playlist with the owner's username, as listed to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: PlaylistId,
    pub name: String,
    pub username: String,
}

/// Cached under `playlist_songs:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSongs {
    pub playlist: PlaylistSummary,
    pub songs: Vec<SongSummary>,
}

/// Grants a non-owner access to a playlist. At most one per
/// (playlist, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaboration {
    pub id: CollaborationId,
    pub playlist_id: PlaylistId,
    pub user_id: UserId,
}

// ============================================================================
// ACTIVITY LEDGER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Add,
    Delete,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Add => "add",
            ActivityAction::Delete => "delete",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(ActivityAction::Add),
            "delete" => Ok(ActivityAction::Delete),
            other => Err(format!("unknown activity action: {other}")),
        }
    }
}

/// One immutable ledger record. There is no update or delete for these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub playlist_id: PlaylistId,
    pub song_id: SongId,
    pub user_id: UserId,
    pub action: ActivityAction,
    pub time: Timestamp,
}

impl Activity {
    /// Stamp a new record with a server-generated id and the current time.
    pub fn record(
        playlist_id: PlaylistId,
        song_id: SongId,
        user_id: UserId,
        action: ActivityAction,
    ) -> Self {
        Self {
            id: ActivityId::generate(),
            playlist_id,
            song_id,
            user_id,
            action,
            time: crate::identity::now(),
        }
    }
}

/// Ledger record joined with the acting user's name and the song title.
/// Either side may be gone by the time the ledger is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub username: Option<String>,
    pub title: Option<String>,
    pub action: ActivityAction,
    pub time: Timestamp,
}

// ============================================================================
// LIKES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: LikeId,
    pub user_id: UserId,
    pub album_id: AlbumId,
    pub created_at: Timestamp,
}

impl Like {
    pub fn new(user_id: UserId, album_id: AlbumId) -> Self {
        Self {
            id: LikeId::generate(),
            user_id,
            album_id,
            created_at: crate::identity::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(title: &str, performer: &str) -> Song {
        Song {
            id: SongId::generate(),
            title: title.to_string(),
            year: 2008,
            genre: "Indie".to_string(),
            performer: performer.to_string(),
            duration: Some(120),
            album_id: None,
        }
    }

    #[test]
    fn test_song_filter_is_case_insensitive_substring() {
        let filter = SongFilter::new(Some("LIFE".to_string()), None);
        assert!(filter.matches(&song("Life in Technicolor", "Coldplay")));
        assert!(!filter.matches(&song("Viva la Vida", "Coldplay")));
    }

    #[test]
    fn test_song_filter_requires_both_conditions() {
        let filter = SongFilter::new(Some("vida".to_string()), Some("cold".to_string()));
        assert!(filter.matches(&song("Viva la Vida", "Coldplay")));
        assert!(!filter.matches(&song("Viva la Vida", "Pendleton")));
    }

    #[test]
    fn test_empty_filter_fields_are_ignored() {
        let filter = SongFilter::new(Some(String::new()), Some(String::new()));
        assert_eq!(filter, SongFilter::default());
        assert!(filter.matches(&song("Anything", "Anyone")));
    }

    #[test]
    fn test_user_serialization_omits_password_hash() {
        let user = User {
            id: UserId::new("user-1"),
            username: "dicoding".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            fullname: "Dicoding Indonesia".to_string(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_album_detail_uses_camel_case() {
        let detail = AlbumDetail {
            id: AlbumId::new("album-1"),
            name: "Viva la Vida".to_string(),
            year: 2008,
            cover_url: Some("http://localhost/upload/images/cover.jpg".to_string()),
            songs: vec![],
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert!(json.get("coverUrl").is_some());
        assert!(json.get("cover_url").is_none());
    }

    #[test]
    fn test_activity_action_parse() {
        assert_eq!("add".parse::<ActivityAction>().unwrap(), ActivityAction::Add);
        assert_eq!(
            "delete".parse::<ActivityAction>().unwrap(),
            ActivityAction::Delete
        );
        assert!("remove".parse::<ActivityAction>().is_err());
        assert_eq!(
            serde_json::to_string(&ActivityAction::Delete).unwrap(),
            "\"delete\""
        );
    }
}

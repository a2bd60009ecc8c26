//! Request payloads.
//!
//! Fields are optional on the wire so a missing field is reported by name
//! instead of as a generic JSON error. Each payload validates itself into
//! the domain type the services take.

use openmusic_core::{AlbumId, AlbumUpdate, NewAlbum, NewSong, PlaylistId, SongId, SongUpdate, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::validation::{
    required, validate_email, validate_release_year, ValidateNonEmpty, ValidateRange,
};

// ============================================================================
// ALBUMS & SONGS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlbumPayload {
    pub name: Option<String>,
    pub year: Option<i32>,
}

impl AlbumPayload {
    pub fn into_new_album(self) -> ApiResult<NewAlbum> {
        self.name.validate_non_empty("name")?;
        let year = required(self.year, "year")?;
        validate_release_year(year)?;
        Ok(NewAlbum {
            name: required(self.name, "name")?,
            year,
        })
    }

    pub fn into_update(self) -> ApiResult<AlbumUpdate> {
        let album = self.into_new_album()?;
        Ok(AlbumUpdate {
            name: album.name,
            year: album.year,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongPayload {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub performer: Option<String>,
    pub duration: Option<i32>,
    pub album_id: Option<String>,
}

impl SongPayload {
    pub fn into_new_song(self) -> ApiResult<NewSong> {
        self.title.validate_non_empty("title")?;
        self.genre.validate_non_empty("genre")?;
        self.performer.validate_non_empty("performer")?;
        let year = required(self.year, "year")?;
        if let Some(duration) = self.duration {
            duration.validate_positive("duration")?;
        }
        Ok(NewSong {
            title: required(self.title, "title")?,
            year,
            genre: required(self.genre, "genre")?,
            performer: required(self.performer, "performer")?,
            duration: self.duration,
            album_id: self
                .album_id
                .filter(|id| !id.trim().is_empty())
                .map(AlbumId::new),
        })
    }

    pub fn into_update(self) -> ApiResult<SongUpdate> {
        self.into_new_song()
    }
}

/// `GET /songs` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongQuery {
    pub title: Option<String>,
    pub performer: Option<String>,
}

// ============================================================================
// USERS & AUTHENTICATION
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPayload {
    pub username: Option<String>,
    pub password: Option<String>,
    pub fullname: Option<String>,
}

/// Validated registration request.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub fullname: String,
}

impl UserPayload {
    pub fn into_registration(self) -> ApiResult<Registration> {
        self.username.validate_non_empty("username")?;
        self.password.validate_non_empty("password")?;
        self.fullname.validate_non_empty("fullname")?;
        Ok(Registration {
            username: required(self.username, "username")?,
            password: required(self.password, "password")?,
            fullname: required(self.fullname, "fullname")?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginPayload {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginPayload {
    pub fn into_credentials(self) -> ApiResult<(String, String)> {
        self.username.validate_non_empty("username")?;
        self.password.validate_non_empty("password")?;
        Ok((
            required(self.username, "username")?,
            required(self.password, "password")?,
        ))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenPayload {
    pub refresh_token: Option<String>,
}

impl RefreshTokenPayload {
    pub fn into_token(self) -> ApiResult<String> {
        self.refresh_token.validate_non_empty("refreshToken")?;
        required(self.refresh_token, "refreshToken")
    }
}

/// Tokens issued at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

// ============================================================================
// PLAYLISTS, COLLABORATIONS & EXPORTS
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistPayload {
    pub name: Option<String>,
}

impl PlaylistPayload {
    pub fn into_name(self) -> ApiResult<String> {
        self.name.validate_non_empty("name")?;
        required(self.name, "name")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSongPayload {
    pub song_id: Option<String>,
}

impl PlaylistSongPayload {
    pub fn into_song_id(self) -> ApiResult<SongId> {
        self.song_id.validate_non_empty("songId")?;
        required(self.song_id, "songId").map(SongId::new)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationPayload {
    pub playlist_id: Option<String>,
    pub user_id: Option<String>,
}

impl CollaborationPayload {
    pub fn into_ids(self) -> ApiResult<(PlaylistId, UserId)> {
        self.playlist_id.validate_non_empty("playlistId")?;
        self.user_id.validate_non_empty("userId")?;
        Ok((
            required(self.playlist_id, "playlistId").map(PlaylistId::new)?,
            required(self.user_id, "userId").map(UserId::new)?,
        ))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub target_email: Option<String>,
}

impl ExportPayload {
    pub fn into_target_email(self) -> ApiResult<String> {
        self.target_email.validate_non_empty("targetEmail")?;
        let email = required(self.target_email, "targetEmail")?;
        validate_email(&email, "targetEmail")?;
        Ok(email)
    }
}

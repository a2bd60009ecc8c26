//! Identity types for OpenMusic entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Current wall-clock time.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Entity type discriminator used in error messages and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Album,
    Song,
    User,
    Playlist,
    Collaboration,
    Activity,
    Like,
}

impl EntityType {
    /// Lowercase name as it appears in log fields and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Album => "album",
            EntityType::Song => "song",
            EntityType::User => "user",
            EntityType::Playlist => "playlist",
            EntityType::Collaboration => "collaboration",
            EntityType::Activity => "activity",
            EntityType::Like => "like",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declares an opaque string identifier with a type prefix.
///
/// Generated ids look like `album-0190a4b2c3d47e8f9a0b1c2d3e4f5a6b`: the
/// prefix followed by the simple form of a UUIDv7, so ids of one type sort
/// by creation time. Ids received from clients are accepted as-is.
macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal, $entity:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;
            pub const ENTITY: EntityType = EntityType::$entity;

            /// Generate a fresh, time-sortable id.
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::now_v7().simple()))
            }

            /// Wrap an id supplied by a client or read from storage.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }
    };
}

define_entity_id!(
    /// Album identifier (`album-...`).
    AlbumId, "album", Album
);
define_entity_id!(
    /// Song identifier (`song-...`).
    SongId, "song", Song
);
define_entity_id!(
    /// User identifier (`user-...`).
    UserId, "user", User
);
define_entity_id!(
    /// Playlist identifier (`playlist-...`).
    PlaylistId, "playlist", Playlist
);
define_entity_id!(CollaborationId, "collab", Collaboration);
define_entity_id!(ActivityId, "activity", Activity);
define_entity_id!(LikeId, "like", Like);

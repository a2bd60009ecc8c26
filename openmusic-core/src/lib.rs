//! OpenMusic Core - Entity Types
//!
//! Pure data structures shared by the storage layer and the HTTP API:
//! typed identifiers, catalog entities, the cache key namespace and the
//! error taxonomy. No I/O lives here.

pub mod cache_keys;
pub mod entities;
pub mod error;
pub mod identity;

pub use cache_keys::{CacheKey, CacheTtl};
pub use entities::{
    Activity, ActivityAction, ActivityEntry, Album, AlbumDetail, AlbumUpdate, Collaboration,
    Like, NewAlbum, NewPlaylist, NewSong, NewUser, Playlist, PlaylistSongs,
    PlaylistSummary, Song, SongFilter, SongSummary, SongUpdate, User, UserProfile,
};
pub use error::{
    CacheError, ConfigError, OpenMusicError, OpenMusicResult, StorageError, ValidationError,
};
pub use identity::{
    now, ActivityId, AlbumId, CollaborationId, EntityType, LikeId, PlaylistId, SongId, Timestamp,
    UserId,
};

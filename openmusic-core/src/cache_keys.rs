//! Cache key namespace.
//!
//! Every key the catalog writes into the cache is built here so the read
//! path and the invalidation path can never disagree on spelling.
//!
//! | Key                                   | TTL   |
//! |---------------------------------------|-------|
//! | `album:<id>`                          | 1800s |
//! | `song:<id>`                           | 3600s |
//! | `songs:<title\|all>:<performer\|all>` | 1800s |
//! | `playlist_songs:<playlistId>`         | 1800s |
//! | `album_likes:<albumId>`               | 1800s |

use crate::entities::SongFilter;
use crate::identity::{AlbumId, PlaylistId, SongId};
use std::time::Duration;

/// Expiry applied when a key is populated on a read miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl;

impl CacheTtl {
    pub const ALBUM: Duration = Duration::from_secs(1800);
    pub const SONG: Duration = Duration::from_secs(3600);
    pub const SONG_LIST: Duration = Duration::from_secs(1800);
    pub const PLAYLIST_SONGS: Duration = Duration::from_secs(1800);
    pub const ALBUM_LIKES: Duration = Duration::from_secs(1800);
}

/// Key builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKey;

impl CacheKey {
    /// Prefix shared by every filtered song listing.
    pub const SONG_LIST_PREFIX: &'static str = "songs:";

    const ALL: &'static str = "all";

    pub fn album(id: &AlbumId) -> String {
        format!("album:{id}")
    }

    pub fn song(id: &SongId) -> String {
        format!("song:{id}")
    }

    /// Listing key for `filter`, or `None` when a filter value would make
    /// the key ambiguous (the literal `all`, or a `:` separator). Such
    /// listings are served straight from the store.
    pub fn song_list(filter: &SongFilter) -> Option<String> {
        let title = Self::list_component(filter.title.as_deref())?;
        let performer = Self::list_component(filter.performer.as_deref())?;
        Some(format!("{}{}:{}", Self::SONG_LIST_PREFIX, title, performer))
    }

    fn list_component(value: Option<&str>) -> Option<&str> {
        match value {
            None => Some(Self::ALL),
            Some(v) if v == Self::ALL || v.contains(':') => None,
            Some(v) => Some(v),
        }
    }

    pub fn playlist_songs(id: &PlaylistId) -> String {
        format!("playlist_songs:{id}")
    }

    pub fn album_likes(id: &AlbumId) -> String {
        format!("album_likes:{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_resource_keys() {
        assert_eq!(CacheKey::album(&AlbumId::new("album-1")), "album:album-1");
        assert_eq!(CacheKey::song(&SongId::new("song-1")), "song:song-1");
        assert_eq!(
            CacheKey::playlist_songs(&PlaylistId::new("p-1")),
            "playlist_songs:p-1"
        );
        assert_eq!(
            CacheKey::album_likes(&AlbumId::new("album-1")),
            "album_likes:album-1"
        );
    }

    #[test]
    fn test_song_list_key_defaults_to_all() {
        assert_eq!(
            CacheKey::song_list(&SongFilter::default()).as_deref(),
            Some("songs:all:all")
        );
        let filter = SongFilter::new(None, Some("Coldplay".to_string()));
        assert_eq!(
            CacheKey::song_list(&filter).as_deref(),
            Some("songs:all:Coldplay")
        );
    }

    #[test]
    fn test_song_list_key_refuses_ambiguous_filters() {
        let literal_all = SongFilter::new(Some("all".to_string()), None);
        assert_eq!(CacheKey::song_list(&literal_all), None);

        let with_separator = SongFilter::new(Some("a:b".to_string()), None);
        assert_eq!(CacheKey::song_list(&with_separator), None);
        let split_across = SongFilter::new(Some("a".to_string()), Some("b:all".to_string()));
        assert_eq!(CacheKey::song_list(&split_across), None);

        // Only the exact sentinel is reserved.
        let mixed_case = SongFilter::new(Some("All".to_string()), None);
        assert_eq!(
            CacheKey::song_list(&mixed_case).as_deref(),
            Some("songs:All:all")
        );
    }

    #[test]
    fn test_ttls() {
        assert_eq!(CacheTtl::ALBUM.as_secs(), 1800);
        assert_eq!(CacheTtl::SONG.as_secs(), 3600);
        assert_eq!(CacheTtl::SONG_LIST.as_secs(), 1800);
        assert_eq!(CacheTtl::PLAYLIST_SONGS.as_secs(), 1800);
        assert_eq!(CacheTtl::ALBUM_LIKES.as_secs(), 1800);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every filtered listing key falls under the prefix that song writes
        /// invalidate.
        #[test]
        fn prop_song_list_keys_share_invalidation_prefix(
            title in proptest::option::of("[a-zA-Z0-9 ]{0,24}"),
            performer in proptest::option::of("[a-zA-Z0-9 ]{0,24}"),
        ) {
            if let Some(key) = CacheKey::song_list(&SongFilter::new(title, performer)) {
                prop_assert!(key.starts_with(CacheKey::SONG_LIST_PREFIX));
            }
        }

        /// Distinct filters never share a listing key.
        #[test]
        fn prop_song_list_keys_are_distinct(
            a in (proptest::option::of("[a-l:]{1,6}"), proptest::option::of("[a-l:]{1,6}")),
            b in (proptest::option::of("[a-l:]{1,6}"), proptest::option::of("[a-l:]{1,6}")),
        ) {
            let fa = SongFilter::new(a.0, a.1);
            let fb = SongFilter::new(b.0, b.1);
            if let (Some(ka), Some(kb)) = (CacheKey::song_list(&fa), CacheKey::song_list(&fb)) {
                prop_assert_eq!(ka == kb, fa == fb);
            }
        }

        /// Per-song keys never collide with listing keys.
        #[test]
        fn prop_song_key_outside_listing_prefix(id in "[a-z0-9-]{1,40}") {
            let key = CacheKey::song(&SongId::new(id));
            prop_assert!(!key.starts_with(CacheKey::SONG_LIST_PREFIX));
        }
    }
}

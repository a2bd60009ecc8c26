//! Property-Based Tests for Cache-Aside Reads
//!
//! For any song filter, a read after a miss is served from the cache with
//! the same value, and any song write makes the next read reload. A filter
//! equal to the `all` sentinel never touches the cache.

use openmusic_api::services;
use openmusic_core::{CacheKey, NewSong, SongFilter};
use openmusic_storage::InMemoryCatalog;
use openmusic_test_utils::generators::{arb_new_song, arb_song_filter};
use openmusic_test_utils::recording_cache;
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_listing_cached_until_song_write(
        songs in proptest::collection::vec(arb_new_song(), 0..6),
        extra in arb_new_song(),
        filter in arb_song_filter(),
    ) {
        runtime().block_on(async {
            let store = InMemoryCatalog::new();
            let (backend, cache) = recording_cache();
            for song in &songs {
                services::create_song(&store, &cache, song).await.unwrap();
            }

            let key = CacheKey::song_list(&filter);
            let first = services::list_songs(&store, &cache, &filter).await.unwrap();
            prop_assert!(!first.was_cache_hit());
            match &key {
                Some(key) => prop_assert!(backend.inner().contains(key).await),
                None => prop_assert!(backend.inner().is_empty().await),
            }

            // Filters without an unambiguous key are never served from cache.
            let second = services::list_songs(&store, &cache, &filter).await.unwrap();
            prop_assert_eq!(second.was_cache_hit(), key.is_some());
            let mut a = first.into_value();
            let mut b = second.into_value();
            a.sort_by(|x, y| x.id.as_str().cmp(y.id.as_str()));
            b.sort_by(|x, y| x.id.as_str().cmp(y.id.as_str()));
            prop_assert_eq!(a, b);

            services::create_song(&store, &cache, &extra).await.unwrap();
            let third = services::list_songs(&store, &cache, &filter).await.unwrap();
            prop_assert!(!third.was_cache_hit());
            prop_assert_eq!(third.value().len(), expected_len(&songs, &extra, &filter));
            Ok(())
        })?;
    }
}

fn expected_len(songs: &[NewSong], extra: &NewSong, filter: &SongFilter) -> usize {
    let matches = |song: &NewSong| {
        let contains = |haystack: &str, needle: &Option<String>| {
            needle
                .as_deref()
                .map_or(true, |n| haystack.to_lowercase().contains(&n.to_lowercase()))
        };
        contains(&song.title, &filter.title) && contains(&song.performer, &filter.performer)
    };
    songs.iter().chain(std::iter::once(extra)).filter(|s| matches(s)).count()
}

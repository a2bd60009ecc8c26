//! Playlist REST Routes
//!
//! Every route here requires an access token. Deleting a playlist is
//! owner-only; song membership and the activity ledger are open to
//! collaborators as well.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use openmusic_core::{PlaylistId, PlaylistSummary, SongSummary};
use serde::Serialize;
use serde_json::json;

use crate::{
    error::ApiResult,
    extract::JsonBody,
    middleware::AuthUser,
    response::Success,
    services,
    state::AppState,
    types::{PlaylistPayload, PlaylistSongPayload},
};

/// Playlist fields with its songs inlined.
#[derive(Debug, Serialize)]
struct PlaylistWithSongs {
    #[serde(flatten)]
    playlist: PlaylistSummary,
    songs: Vec<SongSummary>,
}

/// POST /playlists - Create a playlist owned by the caller
pub async fn create_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(payload): JsonBody<PlaylistPayload>,
) -> ApiResult<impl IntoResponse> {
    let name = payload.into_name()?;
    let playlist_id = services::create_playlist(state.store.as_ref(), &auth.user_id, name).await?;
    Ok(Success::created(json!({ "playlistId": playlist_id })))
}

/// GET /playlists - Playlists the caller owns or collaborates on
pub async fn list_playlists(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let playlists = services::list_playlists(state.store.as_ref(), &auth.user_id).await?;
    Ok(Success::ok(json!({ "playlists": playlists })))
}

/// DELETE /playlists/:id - Delete a playlist (owner only)
pub async fn delete_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    services::delete_playlist(
        state.store.as_ref(),
        &state.cache,
        &PlaylistId::new(id),
        &auth.user_id,
    )
    .await?;
    Ok(Success::message("Playlist deleted"))
}

/// POST /playlists/:id/songs - Add a song
pub async fn add_song(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<PlaylistSongPayload>,
) -> ApiResult<impl IntoResponse> {
    let song_id = payload.into_song_id()?;
    services::add_playlist_song(
        state.store.as_ref(),
        &state.cache,
        &PlaylistId::new(id),
        &song_id,
        &auth.user_id,
    )
    .await?;
    Ok(Success::created_message("Song added to playlist"))
}

/// GET /playlists/:id/songs - Playlist with its songs
pub async fn get_songs(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let read = services::get_playlist_songs(
        state.store.as_ref(),
        &state.cache,
        &PlaylistId::new(id),
        &auth.user_id,
    )
    .await?
    .into_value();

    let playlist = PlaylistWithSongs {
        playlist: read.playlist,
        songs: read.songs,
    };
    Ok(Success::ok(json!({ "playlist": playlist })))
}

/// DELETE /playlists/:id/songs - Remove a song
pub async fn remove_song(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<PlaylistSongPayload>,
) -> ApiResult<impl IntoResponse> {
    let song_id = payload.into_song_id()?;
    services::remove_playlist_song(
        state.store.as_ref(),
        &state.cache,
        &PlaylistId::new(id),
        &song_id,
        &auth.user_id,
    )
    .await?;
    Ok(Success::message("Song removed from playlist"))
}

/// GET /playlists/:id/activities - Activity ledger
pub async fn list_activities(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let playlist_id = PlaylistId::new(id);
    let activities =
        services::list_activities(state.store.as_ref(), &playlist_id, &auth.user_id).await?;
    Ok(Success::ok(json!({
        "playlistId": playlist_id,
        "activities": activities,
    })))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/",
            axum::routing::post(create_playlist).get(list_playlists),
        )
        .route("/:id", axum::routing::delete(delete_playlist))
        .route(
            "/:id/songs",
            axum::routing::post(add_song).get(get_songs).delete(remove_song),
        )
        .route("/:id/activities", axum::routing::get(list_activities))
}

//! Song REST Routes

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use openmusic_core::{SongFilter, SongId};
use serde_json::json;

use crate::{
    error::ApiResult,
    extract::JsonBody,
    response::Success,
    services,
    state::AppState,
    types::{SongPayload, SongQuery},
};

/// POST /songs - Create a song
pub async fn create_song(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SongPayload>,
) -> ApiResult<impl IntoResponse> {
    let song = payload.into_new_song()?;
    let song_id = services::create_song(state.store.as_ref(), &state.cache, &song).await?;
    Ok(Success::created(json!({ "songId": song_id })))
}

/// GET /songs?title=&performer= - Filtered listing
pub async fn list_songs(
    State(state): State<AppState>,
    Query(query): Query<SongQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = SongFilter::new(query.title, query.performer);
    let songs = services::list_songs(state.store.as_ref(), &state.cache, &filter).await?;
    Ok(Success::ok(json!({ "songs": songs.into_value() })))
}

/// GET /songs/:id - One song
pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let song = services::get_song(state.store.as_ref(), &state.cache, &SongId::new(id)).await?;
    Ok(Success::ok(json!({ "song": song.into_value() })))
}

/// PUT /songs/:id - Replace a song
pub async fn update_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<SongPayload>,
) -> ApiResult<impl IntoResponse> {
    let update = payload.into_update()?;
    services::update_song(state.store.as_ref(), &state.cache, &SongId::new(id), &update).await?;
    Ok(Success::message("Song updated"))
}

/// DELETE /songs/:id - Delete a song
pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    services::delete_song(state.store.as_ref(), &state.cache, &SongId::new(id)).await?;
    Ok(Success::message("Song deleted"))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::post(create_song).get(list_songs))
        .route(
            "/:id",
            axum::routing::get(get_song).put(update_song).delete(delete_song),
        )
}

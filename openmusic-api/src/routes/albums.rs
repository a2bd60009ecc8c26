//! Album REST Routes
//!
//! Albums, their cover uploads and their likes.

use axum::{
    extract::{Multipart, Path, State},
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use openmusic_core::AlbumId;
use serde_json::json;

use crate::{
    error::{ApiError, ApiResult},
    extract::JsonBody,
    middleware::AuthUser,
    response::Success,
    services,
    state::AppState,
    types::AlbumPayload,
};

/// Header set on like counts served from the cache.
pub const DATA_SOURCE_HEADER: HeaderName = HeaderName::from_static("x-data-source");

/// Multipart field carrying the cover image.
const COVER_FIELD: &str = "cover";

// ============================================================================
// ALBUMS
// ============================================================================

/// POST /albums - Create an album
pub async fn create_album(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AlbumPayload>,
) -> ApiResult<impl IntoResponse> {
    let album = payload.into_new_album()?;
    let album_id = services::create_album(state.store.as_ref(), &album).await?;
    Ok(Success::created(json!({ "albumId": album_id })))
}

/// GET /albums/:id - Album with its songs
pub async fn get_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let album = services::get_album(state.store.as_ref(), &state.cache, &AlbumId::new(id)).await?;
    Ok(Success::ok(json!({ "album": album.into_value() })))
}

/// PUT /albums/:id - Replace name and year
pub async fn update_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<AlbumPayload>,
) -> ApiResult<impl IntoResponse> {
    let update = payload.into_update()?;
    services::update_album(state.store.as_ref(), &state.cache, &AlbumId::new(id), &update).await?;
    Ok(Success::message("Album updated"))
}

/// DELETE /albums/:id - Delete an album
pub async fn delete_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    services::delete_album(state.store.as_ref(), &state.cache, &AlbumId::new(id)).await?;
    Ok(Success::message("Album deleted"))
}

// ============================================================================
// COVERS
// ============================================================================

fn multipart_error(err: axum::extract::multipart::MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(limit)
    } else {
        ApiError::invalid_input(err.body_text())
    }
}

/// POST /albums/:id/covers - Upload a cover image (multipart field `cover`)
pub async fn upload_cover(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let limit = state.covers.max_bytes();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(COVER_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(ApiError::invalid_format(COVER_FIELD, "an image/* content type"));
        }
        let file_name = field.file_name().unwrap_or(COVER_FIELD).to_string();
        let contents = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        if contents.len() > limit {
            return Err(ApiError::payload_too_large(limit));
        }

        let url = services::set_album_cover(
            state.store.as_ref(),
            &state.cache,
            &state.covers,
            &AlbumId::new(id),
            &file_name,
            &contents,
        )
        .await?;
        return Ok(Success::created(json!({ "coverUrl": url })).with_message("Cover uploaded"));
    }

    Err(ApiError::missing_field(COVER_FIELD))
}

// ============================================================================
// LIKES
// ============================================================================

/// POST /albums/:id/likes - Like an album
pub async fn like_album(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    services::add_like(state.store.as_ref(), &state.cache, &auth.user_id, &AlbumId::new(id)).await?;
    Ok(Success::created_message("Album liked"))
}

/// DELETE /albums/:id/likes - Take a like back
pub async fn unlike_album(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    services::remove_like(state.store.as_ref(), &state.cache, &auth.user_id, &AlbumId::new(id))
        .await?;
    Ok(Success::message("Album unliked"))
}

/// GET /albums/:id/likes - Like count
pub async fn album_likes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let read = services::likes_count(state.store.as_ref(), &state.cache, &AlbumId::new(id)).await?;
    let from_cache = read.was_cache_hit();

    let mut response = Success::ok(json!({ "likes": read.into_value() })).into_response();
    if from_cache {
        response
            .headers_mut()
            .insert(DATA_SOURCE_HEADER, HeaderValue::from_static("cache"));
    }
    Ok(response)
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::post(create_album))
        .route(
            "/:id",
            axum::routing::get(get_album)
                .put(update_album)
                .delete(delete_album),
        )
        .route("/:id/covers", axum::routing::post(upload_cover))
        .route(
            "/:id/likes",
            axum::routing::post(like_album)
                .delete(unlike_album)
                .get(album_likes),
        )
}

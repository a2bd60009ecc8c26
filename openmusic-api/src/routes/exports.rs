//! Export REST Routes

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use openmusic_core::PlaylistId;

use crate::{
    error::ApiResult, extract::JsonBody, middleware::AuthUser, response::Success, services,
    state::AppState, types::ExportPayload,
};

/// POST /export/playlists/:id - Queue a playlist export by e-mail
pub async fn export_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<ExportPayload>,
) -> ApiResult<impl IntoResponse> {
    let target_email = payload.into_target_email()?;
    services::export_playlist(
        state.store.as_ref(),
        state.producer.as_ref(),
        &PlaylistId::new(id),
        &auth.user_id,
        target_email,
    )
    .await?;
    Ok(Success::created_message("Your request is being processed"))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route("/playlists/:id", axum::routing::post(export_playlist))
}

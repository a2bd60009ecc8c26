//! Collaboration REST Routes

use axum::{extract::State, response::IntoResponse};
use serde_json::json;

use crate::{
    error::ApiResult, extract::JsonBody, middleware::AuthUser, response::Success, services,
    state::AppState, types::CollaborationPayload,
};

/// POST /collaborations - Add a collaborator (playlist owner only)
pub async fn add_collaboration(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(payload): JsonBody<CollaborationPayload>,
) -> ApiResult<impl IntoResponse> {
    let (playlist_id, user_id) = payload.into_ids()?;
    let collaboration_id =
        services::add_collaborator(state.store.as_ref(), &playlist_id, &user_id, &auth.user_id)
            .await?;
    Ok(Success::created(json!({ "collaborationId": collaboration_id })))
}

/// DELETE /collaborations - Remove a collaborator (playlist owner only)
pub async fn delete_collaboration(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(payload): JsonBody<CollaborationPayload>,
) -> ApiResult<impl IntoResponse> {
    let (playlist_id, user_id) = payload.into_ids()?;
    services::remove_collaborator(state.store.as_ref(), &playlist_id, &user_id, &auth.user_id)
        .await?;
    Ok(Success::message("Collaboration removed"))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route(
        "/",
        axum::routing::post(add_collaboration).delete(delete_collaboration),
    )
}

//! User REST Routes

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use openmusic_core::UserId;
use serde_json::json;

use crate::{
    error::ApiResult, extract::JsonBody, response::Success, services, state::AppState,
    types::UserPayload,
};

/// POST /users - Register
pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> ApiResult<impl IntoResponse> {
    let registration = payload.into_registration()?;
    let user_id = services::register_user(state.store.as_ref(), registration).await?;
    Ok(Success::created(json!({ "userId": user_id })))
}

/// GET /users/:id - Public profile
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = services::get_user(state.store.as_ref(), &UserId::new(id)).await?;
    Ok(Success::ok(json!({ "user": user })))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::post(register_user))
        .route("/:id", axum::routing::get(get_user))
}

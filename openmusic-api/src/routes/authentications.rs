//! Authentication REST Routes
//!
//! Login issues an access/refresh pair, PUT trades a refresh token for a new
//! access token, DELETE revokes the refresh token.

use axum::{extract::State, response::IntoResponse};
use serde_json::json;

use crate::{
    error::ApiResult,
    extract::JsonBody,
    response::Success,
    services,
    state::AppState,
    types::{LoginPayload, RefreshTokenPayload},
};

/// POST /authentications - Log in
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginPayload>,
) -> ApiResult<impl IntoResponse> {
    let (username, password) = payload.into_credentials()?;
    let tokens = services::login(state.store.as_ref(), &state.auth, &username, &password).await?;
    Ok(Success::created(tokens).with_message("Authentication added"))
}

/// PUT /authentications - Refresh the access token
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshTokenPayload>,
) -> ApiResult<impl IntoResponse> {
    let refresh_token = payload.into_token()?;
    let access_token =
        services::refresh_access_token(state.store.as_ref(), &state.auth, &refresh_token).await?;
    Ok(Success::ok(json!({ "accessToken": access_token })).with_message("Access token refreshed"))
}

/// DELETE /authentications - Log out
pub async fn logout(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshTokenPayload>,
) -> ApiResult<impl IntoResponse> {
    let refresh_token = payload.into_token()?;
    services::logout(state.store.as_ref(), &refresh_token).await?;
    Ok(Success::message("Refresh token deleted"))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route(
        "/",
        axum::routing::post(login).put(refresh).delete(logout),
    )
}

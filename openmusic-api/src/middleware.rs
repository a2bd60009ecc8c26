//! Authentication Extractor
//!
//! Protected handlers take an [`AuthUser`] argument. Extraction reads the
//! `Authorization: Bearer <token>` header and validates the access token, so
//! a handler cannot run without an authenticated principal.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use openmusic_core::UserId;

use crate::auth::{validate_access_token, AuthConfig};
use crate::error::ApiError;

/// The authenticated principal of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
}

/// Pull the bearer token out of an `Authorization` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AuthConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<AuthConfig>::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthorized("Missing authentication"))?;
        let value = header
            .to_str()
            .map_err(|_| ApiError::invalid_token("Authorization header is not valid ASCII"))?;
        let token = bearer_token(value)
            .ok_or_else(|| ApiError::invalid_token("Expected a Bearer token"))?;

        let claims = validate_access_token(&config, token)?;
        Ok(AuthUser {
            user_id: claims.user_id(),
        })
    }
}

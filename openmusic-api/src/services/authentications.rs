//! Login, token refresh and logout.
//!
//! Refresh tokens are persisted by digest only. Logout deletes the digest,
//! after which the token can no longer be exchanged.

use openmusic_core::{OpenMusicError, UserId};
use openmusic_storage::CatalogStore;
use tracing::{debug, info};

use crate::auth::{
    generate_access_token, generate_refresh_token, token_digest, validate_refresh_token,
    verify_password, AuthConfig,
};
use crate::error::{ApiError, ApiResult};
use crate::types::TokenPair;

const BAD_CREDENTIALS: &str = "The credentials you provided are wrong";

/// Check credentials and issue a token pair.
pub async fn login(
    store: &dyn CatalogStore,
    auth: &AuthConfig,
    username: &str,
    password: &str,
) -> ApiResult<TokenPair> {
    let user = store
        .user_get_by_username(username)
        .await?
        .ok_or_else(|| OpenMusicError::authentication(BAD_CREDENTIALS))?;

    if !verify_password(password, &user.password_hash)? {
        debug!(username = %username, "password mismatch");
        return Err(OpenMusicError::authentication(BAD_CREDENTIALS).into());
    }

    let access_token = generate_access_token(auth, &user.id)?;
    let refresh_token = generate_refresh_token(auth, &user.id)?;
    store.refresh_token_insert(&token_digest(&refresh_token)).await?;

    info!(user_id = %user.id, "user logged in");
    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Exchange an active refresh token for a new access token.
pub async fn refresh_access_token(
    store: &dyn CatalogStore,
    auth: &AuthConfig,
    refresh_token: &str,
) -> ApiResult<String> {
    let claims = validate_refresh_token(auth, refresh_token)?;
    if !store.refresh_token_exists(&token_digest(refresh_token)).await? {
        return Err(ApiError::invalid_input("Invalid refresh token"));
    }
    generate_access_token(auth, &UserId::new(claims.id))
}

/// Revoke a refresh token.
pub async fn logout(store: &dyn CatalogStore, refresh_token: &str) -> ApiResult<()> {
    if !store.refresh_token_delete(&token_digest(refresh_token)).await? {
        return Err(ApiError::invalid_input("Invalid refresh token"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::validate_access_token;
    use crate::error::ErrorCode;
    use crate::services::register_user;
    use crate::types::Registration;
    use openmusic_storage::InMemoryCatalog;

    const NOW: i64 = 1704067200;

    async fn registered() -> (InMemoryCatalog, AuthConfig) {
        let store = InMemoryCatalog::new();
        register_user(
            &store,
            Registration {
                username: "dicoding".to_string(),
                password: "secret".to_string(),
                fullname: "Dicoding Indonesia".to_string(),
            },
        )
        .await
        .unwrap();
        (store, AuthConfig::for_tests(NOW))
    }

    #[tokio::test]
    async fn test_login_issues_valid_tokens() {
        let (store, auth) = registered().await;
        let pair = login(&store, &auth, "dicoding", "secret").await.unwrap();

        let claims = validate_access_token(&auth, &pair.access_token).unwrap();
        let user = store.user_get_by_username("dicoding").await.unwrap().unwrap();
        assert_eq!(claims.user_id(), user.id);
        assert_eq!(store.refresh_token_count().await, 1);
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let (store, auth) = registered().await;
        let err = login(&store, &auth, "dicoding", "wrong").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let err = login(&store, &auth, "nobody", "secret").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_refresh_after_logout_is_rejected() {
        let (store, auth) = registered().await;
        let pair = login(&store, &auth, "dicoding", "secret").await.unwrap();

        let access = refresh_access_token(&store, &auth, &pair.refresh_token)
            .await
            .unwrap();
        assert!(validate_access_token(&auth, &access).is_ok());

        logout(&store, &pair.refresh_token).await.unwrap();
        let err = refresh_access_token(&store, &auth, &pair.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let err = logout(&store, &pair.refresh_token).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let (store, auth) = registered().await;
        let pair = login(&store, &auth, "dicoding", "secret").await.unwrap();

        let err = refresh_access_token(&store, &auth, &pair.access_token)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }
}

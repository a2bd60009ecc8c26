//! User registration and lookup.

use openmusic_core::{EntityType, NewUser, OpenMusicError, UserId, UserProfile, ValidationError};
use openmusic_storage::CatalogStore;
use tracing::info;

use crate::auth::hash_password;
use crate::error::ApiResult;
use crate::types::Registration;

/// Register a user. A taken username is a validation failure, not a
/// conflict, to match what clients of this API expect.
pub async fn register_user(store: &dyn CatalogStore, registration: Registration) -> ApiResult<UserId> {
    let password_hash = hash_password(&registration.password)?;
    let user = NewUser {
        username: registration.username,
        password_hash,
        fullname: registration.fullname,
    };

    match store.user_insert(&user).await {
        Ok(id) => {
            info!(user_id = %id, username = %user.username, "user registered");
            Ok(id)
        }
        Err(e) if e.is_unique_violation() => Err(OpenMusicError::from(ValidationError::InvalidValue {
            field: "username".to_string(),
            reason: "username is already taken".to_string(),
        })
        .into()),
        Err(e) => Err(e.into()),
    }
}

pub async fn get_user(store: &dyn CatalogStore, id: &UserId) -> ApiResult<UserProfile> {
    let user = store
        .user_get(id)
        .await?
        .ok_or_else(|| OpenMusicError::not_found(EntityType::User, id))?;
    Ok(user.profile())
}

//! Authentication Module
//!
//! Access and refresh tokens are HS256 JWTs signed with separate keys.
//! Access tokens carry `{id, iat, exp}` and are checked on every protected
//! request. Refresh tokens carry no expiry; they stay valid exactly as long
//! as their digest is present in the durable store, so logout revokes them.
//!
//! Passwords are hashed with Argon2id and stored as PHC strings.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use openmusic_core::{ConfigError, OpenMusicError, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::{env_parse, env_var};
use crate::error::{ApiError, ApiResult};

const INSECURE_ACCESS_KEY: &str = "INSECURE_ACCESS_KEY_CHANGE_IN_PRODUCTION";
const INSECURE_REFRESH_KEY: &str = "INSECURE_REFRESH_KEY_CHANGE_IN_PRODUCTION";

// ============================================================================
// CLOCK ABSTRACTION
// ============================================================================

/// Clock abstraction for JWT time validation.
///
/// Token expiry is checked against this clock instead of inside
/// `jsonwebtoken`, so tests can pin time.
pub trait JwtClock: Send + Sync {
    /// Current time as Unix epoch seconds.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

// ============================================================================
// JWT SECRET
// ============================================================================

/// Signing key that never shows up in logs.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// # Errors
    /// Returns error if the secret is empty.
    pub fn new(secret: String) -> Result<Self, OpenMusicError> {
        if secret.trim().is_empty() {
            return Err(OpenMusicError::Config(ConfigError::MissingRequired {
                field: "jwt_secret".to_string(),
            }));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value (only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

fn secret_or_default(value: Option<String>, fallback: &'static str) -> JwtSecret {
    match value.map(JwtSecret::new) {
        Some(Ok(secret)) => secret,
        _ => {
            tracing::warn!("JWT key not configured, using insecure development key");
            JwtSecret(SecretString::new(fallback.to_string().into()))
        }
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Token signing configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Key for access tokens.
    pub access_secret: JwtSecret,

    /// Key for refresh tokens.
    pub refresh_secret: JwtSecret,

    /// Access token lifetime in seconds.
    pub access_token_age_secs: i64,

    /// Clock for expiry checks (injected for testing).
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &self.access_secret)
            .field("refresh_secret", &self.refresh_secret)
            .field("access_token_age_secs", &self.access_token_age_secs)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: secret_or_default(None, INSECURE_ACCESS_KEY),
            refresh_secret: secret_or_default(None, INSECURE_REFRESH_KEY),
            access_token_age_secs: 1800,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `OPENMUSIC_ACCESS_TOKEN_KEY` / `ACCESS_TOKEN_KEY`: access token key
    /// - `OPENMUSIC_REFRESH_TOKEN_KEY` / `REFRESH_TOKEN_KEY`: refresh token key
    /// - `OPENMUSIC_ACCESS_TOKEN_AGE` / `ACCESS_TOKEN_AGE`: lifetime in seconds (default: 1800)
    pub fn from_env() -> Self {
        Self {
            access_secret: secret_or_default(
                env_var("OPENMUSIC_ACCESS_TOKEN_KEY", "ACCESS_TOKEN_KEY"),
                INSECURE_ACCESS_KEY,
            ),
            refresh_secret: secret_or_default(
                env_var("OPENMUSIC_REFRESH_TOKEN_KEY", "REFRESH_TOKEN_KEY"),
                INSECURE_REFRESH_KEY,
            ),
            access_token_age_secs: env_parse("OPENMUSIC_ACCESS_TOKEN_AGE", "ACCESS_TOKEN_AGE")
                .unwrap_or(1800),
            clock: Arc::new(SystemClock),
        }
    }

    /// Deterministic configuration for tests.
    pub fn for_tests(now_epoch_secs: i64) -> Self {
        Self {
            access_secret: JwtSecret(SecretString::new("test-access-key".to_string().into())),
            refresh_secret: JwtSecret(SecretString::new("test-refresh-key".to_string().into())),
            access_token_age_secs: 1800,
            clock: Arc::new(FixedClock(now_epoch_secs)),
        }
    }
}

// ============================================================================
// CLAIMS
// ============================================================================

/// Access token claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id.
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.id.clone())
    }
}

/// Refresh token claims. No `exp`: revocation is by deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub id: String,
    pub iat: i64,
    /// Random nonce so two logins in the same second get distinct tokens.
    pub jti: String,
}

fn map_decode_error(e: jsonwebtoken::errors::Error) -> ApiError {
    match e.kind() {
        jsonwebtoken::errors::ErrorKind::InvalidSignature => {
            ApiError::invalid_token("Token signature is invalid")
        }
        _ => ApiError::invalid_token(format!("Token validation failed: {}", e)),
    }
}

fn current_time(config: &AuthConfig) -> ApiResult<i64> {
    let now = config.clock.now_epoch_secs();
    if now < 0 {
        tracing::error!(timestamp = now, "System clock returned pre-epoch time");
        return Err(ApiError::internal_error("Server time configuration error"));
    }
    Ok(now)
}

// ============================================================================
// TOKENS
// ============================================================================

/// Issue an access token for a user.
pub fn generate_access_token(config: &AuthConfig, user_id: &UserId) -> ApiResult<String> {
    let now = current_time(config)?;
    let claims = AccessClaims {
        id: user_id.as_str().to_string(),
        iat: now,
        exp: now + config.access_token_age_secs,
    };
    let key = EncodingKey::from_secret(config.access_secret.expose().as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

/// Verify an access token's signature and expiry.
pub fn validate_access_token(config: &AuthConfig, token: &str) -> ApiResult<AccessClaims> {
    let key = DecodingKey::from_secret(config.access_secret.expose().as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);

    let claims = decode::<AccessClaims>(token, &key, &validation)
        .map_err(map_decode_error)?
        .claims;

    let now = current_time(config)?;
    if claims.exp < now {
        return Err(ApiError::token_expired());
    }
    Ok(claims)
}

/// Issue a refresh token for a user.
pub fn generate_refresh_token(config: &AuthConfig, user_id: &UserId) -> ApiResult<String> {
    let claims = RefreshClaims {
        id: user_id.as_str().to_string(),
        iat: current_time(config)?,
        jti: SaltString::generate(&mut OsRng).as_str().to_string(),
    };
    let key = EncodingKey::from_secret(config.refresh_secret.expose().as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

/// Verify a refresh token's signature. Whether it is still active is a
/// store lookup.
pub fn validate_refresh_token(config: &AuthConfig, token: &str) -> ApiResult<RefreshClaims> {
    let key = DecodingKey::from_secret(config.refresh_secret.expose().as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.required_spec_claims = std::collections::HashSet::new();

    decode::<RefreshClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "refresh token rejected");
            ApiError::invalid_input("Invalid refresh token")
        })
}

/// SHA-256 hex digest under which a refresh token is stored.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

// ============================================================================
// PASSWORDS
// ============================================================================

/// Hash a password using Argon2id. Returns a PHC string.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal_error(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ApiError::internal_error(format!("Invalid password hash format: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

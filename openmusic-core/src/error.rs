//! Error types for OpenMusic operations

use crate::EntityType;
use thiserror::Error;

/// Durable store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Insert failed for {entity_type}: {reason}")]
    InsertFailed {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Unique constraint {constraint} violated for {entity_type}")]
    UniqueViolation {
        entity_type: EntityType,
        constraint: String,
    },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: String, reason: String },

    #[error("Storage backend error: {reason}")]
    Backend { reason: String },
}

/// Cache store errors. These never reach API callers: the read path treats
/// them as a miss and the invalidation path logs them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache {operation} failed for {key}: {reason}")]
    Command {
        operation: &'static str,
        key: String,
        reason: String,
    },

    #[error("Cached value for {key} could not be (de)serialized: {reason}")]
    Serialization { key: String, reason: String },
}

/// Payload validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all OpenMusic errors.
///
/// The first six variants are the outcomes callers are expected to act on;
/// the wrapped sub-errors are internal failures.
#[derive(Debug, Clone, Error)]
pub enum OpenMusicError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: EntityType, id: String },

    /// A write that should have touched exactly one row touched none.
    #[error("{0}")]
    Invariant(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{service} unavailable: {reason}")]
    Unavailable { service: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl OpenMusicError {
    pub fn not_found(entity_type: EntityType, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    pub fn unavailable(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            service: service.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether a unique index rejected the write.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Storage(StorageError::UniqueViolation { .. }))
    }
}

/// Result type alias for OpenMusic operations.
pub type OpenMusicResult<T> = Result<T, OpenMusicError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = OpenMusicError::not_found(EntityType::Playlist, "playlist-123");
        let msg = err.to_string();
        assert!(msg.contains("playlist not found"));
        assert!(msg.contains("playlist-123"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unique_violation_detected() {
        let err: OpenMusicError = StorageError::UniqueViolation {
            entity_type: EntityType::Like,
            constraint: "user_album_likes_user_album_key".to_string(),
        }
        .into();
        assert!(err.is_unique_violation());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("user_album_likes_user_album_key"));
    }

    #[test]
    fn test_cache_error_display() {
        let err = CacheError::Command {
            operation: "GET",
            key: "album:album-1".to_string(),
            reason: "connection reset".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("GET"));
        assert!(msg.contains("album:album-1"));
    }

    #[test]
    fn test_unavailable_display() {
        let err = OpenMusicError::unavailable("export queue", "connection refused");
        assert_eq!(err.to_string(), "export queue unavailable: connection refused");
    }

    #[test]
    fn test_validation_error_from() {
        let err: OpenMusicError = ValidationError::RequiredFieldMissing {
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(err, OpenMusicError::Validation(_)));
        assert!(err.to_string().contains("name"));
    }
}

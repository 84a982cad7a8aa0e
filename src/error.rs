//! Error types for vibes_collection

use thiserror::Error;

/// Unified error type for collection operations
#[derive(Debug, Error)]
pub enum CollectionError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Failed to parse or serialize JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid card, variant, color or rarity value
    #[error(transparent)]
    Value(#[from] vibes_common::CommonError),
    /// No profile holds this username
    #[error("User not found: {0}")]
    UserNotFound(String),
    /// Card id is not part of the catalog
    #[error("Card not found in catalog: {0}")]
    CardNotFound(String),
    /// Username too short after cleaning
    #[error("Invalid username: {0} (must be at least 3 characters of a-z, 0-9)")]
    InvalidUsername(String),
    /// Username belongs to another user
    #[error("Username already taken: {0}")]
    UsernameTaken(String),
    /// Operation requires a signed-in user
    #[error("Not signed in")]
    NotSignedIn,
    /// A thread panicked while holding the storage lock
    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Legacy alias matching the other crates
pub type Error = CollectionError;

/// Result alias for collection operations
pub type Result<T> = std::result::Result<T, CollectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinct_from_storage_errors() {
        let err = CollectionError::UserNotFound("ghost".to_string());
        assert_eq!(err.to_string(), "User not found: ghost");
        assert!(matches!(err, CollectionError::UserNotFound(_)));
    }

    #[test]
    fn common_errors_convert() {
        let err: CollectionError = vibes_common::CommonError::UnknownVariant("holo".into()).into();
        assert_eq!(err.to_string(), "Unknown variant: holo");
    }
}

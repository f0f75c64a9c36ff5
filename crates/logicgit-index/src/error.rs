use thiserror::Error;

/// Errors from index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A persisted JSON column could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A row holds data that does not parse back into its type.
    #[error("invalid data in {column}: {reason}")]
    InvalidData { column: &'static str, reason: String },

    /// A hash prefix was empty or not hexadecimal.
    #[error("invalid hash prefix: {0:?}")]
    InvalidPrefix(String),

    /// Schema migration failure.
    #[error("migration error: {0}")]
    Migration(String),

    /// The in-memory backend's lock was poisoned.
    #[error("index lock poisoned: {0}")]
    Poisoned(String),
}

impl From<IndexError> for logicgit_store::StoreError {
    fn from(err: IndexError) -> Self {
        logicgit_store::StoreError::Backend {
            target: "index",
            reason: err.to_string(),
        }
    }
}

/// Result alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

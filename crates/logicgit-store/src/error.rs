use logicgit_types::ContentHash;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ContentHash),

    /// The content does not hash to the claimed hash.
    #[error("hash mismatch for {hash}: content hashes to {computed}")]
    HashMismatch {
        hash: ContentHash,
        computed: ContentHash,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the filesystem blob area.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted object data is malformed or cannot be decoded.
    #[error("corrupt object {hash}: {reason}")]
    CorruptObject { hash: ContentHash, reason: String },

    /// A write target's backend failed.
    #[error("{target} backend error: {reason}")]
    Backend { target: &'static str, reason: String },

    /// One target failed after the other succeeded; the successful write was
    /// undone, so neither target holds the object.
    #[error("write of {hash} to {target} failed and was rolled back: {reason}")]
    RolledBack {
        hash: ContentHash,
        target: &'static str,
        reason: String,
    },

    /// A partial write could not be rolled back. The targets disagree about
    /// `hash` and the repository needs manual inspection.
    #[error("object {hash} is in an inconsistent state: {reason}")]
    Inconsistent { hash: ContentHash, reason: String },
}

impl StoreError {
    /// Returns `true` for the dual-write failures (rolled back or not).
    pub fn is_partial_write(&self) -> bool {
        matches!(self, Self::RolledBack { .. } | Self::Inconsistent { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

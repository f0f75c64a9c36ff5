use logicgit_crypto::HasherError;
use thiserror::Error;

/// Errors that abort an execution or reject a rule set.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("hashing failed: {0}")]
    Hash(#[from] HasherError),

    /// Two rules in one set share a name.
    #[error("duplicate rule name: {0}")]
    DuplicateRule(String),

    #[error("invalid rule {name:?}: {reason}")]
    InvalidRule { name: String, reason: String },
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Why a single condition could not be evaluated.
///
/// These never escape an execution as errors; the engine turns them into
/// diagnostics and treats the rule as not fired.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("parse error at offset {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("path not found: {0}")]
    MissingPath(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("condition must evaluate to a boolean, got {0}")]
    NotBoolean(String),
}

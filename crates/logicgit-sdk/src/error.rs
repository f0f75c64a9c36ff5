use std::fmt;

use logicgit_engine::EngineError;
use logicgit_index::IndexError;
use logicgit_refs::RefError;
use logicgit_store::StoreError;
use logicgit_types::ContentHash;
use thiserror::Error;

/// The persistence step a commit failed at. Each stage leaves a known set
/// of artifacts behind:
///
/// | stage | persisted | branch moved |
/// |---|---|---|
/// | `CommitObject` | nothing | no |
/// | `StateObject` | commit object | no |
/// | `Index` | commit + final-state objects | no |
/// | `Ref` | objects + index rows | no |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitStage {
    CommitObject,
    StateObject,
    Index,
    Ref,
}

impl fmt::Display for CommitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommitStage::CommitObject => "commit object",
            CommitStage::StateObject => "final-state object",
            CommitStage::Index => "index",
            CommitStage::Ref => "ref update",
        })
    }
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: &'static str, name: String },

    /// An object write landed in one persistence target but not the other.
    #[error("persistence inconsistency: {0}")]
    PersistenceInconsistency(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("not a logicgit repository: {0}")]
    NotARepository(String),

    /// A rules or data file could not be parsed.
    #[error("invalid {kind} {path}: {reason}")]
    InvalidInput {
        kind: &'static str,
        path: String,
        reason: String,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// A commit failed partway; see [`CommitStage`] for what exists.
    #[error("commit failed at {stage}{}: {source}", .commit.map(|h| format!(" ({})", h.short_hex())).unwrap_or_default())]
    CommitIncomplete {
        stage: CommitStage,
        commit: Option<ContentHash>,
        #[source]
        source: Box<RepoError>,
    },

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("ref error: {0}")]
    Ref(RefError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepoError {
    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        RepoError::NotFound {
            kind,
            name: name.into(),
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(err: StoreError) -> Self {
        match err {
            e if e.is_partial_write() => RepoError::PersistenceInconsistency(e.to_string()),
            StoreError::NotFound(hash) => RepoError::not_found("object", hash.to_hex()),
            e => RepoError::Store(e),
        }
    }
}

impl From<RefError> for RepoError {
    fn from(err: RefError) -> Self {
        match err {
            RefError::NotFound { name } => RepoError::not_found("branch", name),
            RefError::AlreadyExists { name } => RepoError::AlreadyExists {
                kind: "branch",
                name,
            },
            e => RepoError::Ref(e),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

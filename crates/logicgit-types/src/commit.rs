use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;

/// Author recorded on commits when the repository config names none.
pub const DEFAULT_AUTHOR: &str = "logic-git";

/// An immutable, parent-linked wrapper around one execution.
///
/// The commit's identity is the content hash of this structure (kind
/// `commit`). Commits on a branch form a singly-linked list through
/// `parent`; there are no merge commits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Hash of the execution this commit records.
    pub execution: ContentHash,
    /// The previous commit on the branch, `None` for a root commit.
    pub parent: Option<ContentHash>,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl Commit {
    /// Build a commit stamped with the current time.
    pub fn new(
        execution: ContentHash,
        parent: Option<ContentHash>,
        author: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            execution,
            parent,
            author: author.into(),
            timestamp: Utc::now(),
            message: message.into(),
        }
    }

    /// Returns `true` if this commit has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_commit_has_no_parent() {
        let commit = Commit::new(ContentHash::from_digest([1; 32]), None, DEFAULT_AUTHOR, "first");
        assert!(commit.is_root());
        assert_eq!(commit.author, "logic-git");
    }

    #[test]
    fn serde_roundtrip_keeps_parent() {
        let commit = Commit::new(
            ContentHash::from_digest([1; 32]),
            Some(ContentHash::from_digest([2; 32])),
            "alice",
            "second",
        );
        let json = serde_json::to_string(&commit).unwrap();
        let back: Commit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, commit);
    }
}

use logicgit_types::{ContentHash, ObjectKind};
use serde::Serialize;

use crate::canonical::canonicalize;

/// Kind-tagged BLAKE3 content hasher.
///
/// Every digest covers a `"<kind> <len>\0"` header followed by the payload,
/// so a rule set and a record with identical bytes still hash differently.
pub struct ContentHasher;

impl ContentHasher {
    /// Hash raw canonical bytes under the given kind.
    pub fn hash_bytes(kind: ObjectKind, data: &[u8]) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(Self::header(kind, data.len()).as_bytes());
        hasher.update(data);
        ContentHash::from_digest(*hasher.finalize().as_bytes())
    }

    /// Canonicalize a serializable value and hash it under the given kind.
    pub fn hash<T: Serialize + ?Sized>(kind: ObjectKind, value: &T) -> Result<ContentHash, HasherError> {
        let bytes = canonicalize(value)?;
        Ok(Self::hash_bytes(kind, &bytes))
    }

    /// Verify that bytes produce the expected hash under `kind`.
    pub fn verify(kind: ObjectKind, data: &[u8], expected: &ContentHash) -> bool {
        Self::hash_bytes(kind, data) == *expected
    }

    /// The object header: kind, payload length, and a NUL separator.
    pub fn header(kind: ObjectKind, len: usize) -> String {
        format!("{kind} {len}\0")
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

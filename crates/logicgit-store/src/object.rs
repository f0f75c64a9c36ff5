use logicgit_crypto::{canonical_bytes, ContentHasher};
use logicgit_types::{ContentHash, ObjectKind};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};

/// The physical persisted form of any hashed payload.
///
/// `content` holds the canonical encoding; `hash` is always the
/// kind-tagged digest of it, so the same kind and content can never be
/// stored under two different hashes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub hash: ContentHash,
    pub kind: ObjectKind,
    pub content: String,
    /// Size of `content` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create an object from already-canonical content.
    pub fn new(kind: ObjectKind, content: impl Into<String>) -> Self {
        let content = content.into();
        let hash = ContentHasher::hash_bytes(kind, content.as_bytes());
        let size = content.len() as u64;
        Self {
            hash,
            kind,
            content,
            size,
        }
    }

    /// Canonicalize a serializable value into an object.
    pub fn from_value<T: Serialize + ?Sized>(kind: ObjectKind, value: &T) -> StoreResult<Self> {
        let content = canonical_bytes(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self::new(kind, content))
    }

    /// Decode the content back into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_str(&self.content).map_err(|e| StoreError::CorruptObject {
            hash: self.hash,
            reason: e.to_string(),
        })
    }

    /// Recompute the hash from kind and content.
    pub fn compute_hash(&self) -> ContentHash {
        ContentHasher::hash_bytes(self.kind, self.content.as_bytes())
    }

    /// Fail with [`StoreError::HashMismatch`] unless `hash` matches the content.
    pub fn verify(&self) -> StoreResult<()> {
        let computed = self.compute_hash();
        if computed != self.hash {
            return Err(StoreError::HashMismatch {
                hash: self.hash,
                computed,
            });
        }
        Ok(())
    }
}

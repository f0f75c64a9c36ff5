use logicgit_types::{ContentHash, ObjectKind};
use serde::Serialize;

use crate::error::StoreResult;
use crate::object::StoredObject;

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - `put` is idempotent: re-putting an existing hash is a no-op, never an error.
///   Callers never need to check existence first.
/// - `get` returns [`StoreError::NotFound`](crate::StoreError::NotFound) for
///   unknown hashes.
/// - Objects are immutable once written.
pub trait ObjectStore: Send + Sync {
    /// Persist an object under its hash.
    fn put(&self, object: &StoredObject) -> StoreResult<()>;

    /// Read an object by hash.
    fn get(&self, hash: &ContentHash) -> StoreResult<StoredObject>;

    /// Check whether an object exists.
    fn exists(&self, hash: &ContentHash) -> StoreResult<bool>;

    /// Canonicalize, hash, and persist a value; returns its hash.
    fn put_value<T: Serialize + ?Sized>(&self, kind: ObjectKind, value: &T) -> StoreResult<ContentHash>
    where
        Self: Sized,
    {
        let object = StoredObject::from_value(kind, value)?;
        self.put(&object)?;
        Ok(object.hash)
    }
}

/// One physical write target of an object store.
///
/// A target is a plain keyed container. Idempotency and cross-target
/// consistency are the job of the store that drives it.
pub trait ObjectTarget: Send + Sync {
    /// Short name for diagnostics ("index", "blobs", ...).
    fn target_name(&self) -> &'static str;

    fn contains(&self, hash: &ContentHash) -> StoreResult<bool>;

    fn write(&self, object: &StoredObject) -> StoreResult<()>;

    fn read(&self, hash: &ContentHash) -> StoreResult<Option<StoredObject>>;

    /// Remove an object. Only used to undo a half-finished dual write.
    fn remove(&self, hash: &ContentHash) -> StoreResult<bool>;
}

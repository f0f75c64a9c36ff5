use logicgit_types::ContentHash;
use tracing::{debug, error, warn};

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::{ObjectStore, ObjectTarget};

/// An object store with two write targets behind a single `put`.
///
/// The `index` target is written first, then `blobs`. If the second write
/// fails, the first is undone so both targets agree again. A target that
/// already holds the object is left untouched, which also repairs an object
/// that an earlier crash left in only one target.
pub struct DualObjectStore<I, B> {
    index: I,
    blobs: B,
}

impl<I: ObjectTarget, B: ObjectTarget> DualObjectStore<I, B> {
    pub fn new(index: I, blobs: B) -> Self {
        Self { index, blobs }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// Write to `second` after `first` was freshly written; undo `first` on failure.
    fn write_second(
        object: &StoredObject,
        first: &dyn ObjectTarget,
        first_written: bool,
        second: &dyn ObjectTarget,
    ) -> StoreResult<()> {
        let Err(err) = second.write(object) else {
            return Ok(());
        };
        if !first_written {
            return Err(err);
        }
        warn!(
            hash = %object.hash.short_hex(),
            failed = second.target_name(),
            error = %err,
            "partial object write; rolling back"
        );
        match first.remove(&object.hash) {
            Ok(_) => Err(StoreError::RolledBack {
                hash: object.hash,
                target: second.target_name(),
                reason: err.to_string(),
            }),
            Err(rollback_err) => {
                error!(
                    hash = %object.hash.short_hex(),
                    error = %rollback_err,
                    "rollback of partial object write failed"
                );
                Err(StoreError::Inconsistent {
                    hash: object.hash,
                    reason: format!(
                        "{} write failed ({err}); removing from {} failed ({rollback_err})",
                        second.target_name(),
                        first.target_name()
                    ),
                })
            }
        }
    }
}

impl<I: ObjectTarget, B: ObjectTarget> ObjectStore for DualObjectStore<I, B> {
    fn put(&self, object: &StoredObject) -> StoreResult<()> {
        object.verify()?;
        let in_index = self.index.contains(&object.hash)?;
        let in_blobs = self.blobs.contains(&object.hash)?;
        if in_index && in_blobs {
            debug!(hash = %object.hash.short_hex(), "object already stored");
            return Ok(());
        }

        let index_written = if in_index {
            false
        } else {
            self.index.write(object)?;
            true
        };
        if !in_blobs {
            Self::write_second(object, &self.index, index_written, &self.blobs)?;
        }
        debug!(hash = %object.hash.short_hex(), kind = %object.kind, size = object.size, "object stored");
        Ok(())
    }

    fn get(&self, hash: &ContentHash) -> StoreResult<StoredObject> {
        let found = match self.index.read(hash)? {
            Some(obj) => obj,
            None => self.blobs.read(hash)?.ok_or(StoreError::NotFound(*hash))?,
        };
        found.verify()?;
        Ok(found)
    }

    fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(self.index.contains(hash)? || self.blobs.contains(hash)?)
    }
}

impl<I, B> std::fmt::Debug for DualObjectStore<I, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualObjectStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryObjectStore;
    use logicgit_types::ObjectKind;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Target that can be told to fail writes and/or removals.
    struct Flaky {
        inner: InMemoryObjectStore,
        fail_write: AtomicBool,
        fail_remove: AtomicBool,
    }

    impl Flaky {
        fn new() -> Self {
            Self {
                inner: InMemoryObjectStore::new(),
                fail_write: AtomicBool::new(false),
                fail_remove: AtomicBool::new(false),
            }
        }
    }

    impl ObjectTarget for Flaky {
        fn target_name(&self) -> &'static str {
            "flaky"
        }
        fn contains(&self, hash: &ContentHash) -> StoreResult<bool> {
            self.inner.contains(hash)
        }
        fn write(&self, object: &StoredObject) -> StoreResult<()> {
            if self.fail_write.load(Ordering::SeqCst) {
                return Err(StoreError::Backend {
                    target: "flaky",
                    reason: "injected write failure".into(),
                });
            }
            ObjectTarget::write(&self.inner, object)
        }
        fn read(&self, hash: &ContentHash) -> StoreResult<Option<StoredObject>> {
            ObjectTarget::read(&self.inner, hash)
        }
        fn remove(&self, hash: &ContentHash) -> StoreResult<bool> {
            if self.fail_remove.load(Ordering::SeqCst) {
                return Err(StoreError::Backend {
                    target: "flaky",
                    reason: "injected remove failure".into(),
                });
            }
            self.inner.remove(hash)
        }
    }

    fn obj(content: &str) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, content)
    }

    #[test]
    fn put_lands_in_both_targets() {
        let store = DualObjectStore::new(InMemoryObjectStore::new(), InMemoryObjectStore::new());
        let o = obj("both");
        store.put(&o).unwrap();
        assert!(store.index().contains(&o.hash).unwrap());
        assert!(store.blobs().contains(&o.hash).unwrap());
        assert_eq!(store.get(&o.hash).unwrap(), o);
    }

    #[test]
    fn second_put_is_a_noop() {
        let store = DualObjectStore::new(InMemoryObjectStore::new(), InMemoryObjectStore::new());
        let o = obj("twice");
        store.put(&o).unwrap();
        store.put(&o).unwrap();
        assert_eq!(store.index().len(), 1);
        assert_eq!(store.blobs().len(), 1);
        assert_eq!(store.get(&o.hash).unwrap(), o);
    }

    #[test]
    fn blob_failure_rolls_back_index() {
        let blobs = Flaky::new();
        blobs.fail_write.store(true, Ordering::SeqCst);
        let store = DualObjectStore::new(InMemoryObjectStore::new(), blobs);
        let o = obj("rollback");

        let err = store.put(&o).unwrap_err();
        assert!(matches!(err, StoreError::RolledBack { target: "flaky", .. }));
        assert!(err.is_partial_write());
        assert!(!store.index().contains(&o.hash).unwrap());
        assert!(!store.exists(&o.hash).unwrap());
    }

    #[test]
    fn failed_rollback_is_inconsistent() {
        let index = Flaky::new();
        index.fail_remove.store(true, Ordering::SeqCst);
        let blobs = Flaky::new();
        blobs.fail_write.store(true, Ordering::SeqCst);
        let store = DualObjectStore::new(index, blobs);
        let o = obj("stuck");

        let err = store.put(&o).unwrap_err();
        assert!(matches!(err, StoreError::Inconsistent { .. }));
        // The index still holds the orphan; that is exactly what the error reports.
        assert!(store.index().contains(&o.hash).unwrap());
    }

    #[test]
    fn index_failure_writes_nothing() {
        let index = Flaky::new();
        index.fail_write.store(true, Ordering::SeqCst);
        let store = DualObjectStore::new(index, InMemoryObjectStore::new());
        let o = obj("never");

        assert!(matches!(store.put(&o), Err(StoreError::Backend { .. })));
        assert!(!store.blobs().contains(&o.hash).unwrap());
    }

    #[test]
    fn put_repairs_object_present_in_one_target() {
        let store = DualObjectStore::new(InMemoryObjectStore::new(), InMemoryObjectStore::new());
        let o = obj("half");
        ObjectTarget::write(store.blobs(), &o).unwrap();

        store.put(&o).unwrap();
        assert!(store.index().contains(&o.hash).unwrap());
    }

    #[test]
    fn repair_failure_does_not_remove_existing_copy() {
        let blobs = Flaky::new();
        let store = DualObjectStore::new(InMemoryObjectStore::new(), blobs);
        let o = obj("existing");
        ObjectTarget::write(store.index(), &o).unwrap();
        store.blobs().fail_write.store(true, Ordering::SeqCst);

        assert!(matches!(store.put(&o), Err(StoreError::Backend { .. })));
        assert!(store.index().contains(&o.hash).unwrap());
    }

    #[test]
    fn get_falls_back_to_blobs() {
        let store = DualObjectStore::new(InMemoryObjectStore::new(), InMemoryObjectStore::new());
        let o = obj("blob only");
        ObjectTarget::write(store.blobs(), &o).unwrap();
        assert_eq!(store.get(&o.hash).unwrap(), o);
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = DualObjectStore::new(InMemoryObjectStore::new(), InMemoryObjectStore::new());
        let hash = obj("nothing").hash;
        assert!(matches!(store.get(&hash), Err(StoreError::NotFound(_))));
    }
}

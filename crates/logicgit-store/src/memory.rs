use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use logicgit_types::ContentHash;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::{ObjectStore, ObjectTarget};

/// In-memory, HashMap-based object store.
///
/// Usable directly as an [`ObjectStore`] in tests and embeddings, or as one
/// [`ObjectTarget`] of a [`DualObjectStore`](crate::DualObjectStore).
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ContentHash, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.read_map().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.read_map()
            .map(|m| m.values().map(|obj| obj.size).sum())
            .unwrap_or(0)
    }

    /// Sorted list of all hashes in the store.
    pub fn all_hashes(&self) -> Vec<ContentHash> {
        let mut hashes: Vec<ContentHash> = self
            .read_map()
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default();
        hashes.sort();
        hashes
    }

    fn read_map(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<ContentHash, StoredObject>>> {
        self.objects.read().map_err(|e| StoreError::Backend {
            target: "memory",
            reason: format!("lock poisoned: {e}"),
        })
    }

    fn write_map(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<ContentHash, StoredObject>>> {
        self.objects.write().map_err(|e| StoreError::Backend {
            target: "memory",
            reason: format!("lock poisoned: {e}"),
        })
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, object: &StoredObject) -> StoreResult<()> {
        object.verify()?;
        let mut map = self.write_map()?;
        // Same hash always maps to the same content.
        map.entry(object.hash).or_insert_with(|| object.clone());
        Ok(())
    }

    fn get(&self, hash: &ContentHash) -> StoreResult<StoredObject> {
        self.read_map()?
            .get(hash)
            .cloned()
            .ok_or(StoreError::NotFound(*hash))
    }

    fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(self.read_map()?.contains_key(hash))
    }
}

impl ObjectTarget for InMemoryObjectStore {
    fn target_name(&self) -> &'static str {
        "memory"
    }

    fn contains(&self, hash: &ContentHash) -> StoreResult<bool> {
        self.exists(hash)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<()> {
        self.put(object)
    }

    fn read(&self, hash: &ContentHash) -> StoreResult<Option<StoredObject>> {
        Ok(self.read_map()?.get(hash).cloned())
    }

    fn remove(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(self.write_map()?.remove(hash).is_some())
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

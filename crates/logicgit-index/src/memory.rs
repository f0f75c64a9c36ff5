use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use logicgit_store::{InMemoryObjectStore, ObjectTarget, StoreResult, StoredObject};
use logicgit_types::ContentHash;

use crate::error::{IndexError, IndexResult};
use crate::record::{AuditRecord, ExecutionBundle, ExecutionRecord, SnapshotKind, SnapshotRecord};
use crate::traits::{validate_prefix, ExecutionIndex};

#[derive(Default)]
struct MemoryState {
    executions: Vec<ExecutionRecord>,
    audit: HashMap<ContentHash, Vec<AuditRecord>>,
    snapshots: HashMap<(ContentHash, SnapshotKind), SnapshotRecord>,
    next_seq: u64,
}

/// In-memory index with the same semantics as [`SqliteIndex`](crate::SqliteIndex).
///
/// Cloning shares state, so one instance can back both the object store
/// and the execution index of a repository.
#[derive(Clone, Default)]
pub struct InMemoryIndex {
    state: Arc<RwLock<MemoryState>>,
    objects: Arc<InMemoryObjectStore>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects held in the objects table.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn read_state(&self) -> IndexResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|e| IndexError::Poisoned(e.to_string()))
    }

    fn write_state(&self) -> IndexResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|e| IndexError::Poisoned(e.to_string()))
    }
}

impl std::fmt::Debug for InMemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndex")
            .field("objects", &self.objects.len())
            .finish_non_exhaustive()
    }
}

impl ExecutionIndex for InMemoryIndex {
    fn record(&self, bundle: &ExecutionBundle) -> IndexResult<()> {
        let mut state = self.write_state()?;
        let commit = bundle.execution.commit_hash;
        if state.executions.iter().any(|e| e.commit_hash == commit) {
            return Ok(());
        }

        state.next_seq += 1;
        let mut execution = bundle.execution.clone();
        execution.seq = state.next_seq;
        state.executions.push(execution);

        state
            .audit
            .entry(bundle.execution.execution_hash)
            .or_insert_with(|| bundle.audit.clone());
        let snapshot = &bundle.snapshot;
        state
            .snapshots
            .entry((snapshot.execution_hash, snapshot.kind))
            .or_insert_with(|| snapshot.clone());
        Ok(())
    }

    fn execution_for_commit(&self, commit: &ContentHash) -> IndexResult<Option<ExecutionRecord>> {
        Ok(self
            .read_state()?
            .executions
            .iter()
            .find(|e| &e.commit_hash == commit)
            .cloned())
    }

    fn find_by_prefix(&self, prefix: &str) -> IndexResult<Vec<ExecutionRecord>> {
        let prefix = validate_prefix(prefix)?;
        Ok(self
            .read_state()?
            .executions
            .iter()
            .rev()
            .filter(|e| e.execution_hash.matches_prefix(&prefix) || e.commit_hash.matches_prefix(&prefix))
            .cloned()
            .collect())
    }

    fn audit_trail(&self, execution: &ContentHash) -> IndexResult<Vec<AuditRecord>> {
        Ok(self
            .read_state()?
            .audit
            .get(execution)
            .cloned()
            .unwrap_or_default())
    }

    fn snapshot(&self, execution: &ContentHash, kind: SnapshotKind) -> IndexResult<Option<SnapshotRecord>> {
        Ok(self.read_state()?.snapshots.get(&(*execution, kind)).cloned())
    }

    fn execution_count(&self) -> IndexResult<u64> {
        Ok(self.read_state()?.executions.len() as u64)
    }
}

impl ObjectTarget for InMemoryIndex {
    fn target_name(&self) -> &'static str {
        "index"
    }

    fn contains(&self, hash: &ContentHash) -> StoreResult<bool> {
        self.objects.contains(hash)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<()> {
        self.objects.write(object)
    }

    fn read(&self, hash: &ContentHash) -> StoreResult<Option<StoredObject>> {
        self.objects.read(hash)
    }

    fn remove(&self, hash: &ContentHash) -> StoreResult<bool> {
        self.objects.remove(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{bundle, hash};
    use logicgit_types::ObjectKind;

    #[test]
    fn duplicate_commit_is_ignored() {
        let index = InMemoryIndex::new();
        index.record(&bundle(0x22, 0x11)).unwrap();
        index.record(&bundle(0x22, 0x11)).unwrap();
        assert_eq!(index.execution_count().unwrap(), 1);
    }

    #[test]
    fn prefix_matches_newest_first() {
        let index = InMemoryIndex::new();
        index.record(&bundle(0x22, 0x11)).unwrap();
        index.record(&bundle(0x33, 0x11)).unwrap();

        let matches = index.find_by_prefix("11").unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].commit_hash, hash(0x33));
        assert_eq!(matches[0].seq, 2);
    }

    #[test]
    fn audit_kept_once_per_execution() {
        let index = InMemoryIndex::new();
        index.record(&bundle(0x22, 0x11)).unwrap();
        index.record(&bundle(0x33, 0x11)).unwrap();
        assert_eq!(index.audit_trail(&hash(0x11)).unwrap().len(), 2);
        assert!(index.audit_trail(&hash(0x99)).unwrap().is_empty());
    }

    #[test]
    fn clones_share_objects() {
        let index = InMemoryIndex::new();
        let other = index.clone();
        let obj = StoredObject::new(ObjectKind::Blob, "x");
        index.write(&obj).unwrap();
        assert!(other.contains(&obj.hash).unwrap());
        assert_eq!(other.object_count(), 1);
    }
}

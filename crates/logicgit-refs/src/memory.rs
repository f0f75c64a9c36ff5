//! In-memory reference store for testing and ephemeral use.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use logicgit_types::ContentHash;

use crate::error::{RefError, Result};
use crate::names::validate_branch_name;
use crate::traits::RefStore;
use crate::types::Head;

/// An in-memory implementation of [`RefStore`].
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    branches: RwLock<BTreeMap<String, Option<ContentHash>>>,
    head: RwLock<Option<Head>>,
}

impl InMemoryRefStore {
    /// Create a store with no branches and no HEAD.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one empty branch that HEAD points at, the
    /// same state `init` leaves on disk.
    pub fn with_default_branch(name: &str) -> Result<Self> {
        let store = Self::new();
        store.write_branch(name, None)?;
        store.set_head(name)?;
        Ok(store)
    }

    fn read_branches(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Option<ContentHash>>>> {
        self.branches
            .read()
            .map_err(|e| RefError::Poisoned(e.to_string()))
    }

    fn write_branches(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Option<ContentHash>>>> {
        self.branches
            .write()
            .map_err(|e| RefError::Poisoned(e.to_string()))
    }

    fn write_head(&self, head: Head) -> Result<()> {
        let mut slot = self
            .head
            .write()
            .map_err(|e| RefError::Poisoned(e.to_string()))?;
        *slot = Some(head);
        Ok(())
    }
}

impl RefStore for InMemoryRefStore {
    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.read_branches()?.contains_key(name))
    }

    fn read_branch(&self, name: &str) -> Result<Option<ContentHash>> {
        self.read_branches()?
            .get(name)
            .copied()
            .ok_or_else(|| RefError::NotFound {
                name: name.to_string(),
            })
    }

    fn write_branch(&self, name: &str, tip: Option<ContentHash>) -> Result<()> {
        validate_branch_name(name)?;
        self.write_branches()?.insert(name.to_string(), tip);
        Ok(())
    }

    fn list_branches(&self) -> Result<Vec<(String, Option<ContentHash>)>> {
        Ok(self
            .read_branches()?
            .iter()
            .map(|(name, tip)| (name.clone(), *tip))
            .collect())
    }

    fn head(&self) -> Result<Head> {
        self.head
            .read()
            .map_err(|e| RefError::Poisoned(e.to_string()))?
            .clone()
            .ok_or_else(|| RefError::NotFound {
                name: "HEAD".into(),
            })
    }

    fn set_head(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        self.write_head(Head::Symbolic(branch.to_string()))
    }

    fn set_head_detached(&self, commit: ContentHash) -> Result<()> {
        self.write_head(Head::Detached(commit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(byte: u8) -> ContentHash {
        ContentHash::from([byte; 32])
    }

    #[test]
    fn fresh_store_has_empty_main() {
        let store = InMemoryRefStore::with_default_branch("main").unwrap();
        assert_eq!(store.head().unwrap(), Head::Symbolic("main".into()));
        assert_eq!(store.read_branch("main").unwrap(), None);
        assert_eq!(store.resolve_head().unwrap(), None);
    }

    #[test]
    fn head_unset_is_not_found() {
        let store = InMemoryRefStore::new();
        assert!(matches!(store.head(), Err(RefError::NotFound { .. })));
    }

    #[test]
    fn advance_moves_current_branch_only() {
        let store = InMemoryRefStore::with_default_branch("main").unwrap();
        store.write_branch("dev", None).unwrap();
        store.advance_head(hash(1)).unwrap();

        assert_eq!(store.read_branch("main").unwrap(), Some(hash(1)));
        assert_eq!(store.read_branch("dev").unwrap(), None);
    }

    #[test]
    fn advance_detached_moves_head() {
        let store = InMemoryRefStore::with_default_branch("main").unwrap();
        store.set_head_detached(hash(1)).unwrap();
        store.advance_head(hash(2)).unwrap();

        assert_eq!(store.head().unwrap(), Head::Detached(hash(2)));
        assert_eq!(store.read_branch("main").unwrap(), None);
    }

    #[test]
    fn create_branch_starts_at_head() {
        let store = InMemoryRefStore::with_default_branch("main").unwrap();
        assert_eq!(store.create_branch("empty").unwrap(), None);

        store.advance_head(hash(7)).unwrap();
        assert_eq!(store.create_branch("feature").unwrap(), Some(hash(7)));
        assert_eq!(store.read_branch("feature").unwrap(), Some(hash(7)));
    }

    #[test]
    fn create_existing_branch_fails() {
        let store = InMemoryRefStore::with_default_branch("main").unwrap();
        assert!(matches!(
            store.create_branch("main"),
            Err(RefError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn checkout_unknown_branch_fails() {
        let store = InMemoryRefStore::with_default_branch("main").unwrap();
        assert!(matches!(store.checkout("nope"), Err(RefError::NotFound { .. })));
        assert_eq!(store.current_branch().unwrap().as_deref(), Some("main"));
    }

    #[test]
    fn branches_mark_current() {
        let store = InMemoryRefStore::with_default_branch("main").unwrap();
        store.create_branch("dev").unwrap();
        store.checkout("dev").unwrap();

        let infos = store.branches().unwrap();
        let current: Vec<_> = infos.iter().filter(|b| b.is_current).map(|b| b.name.as_str()).collect();
        assert_eq!(current, vec!["dev"]);
        assert_eq!(infos.len(), 2);
    }
}

//! The [`RefStore`] trait defining the reference storage interface.

use logicgit_types::ContentHash;
use tracing::debug;

use crate::error::{RefError, Result};
use crate::names::validate_branch_name;
use crate::types::{BranchInfo, Head};

/// Storage backend for branches and HEAD.
///
/// Implementors provide the primitive reads and writes; branch creation,
/// checkout, and head advancement are derived from them.
pub trait RefStore: Send + Sync {
    fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Tip of a branch. `Ok(None)` for an empty branch,
    /// [`RefError::NotFound`] if the branch does not exist.
    fn read_branch(&self, name: &str) -> Result<Option<ContentHash>>;

    /// Create or overwrite a branch.
    fn write_branch(&self, name: &str, tip: Option<ContentHash>) -> Result<()>;

    /// All branches with their tips, sorted by name.
    fn list_branches(&self) -> Result<Vec<(String, Option<ContentHash>)>>;

    /// Current HEAD. [`RefError::NotFound`] if HEAD was never set.
    fn head(&self) -> Result<Head>;

    /// Point HEAD at a branch.
    fn set_head(&self, branch: &str) -> Result<()>;

    /// Detach HEAD at a commit.
    fn set_head_detached(&self, commit: ContentHash) -> Result<()>;

    /// The branch HEAD names, or `None` when detached.
    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.head()?.branch().map(str::to_string))
    }

    /// The commit HEAD resolves to, if any.
    fn resolve_head(&self) -> Result<Option<ContentHash>> {
        match self.head()? {
            Head::Symbolic(branch) => self.read_branch(&branch),
            Head::Detached(commit) => Ok(Some(commit)),
        }
    }

    /// Move whatever HEAD points at to `commit`.
    ///
    /// On a branch this advances the branch; when detached it moves HEAD
    /// itself.
    fn advance_head(&self, commit: ContentHash) -> Result<()> {
        match self.head()? {
            Head::Symbolic(branch) => {
                self.write_branch(&branch, Some(commit))?;
                debug!(branch = %branch, commit = %commit.short_hex(), "branch advanced");
            }
            Head::Detached(_) => {
                self.set_head_detached(commit)?;
                debug!(commit = %commit.short_hex(), "detached HEAD advanced");
            }
        }
        Ok(())
    }

    /// Create a branch at HEAD's commit (empty if HEAD has none).
    fn create_branch(&self, name: &str) -> Result<Option<ContentHash>> {
        validate_branch_name(name)?;
        if self.branch_exists(name)? {
            return Err(RefError::AlreadyExists {
                name: name.to_string(),
            });
        }
        let tip = self.resolve_head()?;
        self.write_branch(name, tip)?;
        debug!(branch = %name, tip = ?tip.map(|h| h.short_hex()), "branch created");
        Ok(tip)
    }

    /// Make `name` the active branch.
    fn checkout(&self, name: &str) -> Result<()> {
        if !self.branch_exists(name)? {
            return Err(RefError::NotFound {
                name: name.to_string(),
            });
        }
        self.set_head(name)
    }

    /// Branch summaries with the current branch marked.
    fn branches(&self) -> Result<Vec<BranchInfo>> {
        let current = self.current_branch()?;
        Ok(self
            .list_branches()?
            .into_iter()
            .map(|(name, tip)| BranchInfo {
                is_current: current.as_deref() == Some(name.as_str()),
                name,
                tip,
            })
            .collect())
    }
}
